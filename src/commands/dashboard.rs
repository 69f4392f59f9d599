//! The `dashboard` command.
//!
//! Without `--watch` it loads the sheet once, prints the dashboard and exits, failing when the
//! load failed. With `--watch` it keeps the state alive and reads one command per line from stdin:
//!
//! - `r` or an empty line: refresh the sheet and the analysis
//! - `a`: ask for new AI advice on the expenses already loaded
//! - `q`, end of input or Ctrl-C: stop
//!
//! Each refresh runs in its own task and prints the dashboard again when it finishes. A command
//! that arrives while another refresh is running is refused with a warning.

use crate::aggregate::Overview;
use crate::args::DashboardArgs;
use crate::commands::Out;
use crate::model::AiAnalysis;
use crate::render;
use crate::state::{AppState, Snapshot};
use crate::{Config, ErrorType, Mode, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, error, info, warn};

/// The dashboard as data, printed by `--json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardData {
    pub overview: Overview,
    pub analysis: Option<AiAnalysis>,
    pub error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl From<&Snapshot> for DashboardData {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            overview: snapshot.overview().clone(),
            analysis: snapshot.analysis().cloned(),
            error: snapshot.error().map(str::to_string),
            refreshed_at: snapshot.refreshed_at(),
        }
    }
}

/// Handles the `sheet-insights dashboard` command.
pub async fn dashboard(
    config: Config,
    mode: Mode,
    args: DashboardArgs,
) -> Result<Out<DashboardData>> {
    let state = Arc::new(AppState::connect(&config, mode, !args.no_analysis()).await?);
    let loaded = state.refresh().await;
    show(&state.snapshot(), args.json());

    let Some(seconds) = args.watch() else {
        let count = loaded?;
        return Ok(Out::new(
            format!("Showed the dashboard for {count} expenses"),
            DashboardData::from(&state.snapshot()),
        ));
    };

    watch(&state, seconds, args.json()).await;
    Ok(Out::new("Stopped watching", DashboardData::from(&state.snapshot())))
}

/// Prints the snapshot to stdout, as text or as JSON.
fn show(snapshot: &Snapshot, json: bool) {
    if !json {
        println!("{}\n", render::dashboard(snapshot));
        return;
    }
    match serde_json::to_string_pretty(&DashboardData::from(snapshot)) {
        Ok(s) => println!("{s}"),
        Err(e) => error!("Unable to serialize the dashboard: {e}"),
    }
}

/// Runs until the user quits. With `seconds` above zero the sheet is also refreshed on that
/// interval.
async fn watch(state: &Arc<AppState>, seconds: u64, json: bool) {
    info!("Watching. Enter r to refresh, a for new AI advice, q to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut ticker = (seconds > 0).then(|| {
        let period = Duration::from_secs(seconds);
        interval_at(Instant::now() + period, period)
    });

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Unable to read from stdin: {e}");
                        None
                    }
                };
                let Some(line) = line else {
                    stdin_open = false;
                    if ticker.is_none() {
                        break;
                    }
                    debug!("Input closed, refreshing on the interval only");
                    continue;
                };
                match line.trim() {
                    "" | "r" => spawn_refresh(state, json),
                    "a" => spawn_reanalyze(state, json),
                    "q" => break,
                    other => warn!("Unknown command '{other}', use r, a or q"),
                }
            }
            _ = tick(&mut ticker) => {
                debug!("Refreshing on the interval");
                spawn_refresh(state, json);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending::<()>().await,
    }
}

fn spawn_refresh(state: &Arc<AppState>, json: bool) {
    let state = Arc::clone(state);
    tokio::spawn(async move {
        if let Err(e) = state.refresh().await {
            if e.error_type() == ErrorType::Busy {
                warn!("{}", e.message());
                return;
            }
            // The message is part of the snapshot and shows in the error banner
        }
        show(&state.snapshot(), json);
    });
}

fn spawn_reanalyze(state: &Arc<AppState>, json: bool) {
    if !state.analysis_enabled() {
        warn!("AI analysis is turned off by --no-analysis");
        return;
    }
    let state = Arc::clone(state);
    tokio::spawn(async move {
        match state.reanalyze().await {
            Ok(true) => show(&state.snapshot(), json),
            Ok(false) => info!("There are no expenses to analyze"),
            Err(e) if e.error_type() == ErrorType::Busy => warn!("{}", e.message()),
            // Already logged, the previous advice stays on screen
            Err(_) => {}
        }
    });
}
