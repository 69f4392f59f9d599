//! The application state behind the dashboard.
//!
//! `AppState` owns the expense source, the analyst and the values on display. Readers take a
//! `Snapshot`, which is a cheap clone of the current values. A refresh computes every new value
//! before it swaps anything in, so a reader sees either the old values or the new ones, never a
//! mix of an old list with new aggregates.
//!
//! Only one refresh or reanalysis runs at a time. Asking for another one while it runs fails with
//! `ErrorType::Busy` and leaves the displayed state alone.

use crate::aggregate::Overview;
use crate::ai::{self, Analyst};
use crate::api::{self, ExpenseSheet};
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{AiAnalysis, Expense};
use crate::{Config, Mode, Result};
use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// The values on display at one moment.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    expenses: Arc<Vec<Expense>>,
    overview: Arc<Overview>,
    analysis: Option<Arc<AiAnalysis>>,
    error: Option<String>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn overview(&self) -> &Overview {
        &self.overview
    }

    pub fn analysis(&self) -> Option<&AiAnalysis> {
        self.analysis.as_deref()
    }

    /// The message of the last failed refresh, cleared by the next successful fetch.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// When the expense list was last replaced.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}

/// Explicit application state: the expense source, an optional analyst and the displayed values.
pub struct AppState {
    source: Mutex<ExpenseSheet>,
    analyst: Option<Box<dyn Analyst>>,
    view: RwLock<Snapshot>,
}

impl AppState {
    /// Builds the state for `mode`. With `with_analysis` false no analyst is created, so no AI
    /// credentials are needed and refreshes stop after the fetch.
    pub async fn connect(config: &Config, mode: Mode, with_analysis: bool) -> Result<Self> {
        let sheet = api::sheet(config, mode).await?;
        let analyst = if with_analysis {
            Some(ai::analyst(config, mode)?)
        } else {
            debug!("Analysis is disabled");
            None
        };
        Ok(Self::new(ExpenseSheet::new(sheet), analyst))
    }

    pub(crate) fn new(source: ExpenseSheet, analyst: Option<Box<dyn Analyst>>) -> Self {
        Self {
            source: Mutex::new(source),
            analyst,
            view: RwLock::new(Snapshot::default()),
        }
    }

    /// Whether refreshes will ask for an analysis.
    pub fn analysis_enabled(&self) -> bool {
        self.analyst.is_some()
    }

    /// A copy of the values currently on display.
    pub fn snapshot(&self) -> Snapshot {
        self.read().clone()
    }

    /// Fetches the expense list and swaps it in, then, when the list is not empty, asks for an
    /// analysis and swaps that in. Returns the number of expenses fetched.
    ///
    /// On failure the message is recorded for display, the values from before stay in place and
    /// the error is returned.
    pub async fn refresh(&self) -> Result<usize> {
        let mut source = self.begin()?;

        let expenses = match source.fetch().await {
            Ok(expenses) => Arc::new(expenses),
            Err(e) => {
                error!("Unable to load expenses: {e}");
                self.write().error = Some(e.message());
                return Err(e);
            }
        };

        let overview = Arc::new(Overview::new(&expenses));
        {
            let mut view = self.write();
            view.expenses = expenses.clone();
            view.overview = overview;
            view.error = None;
            view.refreshed_at = Some(Utc::now());
        }
        info!("Loaded {} expenses", expenses.len());

        if expenses.is_empty() {
            return Ok(0);
        }
        if let Err(e) = self.analyze(&expenses).await {
            error!("Unable to analyze expenses: {e}");
            self.write().error = Some(e.message());
            return Err(e);
        }
        Ok(expenses.len())
    }

    /// Asks for a new analysis of the expenses on display. Returns `false` without calling the
    /// analyst when the list is empty or analysis is disabled.
    ///
    /// A failure is logged and returned, but it is not recorded for display and the previous
    /// analysis stays in place.
    pub async fn reanalyze(&self) -> Result<bool> {
        let _source = self.begin()?;
        let expenses = self.read().expenses.clone();
        if expenses.is_empty() || self.analyst.is_none() {
            debug!("Nothing to analyze");
            return Ok(false);
        }
        match self.analyze(&expenses).await {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("Unable to analyze expenses: {e}");
                Err(e)
            }
        }
    }

    /// Runs the analyst, if any, and swaps in its answer.
    async fn analyze(&self, expenses: &[Expense]) -> Result<()> {
        let Some(analyst) = &self.analyst else {
            return Ok(());
        };
        debug!("Requesting an analysis from {}", analyst.name());
        let analysis = analyst
            .analyze(expenses)
            .await
            .pub_result(ErrorType::Analysis)?;
        self.write().analysis = Some(Arc::new(analysis));
        info!("Analysis updated");
        Ok(())
    }

    /// Claims the right to change the state, or fails with `Busy`.
    fn begin(&self) -> Result<MutexGuard<'_, ExpenseSheet>> {
        self.source.try_lock().map_err(|_| {
            Error::msg(
                ErrorType::Busy,
                "A refresh is already in progress, try again when it finishes",
            )
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.view.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.view.write().unwrap_or_else(PoisonError::into_inner)
    }
}
