//! These structs provide the CLI interface for the sheet-insights CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// sheet-insights: a terminal dashboard for expenses kept in a Google Sheet.
///
/// The sheet's first tab holds one expense per row below a header row: the date in column A,
/// the amount in Rupiah in column B, the category in column C and the payment method in
/// column D. This program reads those rows, shows totals per category, payment method and day,
/// and asks a Gemini model for a summary, saving tips and anything unusual.
///
/// Access to the sheet uses a Google Cloud service account. Share the sheet with the service
/// account's email address (read access is enough) and download its JSON key. The Gemini API key
/// is read from GEMINI_API_KEY (or API_KEY).
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and initialize the configuration.
    ///
    /// This is the first command you should run. You need two things beforehand:
    ///
    /// - The URL of your expense Google Sheet, passed as --sheet-url.
    ///
    /// - A service account key file, passed as --service-account. It is copied into the
    ///   secrets directory of the home directory and made readable only by you.
    Init(InitArgs),
    /// Exchange the service account key for an access token to check that it works.
    Auth,
    /// Load the sheet, ask for an analysis and print the dashboard.
    Dashboard(DashboardArgs),
    /// Load the sheet and print only the AI analysis.
    Analyze(AnalyzeArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration and secrets are held. Defaults to ~/sheet-insights
    #[arg(long, env = "SHEET_INSIGHTS_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `sheet-insights init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL to your expense Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: String,

    /// The path to your downloaded service account key. This file will be copied to the default
    /// secrets location in the home directory.
    #[arg(long)]
    service_account: PathBuf,
}

impl InitArgs {
    pub fn new(sheet_url: impl Into<String>, service_account: impl Into<PathBuf>) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            service_account: service_account.into(),
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn service_account(&self) -> &Path {
        &self.service_account
    }
}

/// (Not shown): Args for the `sheet-insights dashboard` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct DashboardArgs {
    /// Skip the AI analysis. No Gemini API key is needed.
    #[arg(long)]
    no_analysis: bool,

    /// Print the dashboard data as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Keep running after the first load. Type `r` + Enter to refresh, `a` + Enter to ask for new
    /// AI advice and `q` + Enter (or Ctrl-C) to quit. With a number of seconds, also refresh on
    /// that interval.
    #[arg(long, value_name = "SECS", num_args = 0..=1, default_missing_value = "0")]
    watch: Option<u64>,
}

impl DashboardArgs {
    pub fn new(no_analysis: bool, json: bool, watch: Option<u64>) -> Self {
        Self {
            no_analysis,
            json,
            watch,
        }
    }

    pub fn no_analysis(&self) -> bool {
        self.no_analysis
    }

    pub fn json(&self) -> bool {
        self.json
    }

    /// `Some` when the dashboard keeps running; `Some(0)` means no periodic refresh.
    pub fn watch(&self) -> Option<u64> {
        self.watch
    }
}

/// (Not shown): Args for the `sheet-insights analyze` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Print the analysis as JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl AnalyzeArgs {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn json(&self) -> bool {
        self.json
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("sheet-insights"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or SHEET_INSIGHTS_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("sheet-insights")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
