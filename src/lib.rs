//! sheet-insights reads expense rows from a Google Sheet, aggregates them and asks Gemini for an
//! analysis of the spending.

mod ai;
mod api;
pub mod aggregate;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod render;
pub mod state;
mod utils;


pub use config::{Config, DEFAULT_GEMINI_MODEL};
pub use error::{Error, ErrorType, Result};

/// Name of the environment variable that switches the program to `Mode::Test`.
pub const TEST_MODE_VAR: &str = "SHEET_INSIGHTS_IN_TEST_MODE";

/// Where data comes from and where analyses are requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Use Google Sheets and Gemini.
    #[default]
    Google,
    /// Use the in-memory test sheet and a canned analyst, so that the whole program can run
    /// without credentials.
    Test,
}

impl Mode {
    /// `Mode::Test` when `SHEET_INSIGHTS_IN_TEST_MODE` is set and non-empty, otherwise
    /// `Mode::Google`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_VAR) {
            Ok(v) if !v.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}
