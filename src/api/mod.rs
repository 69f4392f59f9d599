//! Access to the expense spreadsheet.
//!
//! The `Sheet` trait is the seam between the application and Google Sheets. `GoogleSheet`
//! implements it over the network; `TestSheet` implements it in memory so that the whole program
//! can run, top to bottom, without credentials (see `Mode`).

mod expenses;
mod service_account;
mod sheet;
mod sheet_test_client;

use crate::error::{ErrorType, IntoResult};
use crate::model::DataRange;
use crate::{Config, Mode, Result};
use tracing::debug;

pub(crate) use expenses::ExpenseSheet;
pub(crate) use service_account::{ServiceAccountKey, TokenProvider};
pub(crate) use sheet::GoogleSheet;
pub(crate) use sheet_test_client::TestSheet;
#[cfg(test)]
pub(crate) use sheet_test_client::TestSheetState;

/// Read-only access is all this program needs.
pub(crate) const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// Base URL of the Sheets v4 REST API.
pub(crate) const SHEETS_API: &str = "https://sheets.googleapis.com/v4";

/// The operations needed from a spreadsheet.
#[async_trait::async_trait]
pub(crate) trait Sheet: Send + Sync {
    /// Returns the title of the first sheet (tab) in the spreadsheet.
    async fn first_sheet_title(&mut self) -> Result<String>;

    /// Returns the rows of `range` as formatted cell strings. Trailing empty cells and trailing
    /// empty rows are omitted, as the Sheets API does.
    async fn get(&mut self, range: &DataRange) -> Result<Vec<Vec<String>>>;
}

/// Creates the `Sheet` implementation for `mode`.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet>> {
    match mode {
        Mode::Google => {
            let token_provider = TokenProvider::load(config.service_account_path())
                .await
                .pub_result(ErrorType::Auth)?;
            Ok(Box::new(GoogleSheet::new(config, token_provider)))
        }
        Mode::Test => {
            debug!("Using the in-memory test sheet");
            Ok(Box::new(TestSheet::default()))
        }
    }
}
