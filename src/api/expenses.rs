//! Reads the expense list from whichever `Sheet` it is given.

use crate::api::Sheet;
use crate::model::{map_rows, DataRange, Expense};
use crate::Result;
use tracing::{debug, trace};

/// Fetches expenses from the first sheet of a spreadsheet.
pub(crate) struct ExpenseSheet {
    sheet: Box<dyn Sheet>,
}

impl ExpenseSheet {
    /// Create a new `ExpenseSheet` that will use a dynamically-dispatched `sheet` to get its data.
    pub(crate) fn new(sheet: Box<dyn Sheet>) -> Self {
        Self { sheet }
    }

    /// Discovers the first sheet's title, reads columns A through D below the header row and maps
    /// every row to an `Expense`. A sheet with only a header row yields an empty list.
    pub(crate) async fn fetch(&mut self) -> Result<Vec<Expense>> {
        let title = self.sheet.first_sheet_title().await?;
        let range = DataRange::new(title);
        trace!("Reading {range}");
        let rows = self.sheet.get(&range).await?;
        let expenses = map_rows(rows);
        debug!("Read {} expenses from {range}", expenses.len());
        Ok(expenses)
    }
}
