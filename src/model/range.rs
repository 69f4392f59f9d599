use std::fmt;

/// The columns that hold expense data: date, amount, category, payment method.
pub const FIRST_COLUMN: char = 'A';
pub const LAST_COLUMN: char = 'D';

/// Row 1 holds the headers.
pub const FIRST_DATA_ROW: usize = 2;

/// An open-ended A1 range over the expense columns of one sheet, e.g. `'Pengeluaran'!A2:D`.
/// The end of the range has no row number, so it reaches the last populated row.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DataRange {
    sheet: String,
    first_row: usize,
}

impl DataRange {
    /// The data range of the sheet titled `sheet`, starting below the header row.
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            first_row: FIRST_DATA_ROW,
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn first_row(&self) -> usize {
        self.first_row
    }
}

impl fmt::Display for DataRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Sheet titles are always quoted so that spaces and punctuation are safe
        let escaped = self.sheet.replace('\'', "''");
        write!(
            f,
            "'{escaped}'!{FIRST_COLUMN}{}:{LAST_COLUMN}",
            self.first_row
        )
    }
}
