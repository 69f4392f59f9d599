use crate::model::Amount;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Category used when column C of a row is blank.
pub const UNCATEGORIZED: &str = "Tanpa Kategori";

/// Payment method used when column D of a row is blank.
pub const CASH: &str = "Tunai";

/// Date layouts accepted when ordering the time series. Slash dates are month-first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One row of the expense sheet: `Tanggal | Jumlah | Kategori | Pembayaran`.
///
/// Field names serialize in camelCase because the AI prompt describes the data that way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    id: String,
    date: String,
    amount: Amount,
    category: String,
    payment_method: String,
}

impl Expense {
    pub fn new(
        id: impl Into<String>,
        date: impl Into<String>,
        amount: Amount,
        category: impl Into<String>,
        payment_method: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            amount,
            category: category.into(),
            payment_method: payment_method.into(),
        }
    }

    /// Maps one data row. `index` is the 0-based position of the row among the data rows, and the
    /// id becomes its 1-based position. Ids are positional, so they change whenever rows are
    /// inserted or removed in the sheet.
    ///
    /// Blank or missing cells fall back to an empty date, `UNCATEGORIZED`, and `CASH`. Cells past
    /// column D are ignored.
    pub fn from_row<S: AsRef<str>>(index: usize, row: &[S]) -> Self {
        let cell = |ix: usize| {
            row.get(ix)
                .map(|s| s.as_ref())
                .filter(|s| !s.is_empty())
        };
        Self {
            id: (index + 1).to_string(),
            date: cell(0).unwrap_or_default().to_string(),
            amount: cell(1).map(Amount::from_cell).unwrap_or_default(),
            category: cell(2).unwrap_or(UNCATEGORIZED).to_string(),
            payment_method: cell(3).unwrap_or(CASH).to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }
}

/// Maps all data rows, in sheet order. The header row must already be excluded.
pub fn map_rows<I, R, S>(rows: I) -> Vec<Expense>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    rows.into_iter()
        .enumerate()
        .map(|(ix, row)| {
            let cells: Vec<S> = row.into_iter().collect();
            Expense::from_row(ix, &cells)
        })
        .collect()
}

/// Parses the calendar date written in a date cell, or `None` when no known layout matches.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_from_row_defaults() {
        let expense = Expense::from_row(0, &["2024-01-05", "Rp50.000", "", ""]);
        assert_eq!(expense.id(), "1");
        assert_eq!(expense.date(), "2024-01-05");
        assert_eq!(expense.amount().value(), Decimal::from(50000));
        assert_eq!(expense.category(), UNCATEGORIZED);
        assert_eq!(expense.payment_method(), CASH);
    }

    #[test]
    fn test_from_row_short_row() {
        let expense = Expense::from_row(4, &["2024-02-01"]);
        assert_eq!(expense.id(), "5");
        assert!(expense.amount().is_zero());
        assert_eq!(expense.category(), UNCATEGORIZED);
        assert_eq!(expense.payment_method(), CASH);

        let empty: [&str; 0] = [];
        let expense = Expense::from_row(0, &empty);
        assert_eq!(expense.date(), "");
    }

    #[test]
    fn test_from_row_full() {
        let row = ["3/1/2024", "Rp 12.500,50", "Makan", "QRIS", "extra"];
        let expense = Expense::from_row(2, &row);
        assert_eq!(expense.id(), "3");
        assert_eq!(expense.amount().value(), Decimal::from_str("12500.5").unwrap());
        assert_eq!(expense.category(), "Makan");
        assert_eq!(expense.payment_method(), "QRIS");
    }

    #[test]
    fn test_map_rows_assigns_positions() {
        let rows = vec![
            vec!["2024-01-01", "10", "A", "Cash"],
            vec!["2024-01-02", "20", "B", "Card"],
        ];
        let expenses = map_rows(&rows);
        let ids: Vec<&str> = expenses.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_map_rows_total_matches_normalized_column_b() {
        let rows = vec![
            vec!["2024-01-01", "Rp 1.000", "A", "Cash"],
            vec!["2024-01-02", "abc", "B", "Card"],
            vec!["2024-01-02", "2.500,25", "B", "Card"],
            vec!["2024-01-03"],
        ];
        let expected: Amount = rows
            .iter()
            .map(|r| r.get(1).map(|c| Amount::from_cell(c)).unwrap_or_default())
            .sum();
        let total: Amount = map_rows(&rows).iter().map(|e| e.amount()).sum();
        assert_eq!(total, expected);
        assert_eq!(total.value(), Decimal::from_str("3500.25").unwrap());
    }

    #[test]
    fn test_serialize_camel_case() {
        let expense = Expense::new("1", "2024-01-05", Amount::from_cell("100"), "Food", "Cash");
        let json = serde_json::to_value(&expense).unwrap();
        assert_eq!(json["paymentMethod"], "Cash");
        assert_eq!(json["amount"], 100.0);
    }

    #[test]
    fn test_parse_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_date("2024-01-05"), Some(expected));
        assert_eq!(parse_date("2024/01/05"), Some(expected));
        assert_eq!(parse_date("1/5/2024"), Some(expected));
        assert_eq!(parse_date("5 January 2024"), Some(expected));
        assert_eq!(parse_date("January 5, 2024"), Some(expected));
        assert_eq!(parse_date("2024-01-05 13:45:00"), Some(expected));
        assert_eq!(parse_date(" 2024-01-05 "), Some(expected));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("kemarin"), None);
        assert_eq!(parse_date("2024-13-40"), None);
    }
}
