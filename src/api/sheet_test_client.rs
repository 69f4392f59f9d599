//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets.

use crate::api::Sheet;
use crate::error::{Error, ErrorType, IntoResult, Res};
use crate::model::DataRange;
use crate::Result;
use anyhow::Context;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// The data behind a `TestSheet`. Tests hold on to a handle of it so that they can change the
/// sheet, or make it fail, after it has been handed to the code under test.
#[derive(Debug, Clone, Default)]
pub(crate) struct TestSheetState {
    /// Sheet titles and their rows, header row included, in tab order.
    pub(crate) sheets: Vec<(String, Vec<Vec<String>>)>,
    /// When set, every call fails with this message.
    pub(crate) error: Option<String>,
    /// When set, every call waits this long before answering.
    pub(crate) delay: Option<Duration>,
}

/// An implementation of the `Sheet` trait that does not use Google sheets. By default it is
/// seeded with a month of sample expenses on a sheet named `Pengeluaran`.
#[derive(Debug, Clone)]
pub(crate) struct TestSheet {
    state: Arc<Mutex<TestSheetState>>,
}

impl TestSheet {
    pub(crate) fn new(state: TestSheetState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// A single sheet named `title` holding `csv_data`, which includes its header row.
    #[cfg(test)]
    pub(crate) fn from_csv(title: &str, csv_data: &str) -> Res<Self> {
        let rows = load_csv(csv_data)?;
        Ok(Self::new(TestSheetState {
            sheets: vec![(title.to_string(), rows)],
            ..TestSheetState::default()
        }))
    }

    /// A handle to the shared state. Changes made through it are seen by every clone.
    #[cfg(test)]
    pub(crate) fn handle(&self) -> Arc<Mutex<TestSheetState>> {
        self.state.clone()
    }

    fn lock(&self) -> MutexGuard<'_, TestSheetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies the configured delay, then the configured failure.
    async fn before_call(&self) -> Result<()> {
        let (delay, error) = {
            let state = self.lock();
            (state.delay, state.error.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match error {
            Some(message) => Err(Error::msg(ErrorType::SheetAccess, message)),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn first_sheet_title(&mut self) -> Result<String> {
        self.before_call().await?;
        Ok(self
            .lock()
            .sheets
            .first()
            .map(|(title, _)| title.clone())
            .unwrap_or_else(|| "Sheet1".to_string()))
    }

    async fn get(&mut self, range: &DataRange) -> Result<Vec<Vec<String>>> {
        self.before_call().await?;
        let state = self.lock();
        let (_, rows) = state
            .sheets
            .iter()
            .find(|(title, _)| title == range.sheet())
            .with_context(|| format!("Unable to parse range: {range}"))
            .pub_result(ErrorType::SheetAccess)?;
        Ok(slice_range(rows, range))
    }
}

impl Default for TestSheet {
    /// Loads seed data from this module.
    fn default() -> Self {
        let rows = load_csv(EXPENSE_DATA).unwrap_or_default();
        Self::new(TestSheetState {
            sheets: vec![(SEED_SHEET_TITLE.to_string(), rows)],
            ..TestSheetState::default()
        })
    }
}

/// Returns what the Sheets API returns for `range`: rows from `first_row` on, cut to four
/// columns, with trailing empty cells and trailing empty rows removed.
fn slice_range(rows: &[Vec<String>], range: &DataRange) -> Vec<Vec<String>> {
    let mut values: Vec<Vec<String>> = rows
        .iter()
        .skip(range.first_row().saturating_sub(1))
        .map(|row| {
            let mut cells: Vec<String> = row.iter().take(4).cloned().collect();
            while cells.last().is_some_and(|c| c.is_empty()) {
                cells.pop();
            }
            cells
        })
        .collect();
    while values.last().is_some_and(|r| r.is_empty()) {
        values.pop();
    }
    values
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Res<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.context("Unable to read the seed CSV data")?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

const SEED_SHEET_TITLE: &str = "Pengeluaran";

/// Seed expense data.
const EXPENSE_DATA: &str = r##"Tanggal,Jumlah,Kategori,Pembayaran
2025-10-01,"Rp 25.000",Makanan,QRIS
2025-10-01,"Rp 150.000",Transportasi,Kartu Debit
2025-10-02,"Rp 18.500",Makanan,QRIS
2025-10-03,"Rp 1.200.000",Tagihan,Transfer Bank
2025-10-03,"Rp 12.000",Kopi,QRIS
2025-10-04,"Rp 320.000",Belanja,Kartu Kredit
2025-10-05,"Rp 45.000",Makanan,Tunai
2025-10-06,"Rp 9.000",Kopi,QRIS
2025-10-07,"Rp 85.000",Transportasi,Kartu Debit
2025-10-08,"Rp 450.000",Tagihan,Transfer Bank
2025-10-09,"Rp 32.000",Makanan,QRIS
2025-10-10,"Rp 15.000",Kopi,QRIS
"##;
