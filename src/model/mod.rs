//! Types that represent the core data model, such as `Expense` and `Amount`.
mod amount;
mod expense;
mod range;
mod summary;

pub use amount::{Amount, AmountError};
pub use expense::{map_rows, parse_date, Expense, CASH, UNCATEGORIZED};
pub use range::{DataRange, FIRST_COLUMN, FIRST_DATA_ROW, LAST_COLUMN};
pub use summary::{AiAnalysis, CategorySummary, PaymentSummary, TimeSeriesPoint};
