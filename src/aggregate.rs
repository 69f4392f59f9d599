//! Expense aggregation for the dashboard.
//!
//! Every function here is pure and total over a slice of `Expense`. Each expense contributes its
//! amount exactly once to every grouping, so category totals, payment totals, the time series and
//! the total spend all add up to the same number.

use crate::model::{
    parse_date, Amount, CategorySummary, Expense, PaymentSummary, TimeSeriesPoint,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Shown in place of the primary payment method when there are no expenses.
pub const NOT_AVAILABLE: &str = "N/A";

/// How many rows the recent-transactions table shows.
pub const RECENT_ROWS: usize = 8;

/// Sums amounts per key, keeping keys in the order they were first encountered.
fn group_totals<'a, F>(expenses: &'a [Expense], key: F) -> Vec<(&'a str, Amount)>
where
    F: Fn(&'a Expense) -> &'a str,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(&str, Amount)> = Vec::new();
    for expense in expenses {
        let k = key(expense);
        match index.get(k) {
            Some(&ix) => totals[ix].1 = totals[ix].1 + expense.amount(),
            None => {
                index.insert(k, totals.len());
                totals.push((k, expense.amount()));
            }
        }
    }
    totals
}

/// Totals per category, largest first. Equal totals keep their encounter order.
pub fn category_totals(expenses: &[Expense]) -> Vec<CategorySummary> {
    let mut categories: Vec<CategorySummary> = group_totals(expenses, Expense::category)
        .into_iter()
        .map(|(category, total)| CategorySummary {
            category: category.to_string(),
            total,
        })
        .collect();
    // sort_by is stable
    categories.sort_by(|a, b| b.total.cmp(&a.total));
    categories
}

/// Totals per payment method, in encounter order.
pub fn payment_totals(expenses: &[Expense]) -> Vec<PaymentSummary> {
    group_totals(expenses, Expense::payment_method)
        .into_iter()
        .map(|(name, value)| PaymentSummary {
            name: name.to_string(),
            value,
        })
        .collect()
}

/// Totals per distinct date string, in calendar order.
///
/// Dates that `parse_date` cannot read sort after every readable date and keep their encounter
/// order among themselves. Different strings for the same day stay separate points.
pub fn time_series(expenses: &[Expense]) -> Vec<TimeSeriesPoint> {
    let mut points: Vec<TimeSeriesPoint> = group_totals(expenses, Expense::date)
        .into_iter()
        .map(|(date, amount)| TimeSeriesPoint {
            date: date.to_string(),
            amount,
        })
        .collect();
    points.sort_by_cached_key(|p| {
        let parsed = parse_date(&p.date);
        (parsed.is_none(), parsed)
    });
    points
}

/// The payment method with the largest total. On a tie the first one encountered wins.
pub fn top_payment_method(expenses: &[Expense]) -> Option<PaymentSummary> {
    payment_totals(expenses)
        .into_iter()
        .fold(None, |best: Option<PaymentSummary>, p| match best {
            Some(b) if b.value >= p.value => Some(b),
            _ => Some(p),
        })
}

/// The name of the top payment method, or `NOT_AVAILABLE` for an empty list.
pub fn primary_payment_method(expenses: &[Expense]) -> String {
    top_payment_method(expenses)
        .map(|p| p.name)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn total_spend(expenses: &[Expense]) -> Amount {
    expenses.iter().map(Expense::amount).sum()
}

/// Total spend divided by the number of distinct dates. With no dates the divisor is 1, so an
/// empty list averages to zero.
pub fn daily_average(expenses: &[Expense]) -> Amount {
    per_day(total_spend(expenses), &time_series(expenses))
}

fn per_day(total: Amount, history: &[TimeSeriesPoint]) -> Amount {
    let days = Decimal::from(history.len().max(1));
    Amount::new(total.value() / days)
}

/// The last `RECENT_ROWS` expenses, newest row first.
pub fn recent(expenses: &[Expense]) -> Vec<Expense> {
    expenses.iter().rev().take(RECENT_ROWS).cloned().collect()
}

/// Everything the dashboard shows, computed from one expense list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub total_spending: Amount,
    pub primary_payment: String,
    pub daily_average: Amount,
    pub category_count: usize,
    pub categories: Vec<CategorySummary>,
    pub payments: Vec<PaymentSummary>,
    pub history: Vec<TimeSeriesPoint>,
    pub recent: Vec<Expense>,
}

impl Overview {
    pub fn new(expenses: &[Expense]) -> Self {
        let categories = category_totals(expenses);
        let history = time_series(expenses);
        let total_spending = total_spend(expenses);
        Self {
            total_spending,
            primary_payment: primary_payment_method(expenses),
            daily_average: per_day(total_spending, &history),
            category_count: categories.len(),
            categories,
            payments: payment_totals(expenses),
            history,
            recent: recent(expenses),
        }
    }
}
