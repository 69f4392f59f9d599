//! Derived views over an expense list. None of these are persisted; they are recomputed from the
//! current list whenever it changes.

use crate::model::Amount;
use serde::{Deserialize, Serialize};

/// Total spend for one category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Amount,
}

/// Total spend for one payment method label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub name: String,
    pub value: Amount,
}

/// Total spend for one distinct date string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: String,
    pub amount: Amount,
}

/// The structured answer requested from the AI backend. All three fields are required; a
/// response that lacks one of them is rejected rather than partially accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub summary: String,
    pub recommendations: Vec<String>,
    pub anomalies: Vec<String>,
}
