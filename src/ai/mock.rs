//! Mock analyst for test mode and unit tests.
//!
//! Builds a predictable analysis from the aggregates, so the output changes with the data but never
//! depends on a network call.

use crate::aggregate::{category_totals, primary_payment_method, total_spend};
use crate::ai::Analyst;
use crate::error::Res;
use crate::model::{AiAnalysis, Expense};
use anyhow::bail;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock analyst. Can be configured to fail, and counts how often it was asked.
#[derive(Clone, Default)]
pub(crate) struct MockAnalyst {
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockAnalyst {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A mock whose every analysis fails with `message`.
    #[cfg(test)]
    pub(crate) fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            calls: Arc::default(),
        }
    }

    /// How many times `analyze` has been called on this mock or its clones.
    #[cfg(test)]
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyst for MockAnalyst {
    async fn analyze(&self, expenses: &[Expense]) -> Res<AiAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            bail!("{message}");
        }

        let total = total_spend(expenses);
        let categories = category_totals(expenses);
        let summary = format!(
            "{} expenses totalling {}, paid mostly with {}.",
            expenses.len(),
            total,
            primary_payment_method(expenses)
        );
        let recommendations = categories
            .iter()
            .take(2)
            .map(|c| format!("Set a monthly limit for {} (currently {}).", c.category, c.total))
            .collect();
        let anomalies = expenses
            .iter()
            .max_by_key(|e| e.amount())
            .map(|e| {
                vec![format!(
                    "Largest single expense: {} on {} ({}).",
                    e.amount(),
                    e.date(),
                    e.category()
                )]
            })
            .unwrap_or_default();

        Ok(AiAnalysis {
            summary,
            recommendations,
            anomalies,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
