//! Generative-AI analysis of an expense list.
//!
//! - `Analyst` trait: the one operation the dashboard needs from a model
//! - `GeminiAnalyst`: asks a Gemini model over REST, requesting a JSON answer with a fixed schema
//! - `MockAnalyst`: a canned analyst for `Mode::Test` and unit tests

mod gemini;
mod mock;
mod parsing;
mod prompt;

pub(crate) use gemini::GeminiAnalyst;
pub(crate) use mock::MockAnalyst;

use crate::error::Res;
use crate::model::{AiAnalysis, Expense};
use crate::{Config, Mode, Result};
use async_trait::async_trait;
use tracing::debug;

/// Produces an `AiAnalysis` for a list of expenses.
///
/// Analysts should be Send + Sync so that the dashboard can run them from spawned tasks.
#[async_trait]
pub(crate) trait Analyst: Send + Sync {
    /// Fails when the request cannot be made, when the model returns nothing, or when the answer
    /// does not match the analysis schema.
    async fn analyze(&self, expenses: &[Expense]) -> Res<AiAnalysis>;

    /// The model name, for logs.
    fn name(&self) -> &str;
}

/// Creates the `Analyst` for `mode`. In `Mode::Google` this needs a Gemini API key.
pub(crate) fn analyst(config: &Config, mode: Mode) -> Result<Box<dyn Analyst>> {
    match mode {
        Mode::Google => {
            let api_key = config.gemini_api_key()?;
            debug!("Using Gemini model {}", config.gemini_model());
            Ok(Box::new(GeminiAnalyst::new(config.gemini_model(), &api_key)))
        }
        Mode::Test => Ok(Box::new(MockAnalyst::new())),
    }
}
