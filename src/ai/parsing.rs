//! JSON parsing for model responses.
//!
//! Even with a JSON response type requested, models sometimes wrap the payload in a code fence or
//! a sentence, so we look for the outermost object before handing it to serde.

use crate::error::Res;
use crate::model::AiAnalysis;
use anyhow::{anyhow, bail};

const RAW_PREVIEW_CHARS: usize = 200;

/// Parses an `AiAnalysis` from a model response. All three fields must be present with the right
/// types; anything else is an error carrying a preview of the raw text.
pub(crate) fn parse_analysis(response: &str) -> Res<AiAnalysis> {
    let json_str = extract_object(response)?;
    serde_json::from_str(json_str)
        .map_err(|e| anyhow!("Invalid analysis JSON from AI: {e} | Raw: {}", preview(json_str)))
}

/// The text from the first `{` to the last `}`.
fn extract_object(response: &str) -> Res<&str> {
    let response = response.trim();
    match (response.find('{'), response.rfind('}')) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => bail!("No JSON found in AI response | Raw: {}", preview(response)),
    }
}

/// Truncates long responses for error messages.
fn preview(s: &str) -> String {
    match s.char_indices().nth(RAW_PREVIEW_CHARS) {
        Some((ix, _)) => format!("{}...", &s[..ix]),
        None => s.to_string(),
    }
}
