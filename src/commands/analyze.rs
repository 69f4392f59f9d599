use crate::args::AnalyzeArgs;
use crate::commands::Out;
use crate::model::AiAnalysis;
use crate::render;
use crate::state::AppState;
use crate::{Config, Mode, Result};
use tracing::error;

/// Handles the `sheet-insights analyze` command: loads the sheet, asks for an analysis and prints
/// the full AI panel, including every recommendation and the anomalies.
///
/// An empty sheet is not an error. Nothing is sent to the AI and the result has no structure.
pub async fn analyze(config: Config, mode: Mode, args: AnalyzeArgs) -> Result<Out<AiAnalysis>> {
    let state = AppState::connect(&config, mode, true).await?;
    let count = state.refresh().await?;
    let snapshot = state.snapshot();

    let Some(analysis) = snapshot.analysis() else {
        println!("{}", render::analysis_panel(None, false));
        return Ok("The sheet has no expenses to analyze".into());
    };

    if args.json() {
        match serde_json::to_string_pretty(analysis) {
            Ok(s) => println!("{s}"),
            Err(e) => error!("Unable to serialize the analysis: {e}"),
        }
    } else {
        println!("{}", render::analysis_panel(Some(analysis), false));
    }
    Ok(Out::new(format!("Analyzed {count} expenses"), analysis.clone()))
}
