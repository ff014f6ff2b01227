//! Run command - the full pipeline.

use super::{print_edit_summary, read_transcript, write_transcript};
use crate::cli::preflight::{self, Requirement};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::RetoucheError;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run QA, context inference and editing on one transcript.
pub async fn run_pipeline(
    input: &str,
    output: Option<String>,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Requirement::Run) {
        Output::error(&format!("{}", e));
        Output::info("Run 'retouche doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.context.model = model;
    }

    let transcript = read_transcript(input)?;
    let pipeline = Pipeline::new(&settings)?;

    let spinner = Output::spinner(&format!(
        "Processing {} segments with {}...",
        transcript.messages.len(),
        settings.context.model
    ));
    let result = pipeline.process(transcript).await;
    spinner.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(RetoucheError::QaFailed(errors)) => {
            Output::error(&format!("QA failed: {}", errors));
            return Err(anyhow::anyhow!("QA failed: {}", errors));
        }
        Err(e) => return Err(e.into()),
    };

    write_transcript(&outcome.transcript, output.as_deref())?;

    if let Some(warning) = outcome
        .context_report()
        .and_then(|r| r.get("warning"))
        .and_then(|w| w.as_str())
    {
        Output::warning(warning);
    }
    print_edit_summary(&outcome.edit_report);

    if !outcome.warnings.is_empty() {
        Output::warning("QA warnings:");
        for warning in &outcome.warnings {
            Output::list_item(warning);
        }
    }

    Ok(())
}
