//! Edit command - editor only, on an existing context.

use super::{print_edit_summary, read_transcript, write_transcript};
use crate::cli::Output;
use crate::config::Settings;
use crate::context::ContextInferred;
use crate::editor::edit_transcript;
use crate::transcript::Transcript;
use anyhow::Result;

/// Apply the rule-based editor using the transcript's `context_inferred`.
pub fn run_edit(input: &str, output: Option<String>, settings: &Settings) -> Result<()> {
    let transcript = read_transcript(input)?;

    if !has_usable_context(&transcript) {
        Output::warning(
            "No usable glossary or language errors in context_inferred; only deduplication and punctuation will apply.",
        );
    }

    let outcome = edit_transcript(&transcript, &settings.editor.editor_config());
    write_transcript(&outcome.transcript, output.as_deref())?;
    print_edit_summary(&outcome.report);

    Ok(())
}

/// Whether `context_inferred` carries any glossary entry or language error.
fn has_usable_context(transcript: &Transcript) -> bool {
    !ContextInferred::from_value(transcript.get("context_inferred")).is_empty()
}
