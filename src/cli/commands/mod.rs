//! CLI command implementations.

mod config;
mod doctor;
mod edit;
mod qa;
mod run;

pub use config::run_config;
pub use doctor::run_doctor;
pub use edit::run_edit;
pub use qa::run_qa;
pub use run::run_pipeline;

use crate::cli::{preview, Output};
use crate::editor::TransformationReport;
use crate::transcript::{load_transcript, save_transcript, Transcript};
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// True when the path names standard input/output.
fn is_std_stream(path: Option<&str>) -> bool {
    matches!(path, None | Some("-"))
}

/// Read a transcript from a file, or from stdin when the path is "-".
pub(crate) fn read_transcript(input: &str) -> Result<Transcript> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read transcript from stdin")?;
        return Ok(Transcript::from_json_str(&buf)?);
    }
    load_transcript(Path::new(input)).with_context(|| format!("Failed to read transcript {}", input))
}

/// Write a transcript to a file, or to stdout when the path is "-" or absent.
pub(crate) fn write_transcript(transcript: &Transcript, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) if !is_std_stream(output) => {
            save_transcript(transcript, Path::new(path))
                .with_context(|| format!("Failed to write {}", path))?;
            Output::success(&format!("Wrote {}", path));
        }
        _ => println!("{}", transcript.to_json_pretty()?),
    }
    Ok(())
}

/// Print what the editor changed, one line per modified segment.
pub(crate) fn print_edit_summary(report: &TransformationReport) {
    Output::info(&format!(
        "{} of {} segments modified ({} operations)",
        report.segments_modified,
        report.total_segments,
        report.operation_count()
    ));
    for segment in report.segment_reports.iter().filter(|r| r.changed) {
        if let (Some(first), Some(last)) = (segment.operations.first(), segment.operations.last()) {
            Output::list_item(&format!(
                "#{}: {} -> {}",
                segment.index,
                preview(&first.before, 60),
                preview(&last.after, 60)
            ));
        }
    }
}
