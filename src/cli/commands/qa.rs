//! QA command - timing checks only.

use super::read_transcript;
use crate::cli::Output;
use crate::config::Settings;
use crate::qa::{check_transcript, QaReport};
use anyhow::Result;

/// Validate a transcript and print the report.
pub fn run_qa(input: &str, json: bool, settings: &Settings) -> Result<()> {
    let transcript = read_transcript(input)?;
    let report = check_transcript(&transcript, &settings.qa.thresholds());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.ok {
        return Err(anyhow::anyhow!("QA failed: {}", report.errors.join("; ")));
    }
    Ok(())
}

fn print_report(report: &QaReport) {
    Output::header("Timing checks");
    Output::kv("Segments", &report.total_segments.to_string());
    Output::kv("Valid", &report.valid_segments.to_string());
    Output::kv("Invalid", &report.invalid_segments_count.to_string());
    Output::kv("Overlaps", &report.overlaps.len().to_string());
    Output::kv("Large gaps", &report.omission_suspects.len().to_string());
    Output::kv("Long segments", &report.long_segments.len().to_string());

    for invalid in &report.invalid_segments {
        Output::list_item(&format!("#{}: {}", invalid.index, invalid.reason));
    }
    for gap in &report.omission_suspects {
        Output::list_item(&format!(
            "gap of {}s between #{} and #{}",
            gap.gap_s, gap.prev_index, gap.next_index
        ));
    }
    for overlap in &report.overlaps {
        Output::list_item(&format!(
            "overlap of {}s between #{} and #{}",
            overlap.overlap_s, overlap.prev_index, overlap.next_index
        ));
    }
    for long in &report.long_segments {
        Output::list_item(&format!("#{} lasts {}s", long.index, long.duration_s));
    }

    for warning in &report.warnings {
        Output::warning(warning);
    }
    for error in &report.errors {
        Output::error(error);
    }
    if report.ok {
        Output::success("QA passed.");
    }
}
