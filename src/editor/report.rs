//! Transformation report attached under `transformation_report.editor`.

use super::operation::Operation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The transformation whitelist. Documents what the editor may do; these are
/// not runtime toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPolicy {
    pub glossary_normalization: bool,
    pub language_error_correction: bool,
    pub deduplication: bool,
    pub light_punctuation: bool,
    pub timestamps_preserved: bool,
    pub speaker_labels_preserved: bool,
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self {
            glossary_normalization: true,
            language_error_correction: true,
            deduplication: true,
            light_punctuation: true,
            timestamps_preserved: true,
            speaker_labels_preserved: true,
        }
    }
}

/// Per-segment summary. Timing and speaker are copied verbatim from the segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentReport {
    pub index: usize,
    pub start_time: Value,
    pub end_time: Value,
    pub speaker: Value,
    pub changed: bool,
    pub operations: Vec<Operation>,
}

/// Run-level summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationReport {
    pub policy: EditPolicy,
    pub total_segments: usize,
    pub segments_modified: usize,
    pub segment_reports: Vec<SegmentReport>,
}

impl TransformationReport {
    pub fn new(segment_reports: Vec<SegmentReport>) -> Self {
        Self {
            policy: EditPolicy::default(),
            total_segments: segment_reports.len(),
            segments_modified: segment_reports.iter().filter(|r| r.changed).count(),
            segment_reports,
        }
    }

    /// Total number of recorded operations across all segments.
    pub fn operation_count(&self) -> usize {
        self.segment_reports.iter().map(|r| r.operations.len()).sum()
    }
}
