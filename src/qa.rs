//! Timing validator.
//!
//! Checks segment shape and timeline coherence before any editing happens.
//! Invalid segments are reported, never removed.

use crate::transcript::{Segment, Transcript};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

/// Thresholds for the timeline checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QaThresholds {
    /// Silence between consecutive segments reported as a possible omission.
    pub gap_threshold_s: f64,
    /// Segment duration reported as unusually long.
    pub long_segment_threshold_s: f64,
    /// Sort valid segments by (start, end) before comparing neighbours.
    pub sort_for_analysis: bool,
}

impl Default for QaThresholds {
    fn default() -> Self {
        Self {
            gap_threshold_s: 2.0,
            long_segment_threshold_s: 25.0,
            sort_for_analysis: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidSegment {
    pub index: usize,
    pub reason: String,
}

/// Large silence between two consecutive valid segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub prev_index: usize,
    pub next_index: usize,
    pub prev_end: f64,
    pub next_start: f64,
    pub gap_s: f64,
}

/// The next segment starts before the previous one ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    pub prev_index: usize,
    pub next_index: usize,
    pub prev_end: f64,
    pub next_start: f64,
    pub overlap_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongSegment {
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub duration_s: f64,
}

/// Thresholds as echoed in the report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportedThresholds {
    pub gap_threshold_s: f64,
    pub long_segment_threshold_s: f64,
}

/// Result of [`check_transcript`], stored in the transcript as `qa_report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaReport {
    pub ok: bool,
    pub total_segments: usize,
    pub valid_segments: usize,
    pub invalid_segments_count: usize,
    pub invalid_segments: Vec<InvalidSegment>,
    pub omission_suspects: Vec<Gap>,
    pub overlaps: Vec<Overlap>,
    pub long_segments: Vec<LongSegment>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub thresholds: ReportedThresholds,
    pub sorted_for_analysis: bool,
}

impl QaReport {
    fn empty(thresholds: &QaThresholds) -> Self {
        Self {
            ok: true,
            total_segments: 0,
            valid_segments: 0,
            invalid_segments_count: 0,
            invalid_segments: Vec::new(),
            omission_suspects: Vec::new(),
            overlaps: Vec::new(),
            long_segments: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            thresholds: ReportedThresholds {
                gap_threshold_s: thresholds.gap_threshold_s,
                long_segment_threshold_s: thresholds.long_segment_threshold_s,
            },
            sorted_for_analysis: thresholds.sort_for_analysis,
        }
    }

    /// Serialize for storage under `qa_report`.
    pub fn to_value(&self) -> crate::error::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A segment that passed every shape check.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TimedSegment {
    index: usize,
    start: f64,
    end: f64,
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}

/// First failing reason for a segment, or its timing when valid.
fn validate_segment(index: usize, segment: &Segment) -> Result<TimedSegment, &'static str> {
    if !segment.is_object() {
        return Err("not an object");
    }
    let (Some(start), Some(end)) = (segment.start_time(), segment.end_time()) else {
        return Err("missing/invalid timestamps");
    };
    if is_blank(segment.speaker()) {
        return Err("missing/invalid speaker");
    }
    if is_blank(segment.content()) {
        return Err("missing/invalid content");
    }
    if start < 0.0 || end <= start {
        return Err("invalid timestamps");
    }
    Ok(TimedSegment { index, start, end })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Validate segment shape and timeline coherence.
///
/// `ok` is false only when the transcript has no segments at all; everything
/// else is surfaced as warnings.
#[instrument(skip_all, fields(segments = transcript.messages.len()))]
pub fn check_transcript(transcript: &Transcript, thresholds: &QaThresholds) -> QaReport {
    let mut report = QaReport::empty(thresholds);

    if transcript.messages.is_empty() {
        report.errors.push("messages missing/empty".to_string());
        report.ok = false;
        return report;
    }

    let mut valid = Vec::with_capacity(transcript.messages.len());
    for (index, segment) in transcript.messages.iter().enumerate() {
        match validate_segment(index, segment) {
            Ok(timed) => valid.push(timed),
            Err(reason) => {
                debug!("Segment {} is invalid: {}", index, reason);
                report.invalid_segments.push(InvalidSegment {
                    index,
                    reason: reason.to_string(),
                });
            }
        }
    }

    let mut analyzed = valid.clone();
    if thresholds.sort_for_analysis {
        analyzed.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));
    }
    let reordered = analyzed != valid;

    for pair in analyzed.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next.start < prev.end {
            report.overlaps.push(Overlap {
                prev_index: prev.index,
                next_index: next.index,
                prev_end: prev.end,
                next_start: next.start,
                overlap_s: round3(prev.end - next.start),
            });
        } else {
            let gap = next.start - prev.end;
            if gap >= thresholds.gap_threshold_s {
                report.omission_suspects.push(Gap {
                    prev_index: prev.index,
                    next_index: next.index,
                    prev_end: prev.end,
                    next_start: next.start,
                    gap_s: round3(gap),
                });
            }
        }
    }

    report.long_segments = valid
        .iter()
        .filter(|s| s.end - s.start >= thresholds.long_segment_threshold_s)
        .map(|s| LongSegment {
            index: s.index,
            start_time: s.start,
            end_time: s.end,
            duration_s: round3(s.end - s.start),
        })
        .collect();

    if !report.invalid_segments.is_empty() {
        report.warnings.push(format!(
            "{} invalid segments detected (not removed)",
            report.invalid_segments.len()
        ));
    }
    if reordered {
        report
            .warnings
            .push("segments were out of chronological order; sorted for analysis".to_string());
    }
    if !report.overlaps.is_empty() {
        report
            .warnings
            .push(format!("{} overlaps detected", report.overlaps.len()));
    }
    if !report.omission_suspects.is_empty() {
        report.warnings.push(format!(
            "{} large gaps detected (>= {:?}s)",
            report.omission_suspects.len(),
            thresholds.gap_threshold_s
        ));
    }

    report.total_segments = transcript.messages.len();
    report.valid_segments = valid.len();
    report.invalid_segments_count = report.invalid_segments.len();
    report.ok = report.errors.is_empty();

    info!(
        "QA: {}/{} valid segments, {} overlaps, {} gaps, {} long segments",
        report.valid_segments,
        report.total_segments,
        report.overlaps.len(),
        report.omission_suspects.len(),
        report.long_segments.len()
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transcript(messages: Value) -> Transcript {
        serde_json::from_value(json!({ "messages": messages })).unwrap()
    }

    #[test]
    fn test_empty_messages_fail() {
        let report = check_transcript(&transcript(json!([])), &QaThresholds::default());
        assert!(!report.ok);
        assert_eq!(report.errors, vec!["messages missing/empty"]);
        assert_eq!(report.total_segments, 0);

        let missing: Transcript = serde_json::from_value(json!({"call_id": "x"})).unwrap();
        assert!(!check_transcript(&missing, &QaThresholds::default()).ok);
    }

    #[test]
    fn test_clean_transcript() {
        let report = check_transcript(
            &transcript(json!([
                {"start_time": 0.0, "end_time": 2.0, "speaker": "A", "content": "bonjour"},
                {"start_time": 2.5, "end_time": 4.0, "speaker": "B", "content": "salut"}
            ])),
            &QaThresholds::default(),
        );

        assert!(report.ok);
        assert_eq!(report.valid_segments, 2);
        assert!(report.warnings.is_empty());
        assert!(report.overlaps.is_empty());
        assert!(report.omission_suspects.is_empty());
    }

    #[test]
    fn test_invalid_reasons_first_wins() {
        let report = check_transcript(
            &transcript(json!([
                "text",
                {"start_time": "abc", "end_time": 1.0, "speaker": "", "content": ""},
                {"start_time": 0.0, "end_time": 1.0, "speaker": "  ", "content": "x"},
                {"start_time": 0.0, "end_time": 1.0, "speaker": "A", "content": 3},
                {"start_time": 2.0, "end_time": 2.0, "speaker": "A", "content": "x"},
                {"start_time": -1.0, "end_time": 2.0, "speaker": "A", "content": "x"},
                {"start_time": "3.0", "end_time": "4.5", "speaker": "A", "content": "ok"}
            ])),
            &QaThresholds::default(),
        );

        let reasons: Vec<&str> = report
            .invalid_segments
            .iter()
            .map(|s| s.reason.as_str())
            .collect();
        assert_eq!(
            reasons,
            vec![
                "not an object",
                "missing/invalid timestamps",
                "missing/invalid speaker",
                "missing/invalid content",
                "invalid timestamps",
                "invalid timestamps",
            ]
        );
        assert_eq!(report.valid_segments, 1);
        assert_eq!(report.invalid_segments_count, 6);
        assert!(report.ok);
        assert_eq!(report.warnings, vec!["6 invalid segments detected (not removed)"]);
    }

    #[test]
    fn test_overlap_gap_and_long_segment() {
        let report = check_transcript(
            &transcript(json!([
                {"start_time": 0.0, "end_time": 3.0, "speaker": "A", "content": "un"},
                {"start_time": 2.5, "end_time": 4.0, "speaker": "B", "content": "deux"},
                {"start_time": 7.25, "end_time": 40.0, "speaker": "A", "content": "trois"}
            ])),
            &QaThresholds::default(),
        );

        assert_eq!(report.overlaps.len(), 1);
        assert_eq!(report.overlaps[0].overlap_s, 0.5);
        assert_eq!(report.overlaps[0].prev_index, 0);
        assert_eq!(report.overlaps[0].next_index, 1);

        assert_eq!(report.omission_suspects.len(), 1);
        assert_eq!(report.omission_suspects[0].gap_s, 3.25);
        assert_eq!(report.omission_suspects[0].prev_end, 4.0);

        assert_eq!(report.long_segments.len(), 1);
        assert_eq!(report.long_segments[0].index, 2);
        assert_eq!(report.long_segments[0].duration_s, 32.75);

        assert_eq!(
            report.warnings,
            vec!["1 overlaps detected", "1 large gaps detected (>= 2.0s)"]
        );
    }

    #[test]
    fn test_gap_threshold_is_inclusive() {
        let report = check_transcript(
            &transcript(json!([
                {"start_time": 0.0, "end_time": 1.0, "speaker": "A", "content": "un"},
                {"start_time": 3.0, "end_time": 4.0, "speaker": "A", "content": "deux"}
            ])),
            &QaThresholds::default(),
        );
        assert_eq!(report.omission_suspects.len(), 1);
        assert_eq!(report.omission_suspects[0].gap_s, 2.0);
    }

    #[test]
    fn test_out_of_order_is_sorted_for_analysis() {
        let messages = json!([
            {"start_time": 5.0, "end_time": 6.0, "speaker": "A", "content": "deux"},
            {"start_time": 0.0, "end_time": 4.5, "speaker": "B", "content": "un"}
        ]);

        let sorted = check_transcript(&transcript(messages.clone()), &QaThresholds::default());
        assert!(sorted.sorted_for_analysis);
        assert!(sorted.overlaps.is_empty());
        assert!(sorted.omission_suspects.is_empty());
        assert_eq!(
            sorted.warnings,
            vec!["segments were out of chronological order; sorted for analysis"]
        );

        let unsorted = check_transcript(
            &transcript(messages),
            &QaThresholds {
                sort_for_analysis: false,
                ..QaThresholds::default()
            },
        );
        assert!(!unsorted.sorted_for_analysis);
        assert_eq!(unsorted.overlaps.len(), 1);
        assert_eq!(unsorted.overlaps[0].overlap_s, 6.0);
        assert_eq!(unsorted.warnings, vec!["1 overlaps detected"]);
    }

    #[test]
    fn test_report_serialization_shape() {
        let report = check_transcript(
            &transcript(json!([{"start_time": 0, "end_time": 1, "speaker": "A", "content": "x"}])),
            &QaThresholds::default(),
        );
        let value = report.to_value().unwrap();

        assert_eq!(value["ok"], json!(true));
        assert_eq!(
            value["thresholds"],
            json!({"gap_threshold_s": 2.0, "long_segment_threshold_s": 25.0})
        );
        assert_eq!(value["sorted_for_analysis"], json!(true));
        assert!(value["omission_suspects"].as_array().unwrap().is_empty());
    }
}
