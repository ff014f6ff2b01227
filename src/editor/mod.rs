//! Rule-based transcript editor.
//!
//! Builds alias and error maps from the inferred context, rewrites every
//! segment's `content` through the whitelisted passes, and records each
//! mutation as an [`Operation`] in a [`TransformationReport`].
//!
//! Only `content` is ever replaced. Index, timestamps, speaker and any
//! passthrough fields of a segment are left byte-identical.

mod mapping;
mod normalize;
mod operation;
mod passes;
mod report;

pub use mapping::{
    build_alias_map, build_error_map, AliasMap, ErrorMap, DEFAULT_ERROR_MIN_CONFIDENCE,
    DEFAULT_GLOSSARY_MIN_CONFIDENCE,
};
pub use normalize::normalize;
pub use operation::{OpKind, OpSource, Operation};
pub use passes::{
    apply_fixes, compile_rules, correct_language_errors, deduplicate, normalize_glossary,
    punctuate, ReplacementRule, Rewrite, Rewriter, END_PUNCT,
};
pub use report::{EditPolicy, SegmentReport, TransformationReport};

use crate::context::ContextInferred;
use crate::transcript::{Segment, Transcript};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

/// Confidence gate applied to language errors by the editor.
pub const EDITOR_ERROR_MIN_CONFIDENCE: f64 = 0.70;

/// Confidence gates for one editing run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorConfig {
    pub glossary_min_confidence: f64,
    pub error_min_confidence: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            glossary_min_confidence: DEFAULT_GLOSSARY_MIN_CONFIDENCE,
            error_min_confidence: EDITOR_ERROR_MIN_CONFIDENCE,
        }
    }
}

/// Edited transcript plus the report that was attached to it.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub transcript: Transcript,
    pub report: TransformationReport,
}

/// Rewrite a single segment. Segments without string content are returned as-is.
fn edit_segment(index: usize, segment: &Segment, rewriter: &Rewriter) -> (Segment, SegmentReport) {
    let (edited, changed, operations) = match segment.content() {
        Some(original) => {
            let rewrite = rewriter.apply(original);
            let changed = rewrite.text != original;
            (segment.with_content(rewrite.text), changed, rewrite.operations)
        }
        None => {
            debug!("Segment {} has no string content, leaving it untouched", index);
            (segment.clone(), false, Vec::new())
        }
    };

    let field = |key: &str| segment.field(key).cloned().unwrap_or(Value::Null);
    let report = SegmentReport {
        index,
        start_time: field("start_time"),
        end_time: field("end_time"),
        speaker: field("speaker"),
        changed,
        operations,
    };

    (edited, report)
}

/// Apply the whitelisted edits to every segment of a transcript.
///
/// Reads `context_inferred` (absent or malformed means empty maps), builds the
/// maps once, and attaches the report under `transformation_report.editor`.
/// Other top-level keys, and other keys inside `transformation_report`, are
/// kept.
#[instrument(skip_all, fields(segments = transcript.messages.len()))]
pub fn edit_transcript(transcript: &Transcript, config: &EditorConfig) -> EditOutcome {
    let context = ContextInferred::from_value(transcript.get("context_inferred"));
    let alias_map = build_alias_map(&context, config.glossary_min_confidence);
    let error_map = build_error_map(&context, config.error_min_confidence);
    let rewriter = Rewriter::new(&alias_map, &error_map);

    info!(
        "Editing with {} glossary rules and {} error rules",
        rewriter.glossary_rules().len(),
        rewriter.error_rules().len()
    );

    let (messages, segment_reports): (Vec<Segment>, Vec<SegmentReport>) = transcript
        .messages
        .iter()
        .enumerate()
        .map(|(index, segment)| edit_segment(index, segment, &rewriter))
        .unzip();

    let report = TransformationReport::new(segment_reports);
    info!(
        "Edited {}/{} segments ({} operations)",
        report.segments_modified,
        report.total_segments,
        report.operation_count()
    );

    let mut edited = transcript.with_messages(messages);
    attach_report(&mut edited, &report);

    EditOutcome {
        transcript: edited,
        report,
    }
}

fn attach_report(transcript: &mut Transcript, report: &TransformationReport) {
    let report_value = match serde_json::to_value(report) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to serialize transformation report: {}", e);
            return;
        }
    };

    let mut container = match transcript.get("transformation_report") {
        Some(Value::Object(existing)) => existing.clone(),
        _ => Map::new(),
    };
    container.insert("editor".to_string(), report_value);
    transcript.set("transformation_report", Value::Object(container));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transcript_with_context(messages: Value, context: Value) -> Transcript {
        serde_json::from_value(json!({
            "call_id": "c-1",
            "messages": messages,
            "context_inferred": context,
            "transformation_report": {"other_stage": {"ok": true}}
        }))
        .unwrap()
    }

    #[test]
    fn test_edit_transcript_end_to_end() {
        let transcript = transcript_with_context(
            json!([
                {"start_time": 0.0, "end_time": 2.0, "speaker": "speaker_0", "content": "je pense que il est tres bon", "id": "a"},
                {"start_time": 2.0, "end_time": 3.5, "speaker": "speaker_1", "content": "oui oui c'est bon"},
                {"start_time": 3.5, "end_time": 4.0, "speaker": "speaker_0", "content": "Tout va bien."}
            ]),
            json!({
                "glossary": [],
                "language_errors": [{"incorrect_text": "tres", "correct_form": "très", "confidence": 0.9}]
            }),
        );

        let outcome = edit_transcript(&transcript, &EditorConfig::default());
        let edited = &outcome.transcript;

        assert_eq!(edited.messages[0].content(), Some("Je pense que il est très bon."));
        assert_eq!(edited.messages[1].content(), Some("Oui c'est bon."));
        assert_eq!(edited.messages[2].content(), Some("Tout va bien."));

        let report = &outcome.report;
        assert_eq!(report.total_segments, 3);
        assert_eq!(report.segments_modified, 2);
        assert!(!report.segment_reports[2].changed);
        assert!(report.segment_reports[2].operations.is_empty());
        assert_eq!(report.segment_reports[1].speaker, json!("speaker_1"));
        assert_eq!(report.segment_reports[1].index, 1);

        assert_eq!(edited.get("call_id"), Some(&json!("c-1")));
        let attached = edited.get("transformation_report").unwrap();
        assert_eq!(attached["other_stage"], json!({"ok": true}));
        assert_eq!(attached["editor"]["segments_modified"], json!(2));
        assert_eq!(attached["editor"]["policy"]["timestamps_preserved"], json!(true));
        assert_eq!(
            attached["editor"]["segment_reports"][0]["operations"][0]["op"],
            json!("language_error_fix")
        );
    }

    #[test]
    fn test_preservation_invariant() {
        let transcript = transcript_with_context(
            json!([
                {"start_time": "0.50", "end_time": 2.25, "speaker": "Agent", "content": "kube kube", "lang": "fr"},
                {"start_time": 2.25, "end_time": 3.0, "speaker": "Client", "content": "ok"}
            ]),
            json!({"glossary": [{"term": "Kubernetes", "aliases": ["kube"], "confidence": 0.8}]}),
        );

        let outcome = edit_transcript(&transcript, &EditorConfig::default());

        assert_eq!(outcome.transcript.messages.len(), transcript.messages.len());
        for (before, after) in transcript.messages.iter().zip(&outcome.transcript.messages) {
            for key in ["start_time", "end_time", "speaker", "lang"] {
                assert_eq!(before.field(key), after.field(key), "field {}", key);
            }
        }
        assert_eq!(outcome.transcript.messages[0].content(), Some("Kubernetes."));
        assert_eq!(outcome.report.segment_reports[0].start_time, json!("0.50"));
    }

    #[test]
    fn test_confidence_gating() {
        let transcript = transcript_with_context(
            json!([{"start_time": 0.0, "end_time": 1.0, "speaker": "A", "content": "ca marche sur sales force"}]),
            json!({
                "glossary": [{"term": "Salesforce", "aliases": ["sales force"], "confidence": 0.59}],
                "language_errors": [{"incorrect_text": "ca", "correct_form": "ça", "confidence": 0.69}]
            }),
        );

        let outcome = edit_transcript(&transcript, &EditorConfig::default());
        assert_eq!(
            outcome.transcript.messages[0].content(),
            Some("Ca marche sur sales force.")
        );
        let kinds: Vec<OpKind> = outcome.report.segment_reports[0]
            .operations
            .iter()
            .map(|op| op.kind)
            .collect();
        assert_eq!(kinds, vec![OpKind::Punctuation]);
    }

    #[test]
    fn test_error_threshold_is_configurable() {
        let transcript = transcript_with_context(
            json!([{"start_time": 0.0, "end_time": 1.0, "speaker": "A", "content": "ca marche"}]),
            json!({"language_errors": [{"incorrect_text": "ca", "correct_form": "ça", "confidence": 0.75}]}),
        );

        let lenient = edit_transcript(&transcript, &EditorConfig::default());
        assert_eq!(lenient.transcript.messages[0].content(), Some("Ça marche."));

        let strict = EditorConfig {
            error_min_confidence: DEFAULT_ERROR_MIN_CONFIDENCE,
            ..EditorConfig::default()
        };
        let strict = edit_transcript(&transcript, &strict);
        assert_eq!(strict.transcript.messages[0].content(), Some("Ca marche."));
    }

    #[test]
    fn test_missing_context_still_runs_rules() {
        let transcript: Transcript = serde_json::from_value(json!({
            "messages": [{"start_time": 0.0, "end_time": 1.0, "speaker": "A", "content": "bon bon"}]
        }))
        .unwrap();

        let outcome = edit_transcript(&transcript, &EditorConfig::default());
        assert_eq!(outcome.transcript.messages[0].content(), Some("Bon."));
        assert_eq!(outcome.report.segment_reports[0].operations.len(), 2);
        assert!(outcome.transcript.get("transformation_report").is_some());
    }

    #[test]
    fn test_malformed_segments_are_not_fatal() {
        let transcript: Transcript = serde_json::from_value(json!({
            "messages": [
                "not an object",
                {"start_time": 0.0, "end_time": 1.0, "speaker": "A"},
                {"start_time": 1.0, "end_time": 2.0, "speaker": "A", "content": 12}
            ],
            "transformation_report": "garbage"
        }))
        .unwrap();

        let outcome = edit_transcript(&transcript, &EditorConfig::default());

        assert_eq!(outcome.transcript.messages, transcript.messages);
        assert_eq!(outcome.report.segments_modified, 0);
        assert_eq!(outcome.report.segment_reports[0].start_time, Value::Null);
        assert!(outcome
            .report
            .segment_reports
            .iter()
            .all(|r| r.operations.is_empty()));
        assert!(outcome.transcript.get("transformation_report").unwrap()["editor"].is_object());
    }

    #[test]
    fn test_alias_already_in_canonical_form_is_not_reported() {
        let transcript = transcript_with_context(
            json!([{"start_time": 0.0, "end_time": 1.0, "speaker": "A", "content": "J'utilise Chat GPT."}]),
            json!({"glossary": [{"term": "Chat GPT", "aliases": ["chat gpt", "gpt"], "confidence": 0.9}]}),
        );

        let outcome = edit_transcript(&transcript, &EditorConfig::default());
        let report = &outcome.report.segment_reports[0];

        assert_eq!(outcome.transcript.messages[0].content(), Some("J'utilise Chat GPT."));
        assert!(!report.changed);
        assert!(report.operations.is_empty());
        assert_eq!(outcome.report.segments_modified, 0);
    }

    #[test]
    fn test_edit_is_idempotent_on_transcript() {
        let transcript = transcript_with_context(
            json!([{"start_time": 0.0, "end_time": 1.0, "speaker": "A", "content": "on a deploye deploye sur kube"}]),
            json!({
                "glossary": [{"term": "Kubernetes", "aliases": ["kube"], "confidence": 0.9}],
                "language_errors": [{"incorrect_text": "deploye", "correct_form": "déployé", "confidence": 0.9}]
            }),
        );

        let first = edit_transcript(&transcript, &EditorConfig::default());
        let second = edit_transcript(&first.transcript, &EditorConfig::default());

        assert_eq!(first.transcript.messages, second.transcript.messages);
        assert_eq!(second.report.segments_modified, 0);
        assert_eq!(second.report.operation_count(), 0);
    }
}
