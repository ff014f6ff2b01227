//! LLM extraction schema, evidence validation and context report.

use super::{ContextInferred, GlossaryEntry, LanguageErrorEntry};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Call domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainLabel {
    Sales,
    Support,
    Recruiting,
    Healthcare,
    #[default]
    #[serde(other)]
    Other,
}

impl DomainLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainLabel::Sales => "sales",
            DomainLabel::Support => "support",
            DomainLabel::Recruiting => "recruiting",
            DomainLabel::Healthcare => "healthcare",
            DomainLabel::Other => "other",
        }
    }
}

/// Speaker role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleLabel {
    Agent,
    Client,
    Interviewer,
    Candidate,
    #[default]
    #[serde(other)]
    Other,
}

impl RoleLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleLabel::Agent => "agent",
            RoleLabel::Client => "client",
            RoleLabel::Interviewer => "interviewer",
            RoleLabel::Candidate => "candidate",
            RoleLabel::Other => "other",
        }
    }
}

/// Kind of language error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Spelling,
    Grammar,
    Conjugation,
    Agreement,
    #[default]
    #[serde(other)]
    Other,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Spelling => "spelling",
            ErrorType::Grammar => "grammar",
            ErrorType::Conjugation => "conjugation",
            ErrorType::Agreement => "agreement",
            ErrorType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainGuess {
    #[serde(default)]
    pub label: DomainLabel,
    #[serde(default, deserialize_with = "super::lenient_confidence")]
    pub confidence: f64,
    /// Exact substrings of the transcript.
    #[serde(default)]
    pub evidence_quotes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerRoleGuess {
    pub mapped_from_speaker: String,
    #[serde(default)]
    pub role: RoleLabel,
    #[serde(default, deserialize_with = "super::lenient_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub evidence_quotes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryCandidate {
    pub term: String,
    #[serde(default)]
    pub aliases_found: Vec<String>,
    #[serde(default, deserialize_with = "super::lenient_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub evidence_quotes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageError {
    #[serde(default)]
    pub error_type: ErrorType,
    /// The exact incorrect word or phrase.
    pub incorrect_text: String,
    pub correct_form: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, deserialize_with = "super::lenient_confidence")]
    pub confidence: f64,
    /// The full sentence containing the error.
    #[serde(default)]
    pub evidence_quote: String,
}

fn default_constraints() -> Vec<String> {
    vec![
        "no_invention".to_string(),
        "no_paraphrase".to_string(),
        "preserve_timestamps".to_string(),
    ]
}

/// Structured output expected from the extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextExtraction {
    #[serde(default)]
    pub domain_guess: DomainGuess,
    #[serde(default)]
    pub participants_guess: Vec<SpeakerRoleGuess>,
    #[serde(default)]
    pub glossary_candidates: Vec<GlossaryCandidate>,
    #[serde(default)]
    pub language_errors: Vec<LanguageError>,
    #[serde(default = "default_constraints")]
    pub constraints: Vec<String>,
}

impl ContextExtraction {
    /// Clamp every confidence into [0, 1]; NaN becomes 0.
    pub fn clamp_confidences(&mut self) {
        fn clamp(c: &mut f64) {
            *c = if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) };
        }
        clamp(&mut self.domain_guess.confidence);
        self.participants_guess
            .iter_mut()
            .for_each(|p| clamp(&mut p.confidence));
        self.glossary_candidates
            .iter_mut()
            .for_each(|g| clamp(&mut g.confidence));
        self.language_errors
            .iter_mut()
            .for_each(|e| clamp(&mut e.confidence));
    }
}

/// Name under which the extraction schema is sent to the model.
pub const EXTRACTION_SCHEMA_NAME: &str = "context_extraction";

const DOMAIN_LABELS: [DomainLabel; 5] = [
    DomainLabel::Sales,
    DomainLabel::Support,
    DomainLabel::Recruiting,
    DomainLabel::Healthcare,
    DomainLabel::Other,
];

const ROLE_LABELS: [RoleLabel; 5] = [
    RoleLabel::Agent,
    RoleLabel::Client,
    RoleLabel::Interviewer,
    RoleLabel::Candidate,
    RoleLabel::Other,
];

const ERROR_TYPES: [ErrorType; 5] = [
    ErrorType::Spelling,
    ErrorType::Grammar,
    ErrorType::Conjugation,
    ErrorType::Agreement,
    ErrorType::Other,
];

/// Strict-mode object: every property required, nothing else allowed.
fn strict_object(properties: Value) -> Value {
    let required: Vec<String> = properties
        .as_object()
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn string_enum(values: impl IntoIterator<Item = &'static str>) -> Value {
    json!({"type": "string", "enum": values.into_iter().collect::<Vec<_>>()})
}

fn quotes(description: &str) -> Value {
    json!({"type": "array", "items": {"type": "string"}, "description": description})
}

fn confidence() -> Value {
    json!({"type": "number", "description": "Between 0 and 1."})
}

/// JSON schema of [`ContextExtraction`] for structured outputs.
pub fn extraction_schema() -> Value {
    let domain_guess = strict_object(json!({
        "label": string_enum(DOMAIN_LABELS.iter().map(DomainLabel::as_str)),
        "confidence": confidence(),
        "evidence_quotes": quotes("Exact substrings from the transcript."),
    }));
    let participant = strict_object(json!({
        "mapped_from_speaker": {"type": "string"},
        "role": string_enum(ROLE_LABELS.iter().map(RoleLabel::as_str)),
        "confidence": confidence(),
        "evidence_quotes": quotes("Exact substrings from the transcript."),
    }));
    let glossary_candidate = strict_object(json!({
        "term": {"type": "string"},
        "aliases_found": quotes("Surface forms seen in the transcript."),
        "confidence": confidence(),
        "evidence_quotes": quotes("Exact substrings from the transcript."),
    }));
    let language_error = strict_object(json!({
        "error_type": string_enum(ERROR_TYPES.iter().map(ErrorType::as_str)),
        "incorrect_text": {"type": "string", "description": "The exact incorrect word or phrase."},
        "correct_form": {"type": "string"},
        "explanation": {"type": "string"},
        "confidence": confidence(),
        "evidence_quote": {
            "type": "string",
            "description": "The full sentence containing the error, copied exactly."
        },
    }));

    strict_object(json!({
        "domain_guess": domain_guess,
        "participants_guess": {"type": "array", "items": participant},
        "glossary_candidates": {"type": "array", "items": glossary_candidate},
        "language_errors": {"type": "array", "items": language_error},
        "constraints": {"type": "array", "items": {"type": "string"}},
    }))
}

/// Outcome of checking evidence quotes against the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceValidation {
    pub missing_quotes: Vec<String>,
    pub ok: bool,
}

/// Check that every non-empty evidence quote is an exact substring of the transcript.
///
/// Reports only; the extraction is not modified.
pub fn validate_evidence_quotes(
    extraction: &ContextExtraction,
    transcript_text: &str,
) -> EvidenceValidation {
    let mut missing_quotes = Vec::new();
    let mut check = |quotes: &[String]| {
        for quote in quotes {
            if !quote.is_empty() && !transcript_text.contains(quote.as_str()) {
                missing_quotes.push(quote.clone());
            }
        }
    };

    check(&extraction.domain_guess.evidence_quotes);
    for participant in &extraction.participants_guess {
        check(&participant.evidence_quotes);
    }
    for candidate in &extraction.glossary_candidates {
        check(&candidate.evidence_quotes);
    }
    for error in &extraction.language_errors {
        check(std::slice::from_ref(&error.evidence_quote));
    }

    EvidenceValidation {
        ok: missing_quotes.is_empty(),
        missing_quotes,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantEvidence {
    pub speaker: String,
    pub role: String,
    pub confidence: f64,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryEvidence {
    pub term: String,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedLanguageError {
    pub error_type: String,
    pub incorrect: String,
    pub correct: String,
    pub explanation: String,
    pub confidence: f64,
    pub evidence: String,
}

/// Audit trail of the extraction: evidence per claim and validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextReport {
    pub domain_evidence: Vec<String>,
    pub participants: Vec<ParticipantEvidence>,
    pub glossary_evidence: Vec<GlossaryEvidence>,
    pub language_errors_detected: Vec<DetectedLanguageError>,
    pub evidence_validation: EvidenceValidation,
    pub source: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Result of context inference: the payload for the editor plus its report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextInference {
    pub context_inferred: ContextInferred,
    pub context_report: ContextReport,
}

pub(crate) const EVIDENCE_WARNING: &str =
    "Evidence quotes validation failed; downstream steps should treat context as low-confidence.";

impl ContextInference {
    /// Build the editor payload and the report from a parsed extraction.
    pub fn from_extraction(extraction: &ContextExtraction, transcript_text: &str, model: &str) -> Self {
        let evidence_validation = validate_evidence_quotes(extraction, transcript_text);

        let context_inferred = ContextInferred {
            domain: extraction.domain_guess.label.as_str().to_string(),
            domain_confidence: extraction.domain_guess.confidence,
            speaker_role_map: extraction
                .participants_guess
                .iter()
                .map(|p| (p.mapped_from_speaker.clone(), p.role.as_str().to_string()))
                .collect(),
            glossary: extraction
                .glossary_candidates
                .iter()
                .map(|g| GlossaryEntry {
                    term: g.term.clone(),
                    aliases: g.aliases_found.clone(),
                    confidence: g.confidence,
                })
                .collect(),
            language_errors: extraction
                .language_errors
                .iter()
                .map(|e| LanguageErrorEntry {
                    error_type: e.error_type.as_str().to_string(),
                    incorrect_text: e.incorrect_text.clone(),
                    correct_form: e.correct_form.clone(),
                    explanation: e.explanation.clone(),
                    confidence: e.confidence,
                })
                .collect(),
            constraints: extraction.constraints.clone(),
        };

        let warning = (!evidence_validation.ok).then(|| EVIDENCE_WARNING.to_string());

        let context_report = ContextReport {
            domain_evidence: extraction.domain_guess.evidence_quotes.clone(),
            participants: extraction
                .participants_guess
                .iter()
                .map(|p| ParticipantEvidence {
                    speaker: p.mapped_from_speaker.clone(),
                    role: p.role.as_str().to_string(),
                    confidence: p.confidence,
                    evidence: p.evidence_quotes.clone(),
                })
                .collect(),
            glossary_evidence: extraction
                .glossary_candidates
                .iter()
                .map(|g| GlossaryEvidence {
                    term: g.term.clone(),
                    evidence: g.evidence_quotes.clone(),
                })
                .collect(),
            language_errors_detected: extraction
                .language_errors
                .iter()
                .map(|e| DetectedLanguageError {
                    error_type: e.error_type.as_str().to_string(),
                    incorrect: e.incorrect_text.clone(),
                    correct: e.correct_form.clone(),
                    explanation: e.explanation.clone(),
                    confidence: e.confidence,
                    evidence: e.evidence_quote.clone(),
                })
                .collect(),
            evidence_validation,
            source: "openai_chat_json".to_string(),
            model: model.to_string(),
            warning,
        };

        Self {
            context_inferred,
            context_report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "bonjour je suis Marc du support\nje pense que il est tres bon";

    fn sample_extraction() -> ContextExtraction {
        serde_json::from_str(
            r#"{
                "domain_guess": {"label": "support", "confidence": 0.8, "evidence_quotes": ["du support"]},
                "participants_guess": [
                    {"mapped_from_speaker": "speaker_0", "role": "agent", "confidence": 0.9, "evidence_quotes": ["je suis Marc"]}
                ],
                "glossary_candidates": [
                    {"term": "Marc", "aliases_found": [], "confidence": 0.7, "evidence_quotes": ["Marc"]}
                ],
                "language_errors": [
                    {"error_type": "spelling", "incorrect_text": "tres", "correct_form": "très",
                     "explanation": "accent", "confidence": 0.9, "evidence_quote": "je pense que il est tres bon"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_defaults_and_unknown_labels() {
        let extraction: ContextExtraction = serde_json::from_str(
            r#"{"domain_guess": {"label": "banking", "confidence": 0.4},
                "language_errors": [{"error_type": "accent", "incorrect_text": "a", "correct_form": "à"}]}"#,
        )
        .unwrap();

        assert_eq!(extraction.domain_guess.label, DomainLabel::Other);
        assert_eq!(extraction.language_errors[0].error_type, ErrorType::Other);
        assert_eq!(extraction.constraints.len(), 3);
    }

    #[test]
    fn test_extraction_schema_is_strict() {
        let schema = extraction_schema();

        fn check_strict(object: &Value) {
            let properties = object["properties"].as_object().unwrap();
            let required: Vec<&str> = object["required"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap())
                .collect();
            let keys: Vec<&str> = properties.keys().map(String::as_str).collect();
            assert_eq!(required, keys);
            assert_eq!(object["additionalProperties"], json!(false));
        }

        check_strict(&schema);
        check_strict(&schema["properties"]["domain_guess"]);
        for list in ["participants_guess", "glossary_candidates", "language_errors"] {
            check_strict(&schema["properties"][list]["items"]);
        }
    }

    #[test]
    fn test_extraction_schema_labels_parse_back() {
        let schema = extraction_schema();
        let labels = &schema["properties"]["domain_guess"]["properties"]["label"]["enum"];
        for label in labels.as_array().unwrap() {
            let parsed: DomainLabel = serde_json::from_value(label.clone()).unwrap();
            assert_eq!(json!(parsed.as_str()), *label);
        }

        let error_types =
            &schema["properties"]["language_errors"]["items"]["properties"]["error_type"]["enum"];
        assert_eq!(
            *error_types,
            json!(["spelling", "grammar", "conjugation", "agreement", "other"])
        );

        let extraction: ContextExtraction = serde_json::from_value(json!({
            "domain_guess": {"label": "sales", "confidence": 0.5, "evidence_quotes": []},
            "participants_guess": [],
            "glossary_candidates": [],
            "language_errors": [],
            "constraints": ["no_invention"]
        }))
        .unwrap();
        assert_eq!(extraction.domain_guess.label, DomainLabel::Sales);
    }

    #[test]
    fn test_confidence_given_as_string() {
        let extraction: ContextExtraction = serde_json::from_str(
            r#"{"glossary_candidates": [{"term": "Docker", "confidence": "0.75"}]}"#,
        )
        .unwrap();
        assert_eq!(extraction.glossary_candidates[0].confidence, 0.75);
    }

    #[test]
    fn test_evidence_all_present() {
        let validation = validate_evidence_quotes(&sample_extraction(), TEXT);
        assert!(validation.ok);
        assert!(validation.missing_quotes.is_empty());
    }

    #[test]
    fn test_evidence_missing_quote_reported() {
        let mut extraction = sample_extraction();
        extraction.domain_guess.evidence_quotes.push("invented quote".to_string());
        extraction.domain_guess.evidence_quotes.push(String::new());

        let validation = validate_evidence_quotes(&extraction, TEXT);
        assert!(!validation.ok);
        assert_eq!(validation.missing_quotes, vec!["invented quote"]);
    }

    #[test]
    fn test_clamp_confidences() {
        let mut extraction = sample_extraction();
        extraction.domain_guess.confidence = 1.7;
        extraction.language_errors[0].confidence = -0.2;
        extraction.glossary_candidates[0].confidence = f64::NAN;
        extraction.clamp_confidences();

        assert_eq!(extraction.domain_guess.confidence, 1.0);
        assert_eq!(extraction.language_errors[0].confidence, 0.0);
        assert_eq!(extraction.glossary_candidates[0].confidence, 0.0);
    }

    #[test]
    fn test_inference_from_extraction() {
        let inference = ContextInference::from_extraction(&sample_extraction(), TEXT, "gpt-4.1");

        let ctx = &inference.context_inferred;
        assert_eq!(ctx.domain, "support");
        assert_eq!(ctx.speaker_role_map.get("speaker_0").map(String::as_str), Some("agent"));
        assert_eq!(ctx.glossary[0].term, "Marc");
        assert_eq!(ctx.language_errors[0].error_type, "spelling");
        assert_eq!(ctx.language_errors[0].correct_form, "très");

        let report = &inference.context_report;
        assert_eq!(report.model, "gpt-4.1");
        assert!(report.evidence_validation.ok);
        assert!(report.warning.is_none());
        assert_eq!(report.language_errors_detected[0].incorrect, "tres");
    }

    #[test]
    fn test_inference_flags_unreliable_context() {
        let mut extraction = sample_extraction();
        extraction.language_errors[0].evidence_quote = "not in the transcript".to_string();

        let inference = ContextInference::from_extraction(&extraction, TEXT, "m");
        assert_eq!(inference.context_report.warning.as_deref(), Some(EVIDENCE_WARNING));
    }
}
