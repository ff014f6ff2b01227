//! Context extraction for Retouche.
//!
//! The editor consumes a typed [`ContextInferred`] payload: domain, speaker
//! roles, glossary entries and language errors, each carrying a confidence.
//! The payload is produced by a [`ContextInferrer`] (an LLM call) and stored in
//! the transcript under `context_inferred`.

mod extraction;
mod inferrer;

pub use extraction::{
    extraction_schema, validate_evidence_quotes, ContextExtraction, ContextInference,
    ContextReport, DomainGuess, DomainLabel, ErrorType, EvidenceValidation, GlossaryCandidate,
    LanguageError, RoleLabel, SpeakerRoleGuess, EXTRACTION_SCHEMA_NAME,
};
pub use inferrer::{ContextInferrer, OpenAiContextInferrer};

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Context payload consumed by the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextInferred {
    #[serde(default)]
    pub domain: String,
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub domain_confidence: f64,
    #[serde(default)]
    pub speaker_role_map: BTreeMap<String, String>,
    #[serde(default)]
    pub glossary: Vec<GlossaryEntry>,
    #[serde(default)]
    pub language_errors: Vec<LanguageErrorEntry>,
    #[serde(default)]
    pub constraints: Vec<String>,
}

/// A glossary term and the surface forms that should be normalized to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    /// Canonical spelling.
    #[serde(default)]
    pub term: String,
    /// Literal strings as they appear in the transcript.
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: f64,
}

impl GlossaryEntry {
    pub fn new(term: &str, aliases: &[&str], confidence: f64) -> Self {
        Self {
            term: term.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            confidence,
        }
    }
}

/// A flagged incorrect phrase and its corrected form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageErrorEntry {
    #[serde(default)]
    pub error_type: String,
    #[serde(default)]
    pub incorrect_text: String,
    #[serde(default)]
    pub correct_form: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: f64,
}

impl LanguageErrorEntry {
    pub fn new(incorrect_text: &str, correct_form: &str, confidence: f64) -> Self {
        Self {
            incorrect_text: incorrect_text.to_string(),
            correct_form: correct_form.to_string(),
            confidence,
            ..Default::default()
        }
    }
}

impl ContextInferred {
    /// Ingest an untyped `context_inferred` value.
    ///
    /// Never fails: a missing or non-object value yields an empty context, and
    /// individual fields or list entries with the wrong shape are dropped.
    pub fn from_value(value: Option<&Value>) -> Self {
        let map = match value {
            Some(Value::Object(map)) => map,
            None | Some(Value::Null) => return Self::default(),
            Some(other) => {
                warn!("Ignoring context_inferred of unexpected type: {}", type_name(other));
                return Self::default();
            }
        };

        Self {
            domain: field_or_default(map.get("domain"), "domain"),
            domain_confidence: confidence_or_default(
                map.get("domain_confidence"),
                "domain_confidence",
            ),
            speaker_role_map: field_or_default(map.get("speaker_role_map"), "speaker_role_map"),
            glossary: entries(map.get("glossary"), "glossary"),
            language_errors: entries(map.get("language_errors"), "language_errors"),
            constraints: field_or_default(map.get("constraints"), "constraints"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.glossary.is_empty() && self.language_errors.is_empty()
    }
}

fn field_or_default<T: DeserializeOwned + Default>(value: Option<&Value>, name: &str) -> T {
    match value {
        None | Some(Value::Null) => T::default(),
        Some(v) => serde_json::from_value(v.clone()).unwrap_or_else(|e| {
            warn!("Ignoring malformed context field '{}': {}", name, e);
            T::default()
        }),
    }
}

fn confidence_or_default(value: Option<&Value>, name: &str) -> f64 {
    match value {
        None | Some(Value::Null) => 0.0,
        Some(v) => parse_confidence(v).unwrap_or_else(|| {
            warn!("Ignoring malformed context field '{}': {}", name, v);
            0.0
        }),
    }
}

/// A finite confidence given as a number or a numeric string.
fn parse_confidence(value: &Value) -> Option<f64> {
    let confidence = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    confidence.is_finite().then_some(confidence)
}

/// Deserialize a confidence leniently; `null` reads as 0.
pub(crate) fn lenient_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0.0),
        value => parse_confidence(&value).ok_or_else(|| {
            D::Error::custom(format!("invalid confidence {} of type {}", value, type_name(&value)))
        }),
    }
}

fn entries<T: DeserializeOwned>(value: Option<&Value>, name: &str) -> Vec<T> {
    let items = match value {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Vec::new(),
        Some(other) => {
            warn!("Ignoring context field '{}' of type {}", name, type_name(other));
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed {} entry #{}: {}", name, i, e);
                None
            }
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_absent_or_null() {
        assert_eq!(ContextInferred::from_value(None), ContextInferred::default());
        assert_eq!(
            ContextInferred::from_value(Some(&Value::Null)),
            ContextInferred::default()
        );
        assert_eq!(
            ContextInferred::from_value(Some(&json!("oops"))),
            ContextInferred::default()
        );
    }

    #[test]
    fn test_from_value_full_payload() {
        let value = json!({
            "domain": "support",
            "domain_confidence": 0.8,
            "speaker_role_map": {"speaker_0": "agent"},
            "glossary": [{"term": "Kubernetes", "aliases": ["kube"], "confidence": 0.9}],
            "language_errors": [{
                "error_type": "spelling",
                "incorrect_text": "tres",
                "correct_form": "très",
                "explanation": "missing accent",
                "confidence": 0.9
            }],
            "constraints": ["no_invention"]
        });

        let ctx = ContextInferred::from_value(Some(&value));
        assert_eq!(ctx.domain, "support");
        assert_eq!(ctx.speaker_role_map.get("speaker_0").map(String::as_str), Some("agent"));
        assert_eq!(ctx.glossary, vec![GlossaryEntry::new("Kubernetes", &["kube"], 0.9)]);
        assert_eq!(ctx.language_errors[0].correct_form, "très");
        assert_eq!(ctx.constraints, vec!["no_invention"]);
        assert!(!ctx.is_empty());
    }

    #[test]
    fn test_from_value_drops_malformed_entries_only() {
        let value = json!({
            "domain": 42,
            "glossary": [
                {"term": "Rust", "confidence": 0.9},
                {"term": ["not", "a", "string"], "confidence": 0.9},
                "bare string"
            ],
            "language_errors": {"not": "a list"}
        });

        let ctx = ContextInferred::from_value(Some(&value));
        assert_eq!(ctx.domain, "");
        assert_eq!(ctx.glossary.len(), 1);
        assert_eq!(ctx.glossary[0].term, "Rust");
        assert!(ctx.glossary[0].aliases.is_empty());
        assert!(ctx.language_errors.is_empty());
    }

    #[test]
    fn test_confidence_accepts_numeric_strings() {
        let value = json!({
            "domain_confidence": " 0.7 ",
            "glossary": [
                {"term": "Kubernetes", "aliases": ["kube"], "confidence": "0.9"},
                {"term": "Docker", "aliases": ["docker"], "confidence": null},
                {"term": "Helm", "aliases": ["helm"], "confidence": "high"},
                {"term": "Argo", "aliases": ["argo"], "confidence": "NaN"}
            ],
            "language_errors": [{"incorrect_text": "tres", "correct_form": "très", "confidence": "0.85"}]
        });

        let ctx = ContextInferred::from_value(Some(&value));
        assert_eq!(ctx.domain_confidence, 0.7);
        assert_eq!(
            ctx.glossary,
            vec![
                GlossaryEntry::new("Kubernetes", &["kube"], 0.9),
                GlossaryEntry::new("Docker", &["docker"], 0.0),
            ]
        );
        assert_eq!(ctx.language_errors[0].confidence, 0.85);
    }

    #[test]
    fn test_is_empty_ignores_domain_only_context() {
        let ctx = ContextInferred::from_value(Some(&json!({"domain": "sales", "glossary": []})));
        assert!(ctx.is_empty());
    }
}
