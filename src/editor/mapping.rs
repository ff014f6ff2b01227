//! Lookup tables built from the inferred context.

use super::normalize::normalize;
use crate::context::ContextInferred;
use std::collections::BTreeMap;
use tracing::debug;

/// Normalized alias -> canonical term.
pub type AliasMap = BTreeMap<String, String>;

/// Normalized incorrect phrase -> corrected form.
pub type ErrorMap = BTreeMap<String, String>;

/// Default confidence gate for glossary entries.
pub const DEFAULT_GLOSSARY_MIN_CONFIDENCE: f64 = 0.6;

/// Default confidence gate for language errors when building an error map directly.
pub const DEFAULT_ERROR_MIN_CONFIDENCE: f64 = 0.80;

/// Build the alias map from glossary entries at or above `min_confidence`.
///
/// Each kept term maps from its own normalized form as well as from every
/// non-empty alias. Later entries win on key collision.
pub fn build_alias_map(context: &ContextInferred, min_confidence: f64) -> AliasMap {
    let mut alias_map = AliasMap::new();

    for entry in &context.glossary {
        let term = entry.term.trim();
        if term.is_empty() || entry.confidence < min_confidence {
            continue;
        }

        alias_map.insert(normalize(term), term.to_string());

        for alias in &entry.aliases {
            let alias = alias.trim();
            if !alias.is_empty() {
                alias_map.insert(normalize(alias), term.to_string());
            }
        }
    }

    debug!("Alias map: {} keys (min confidence {})", alias_map.len(), min_confidence);
    alias_map
}

/// Build the error map from language errors at or above `min_confidence`.
///
/// Entries with an empty incorrect or correct text are skipped. Later entries
/// win on key collision.
pub fn build_error_map(context: &ContextInferred, min_confidence: f64) -> ErrorMap {
    let mut error_map = ErrorMap::new();

    for error in &context.language_errors {
        let incorrect = error.incorrect_text.trim();
        let correct = error.correct_form.trim();
        if incorrect.is_empty() || correct.is_empty() || error.confidence < min_confidence {
            continue;
        }
        error_map.insert(normalize(incorrect), correct.to_string());
    }

    debug!("Error map: {} keys (min confidence {})", error_map.len(), min_confidence);
    error_map
}
