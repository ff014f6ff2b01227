//! Provenance records for individual text transformations.

use serde::{Deserialize, Serialize};

/// The whitelisted transformation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    GlossaryNormalization,
    LanguageErrorFix,
    Deduplication,
    Punctuation,
}

impl OpKind {
    /// Fixed confidence attached to every operation of this kind.
    pub fn confidence(&self) -> f64 {
        match self {
            OpKind::GlossaryNormalization => 0.9,
            OpKind::LanguageErrorFix => 0.85,
            OpKind::Deduplication => 0.9,
            OpKind::Punctuation => 0.8,
        }
    }

    pub fn source(&self) -> OpSource {
        match self {
            OpKind::GlossaryNormalization => OpSource::Glossary,
            OpKind::LanguageErrorFix => OpSource::LlmError,
            OpKind::Deduplication | OpKind::Punctuation => OpSource::Rule,
        }
    }
}

/// Where the evidence for an operation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpSource {
    Glossary,
    LlmError,
    Rule,
}

/// One recorded transformation.
///
/// `before` and `after` are full segment-text snapshots around this single
/// operation, so each record can be replayed or audited on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "op")]
    pub kind: OpKind,
    pub detail: String,
    pub before: String,
    pub after: String,
    pub confidence: f64,
    pub source: OpSource,
}

impl Operation {
    pub fn new(kind: OpKind, detail: impl Into<String>, before: &str, after: &str) -> Self {
        Self {
            kind,
            detail: detail.into(),
            before: before.to_string(),
            after: after.to_string(),
            confidence: kind.confidence(),
            source: kind.source(),
        }
    }
}
