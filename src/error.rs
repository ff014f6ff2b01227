//! Error types for Retouche.

use thiserror::Error;

/// Library-level error type for Retouche operations.
#[derive(Error, Debug)]
pub enum RetoucheError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid transcript: {0}")]
    InvalidInput(String),

    #[error("QA failed: {0}")]
    QaFailed(String),

    #[error("Context inference failed: {0}")]
    ContextInference(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Retouche operations.
pub type Result<T> = std::result::Result<T, RetoucheError>;
