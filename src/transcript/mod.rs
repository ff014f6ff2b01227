//! Transcript module for Retouche.
//!
//! JSON-backed transcript model and file I/O.

mod models;

pub use models::{Segment, Transcript};

use crate::error::Result;
use std::path::Path;
use tracing::debug;

/// Read a transcript from a JSON file.
pub fn load_transcript(path: &Path) -> Result<Transcript> {
    let content = std::fs::read_to_string(path)?;
    let transcript = Transcript::from_json_str(&content)?;
    debug!("Loaded {} segments from {}", transcript.messages.len(), path.display());
    Ok(transcript)
}

/// Write a transcript as pretty-printed JSON, creating parent directories.
pub fn save_transcript(transcript: &Transcript, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, transcript.to_json_pretty()?)?;
    debug!("Wrote {} segments to {}", transcript.messages.len(), path.display());
    Ok(())
}
