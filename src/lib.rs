//! Retouche - auditable transcript post-editing
//!
//! A CLI tool and library that post-edits speech-to-text transcripts without
//! ever touching their timing or speaker attribution.
//!
//! # Overview
//!
//! Retouche:
//! - validates segment shape and timeline coherence (overlaps, gaps, long segments)
//! - asks an LLM for domain context: glossary terms and language errors, each
//!   with a confidence and evidence quotes checked against the transcript
//! - applies a small whitelist of fixes gated by those confidences, and
//!   records every change with before/after snapshots
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `transcript` - JSON-backed transcript model and file I/O
//! - `qa` - Timing validator
//! - `context` - Context extraction (LLM) and the editor's context payload
//! - `editor` - Mapping builder, rewrite passes and transformation report
//! - `pipeline` - Stage coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use retouche::config::Settings;
//! use retouche::pipeline::Pipeline;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(&settings)?;
//!
//!     let outcome = pipeline
//!         .process_file(Path::new("call.json"), Path::new("call.edited.json"))
//!         .await?;
//!     println!("{} segments modified", outcome.edit_report.segments_modified);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod editor;
pub mod error;
pub mod openai;
pub mod pipeline;
pub mod qa;
pub mod transcript;

pub use error::{Result, RetoucheError};
