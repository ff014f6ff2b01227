//! Configuration module for Retouche.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ContextPrompts, Prompts};
pub use settings::{
    ContextSettings, EditorSettings, GeneralSettings, PromptSettings, QaSettings, Settings,
};
