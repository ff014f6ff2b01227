//! Configuration settings for Retouche.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::editor::EditorConfig;
use crate::qa::QaThresholds;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub context: ContextSettings,
    pub qa: QaSettings,
    pub editor: EditorSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// LLM context inference settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    /// Chat model used to extract domain, roles, glossary and language errors.
    pub model: String,
    /// Language of the transcripts, injected into the prompt.
    pub language: String,
    /// Sampling temperature for the extraction call.
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Request a strict JSON schema response. Turn off for endpoints that
    /// only support plain JSON mode.
    pub structured_output: bool,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            language: "French".to_string(),
            temperature: 0.0,
            timeout_seconds: crate::openai::DEFAULT_TIMEOUT_SECS,
            structured_output: true,
        }
    }
}

/// Timing validator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaSettings {
    /// Silence between consecutive segments flagged as a possible omission.
    pub gap_threshold_seconds: f64,
    /// Segment duration flagged as unusually long.
    pub long_segment_threshold_seconds: f64,
    /// Sort valid segments chronologically before timeline checks.
    pub sort_for_analysis: bool,
}

impl Default for QaSettings {
    fn default() -> Self {
        let thresholds = QaThresholds::default();
        Self {
            gap_threshold_seconds: thresholds.gap_threshold_s,
            long_segment_threshold_seconds: thresholds.long_segment_threshold_s,
            sort_for_analysis: thresholds.sort_for_analysis,
        }
    }
}

impl QaSettings {
    pub fn thresholds(&self) -> QaThresholds {
        QaThresholds {
            gap_threshold_s: self.gap_threshold_seconds,
            long_segment_threshold_s: self.long_segment_threshold_seconds,
            sort_for_analysis: self.sort_for_analysis,
        }
    }
}

/// Confidence gates for the rule-based editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Minimum confidence for a glossary entry to feed the alias map.
    pub glossary_min_confidence: f64,
    /// Minimum confidence for a language error to be corrected.
    pub error_min_confidence: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        let config = EditorConfig::default();
        Self {
            glossary_min_confidence: config.glossary_min_confidence,
            error_min_confidence: config.error_min_confidence,
        }
    }
}

impl EditorSettings {
    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            glossary_min_confidence: self.glossary_min_confidence,
            error_min_confidence: self.error_min_confidence,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::RetoucheError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("retouche")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}
