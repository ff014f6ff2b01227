//! Prompt templates for Retouche.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// Prompts for context extraction (domain, roles, glossary, language errors).
    pub context: ContextPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for LLM context extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextPrompts {
    pub system: String,
    pub user: String,
}

impl Default for ContextPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a strict information extractor for call transcripts written in {{language}}.

Rules:
- Do NOT invent facts.
- Do NOT paraphrase or rewrite the transcript.
- Your output MUST be a single JSON object following the requested schema.
- Every hypothesis MUST include 1 to 3 evidence quotes that are EXACT substrings of the transcript.
- When unsure, lower the confidence and leave the evidence quotes empty.
- For language errors, report ONLY clear errors, never colloquialisms or natural spoken structures."#
                .to_string(),

            user: r#"Speakers: {{speakers}}

Transcript (verbatim):
{{transcript}}

Tasks:
1) Guess the domain among: sales, support, recruiting, healthcare, other.
2) Guess the role of each speaker (agent, client, interviewer, candidate, other) when possible.
3) Extract glossary candidates: proper nouns, acronyms, product and tool names. List aliases only if they appear in the transcript.
4) Detect {{language}} language errors: spelling, grammar, conjugation, agreement, missing accents or apostrophes.

Do NOT report:
- Colloquial expressions
- Incomplete sentences (natural in speech)
- Informal or regional expressions
- Normal hesitations of spoken language

Important:
- evidence_quotes must be EXACT substrings of the transcript
- for language_errors, evidence_quote must contain the full sentence with the error
- incorrect_text must be the exact incorrect word or phrase
- only report errors you are sure about (confidence >= 0.7)

Return JSON with this shape:
{
  "domain_guess": {"label": "support", "confidence": 0.8, "evidence_quotes": ["..."]},
  "participants_guess": [{"mapped_from_speaker": "speaker_0", "role": "agent", "confidence": 0.9, "evidence_quotes": ["..."]}],
  "glossary_candidates": [{"term": "...", "aliases_found": ["..."], "confidence": 0.8, "evidence_quotes": ["..."]}],
  "language_errors": [{"error_type": "spelling", "incorrect_text": "...", "correct_form": "...", "explanation": "...", "confidence": 0.9, "evidence_quote": "..."}],
  "constraints": ["no_invention", "no_paraphrase", "preserve_timestamps"]
}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let context_path = custom_path.join("context.toml");
            if context_path.exists() {
                let content = std::fs::read_to_string(&context_path)?;
                prompts.context = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
