//! Context inference through an OpenAI-compatible chat endpoint.

use super::{extraction_schema, ContextExtraction, ContextInference, EXTRACTION_SCHEMA_NAME};
use crate::config::{ContextSettings, Prompts};
use crate::error::{Result, RetoucheError};
use crate::openai::create_client_with_timeout;
use crate::transcript::Transcript;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    ResponseFormatJsonSchema,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Trait for context inference services.
#[async_trait]
pub trait ContextInferrer: Send + Sync {
    /// Propose domain, roles, glossary and language errors for a transcript.
    async fn infer(&self, transcript: &Transcript) -> Result<ContextInference>;
}

/// LLM-backed context inferrer.
pub struct OpenAiContextInferrer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    language: String,
    temperature: f32,
    structured_output: bool,
    prompts: Prompts,
}

impl OpenAiContextInferrer {
    /// Create from settings and (possibly customized) prompts.
    pub fn with_config(settings: &ContextSettings, prompts: Prompts) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_seconds))?,
            model: settings.model.clone(),
            language: settings.language.clone(),
            temperature: settings.temperature,
            structured_output: settings.structured_output,
            prompts,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Strict schema when structured output is on, plain JSON mode otherwise.
    ///
    /// The response is parsed leniently either way.
    fn response_format(&self) -> ResponseFormat {
        if !self.structured_output {
            return ResponseFormat::JsonObject;
        }
        ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                name: EXTRACTION_SCHEMA_NAME.to_string(),
                description: Some(
                    "Domain, speaker roles, glossary candidates and language errors, with evidence quotes"
                        .to_string(),
                ),
                schema: Some(extraction_schema()),
                strict: Some(true),
            },
        }
    }

    fn build_messages(&self, transcript: &Transcript, text: &str) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut vars = HashMap::new();
        vars.insert("language".to_string(), self.language.clone());
        vars.insert("speakers".to_string(), format!("{:?}", transcript.speakers()));
        vars.insert("transcript".to_string(), text.to_string());

        let system_message = self.prompts.render_with_custom(&self.prompts.context.system, &vars);
        let user_message = self.prompts.render_with_custom(&self.prompts.context.user, &vars);

        Ok(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_message)
                .build()
                .map_err(|e| RetoucheError::ContextInference(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
                .map_err(|e| RetoucheError::ContextInference(e.to_string()))?
                .into(),
        ])
    }

    /// Parse the model response, tolerating prose or code fences around the JSON object.
    pub(crate) fn parse_extraction(response: &str) -> Result<ContextExtraction> {
        let json_start = response.find('{');
        let json_end = response.rfind('}');

        let json_str = match (json_start, json_end) {
            (Some(start), Some(end)) if end > start => &response[start..=end],
            _ => response,
        };

        let mut extraction: ContextExtraction = serde_json::from_str(json_str).map_err(|e| {
            let preview: String = response.chars().take(500).collect();
            RetoucheError::ContextInference(format!(
                "Failed to parse extraction response: {}. Response was: {}",
                e, preview
            ))
        })?;
        extraction.clamp_confidences();
        Ok(extraction)
    }
}

#[async_trait]
impl ContextInferrer for OpenAiContextInferrer {
    #[instrument(skip(self, transcript), fields(model = %self.model, segments = transcript.messages.len()))]
    async fn infer(&self, transcript: &Transcript) -> Result<ContextInference> {
        let text = transcript.full_text();
        info!("Inferring context for {} segments", transcript.messages.len());

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.build_messages(transcript, &text)?)
            .temperature(self.temperature)
            .response_format(self.response_format())
            .build()
            .map_err(|e| RetoucheError::ContextInference(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| RetoucheError::OpenAI(format!("Context extraction error: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| RetoucheError::ContextInference("Empty response from LLM".to_string()))?;

        debug!("Context extraction response: {}", content.chars().take(500).collect::<String>());

        let extraction = Self::parse_extraction(content)?;
        let inference = ContextInference::from_extraction(&extraction, &text, &self.model);

        if let Some(warning) = &inference.context_report.warning {
            warn!(
                "{} ({} missing quotes)",
                warning,
                inference.context_report.evidence_validation.missing_quotes.len()
            );
        }
        info!(
            "Context: domain={}, {} glossary entries, {} language errors",
            inference.context_inferred.domain,
            inference.context_inferred.glossary.len(),
            inference.context_inferred.language_errors.len()
        );

        Ok(inference)
    }
}
