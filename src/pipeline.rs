//! Pipeline for Retouche.
//!
//! Coordinates the full run: timing validation, context inference, and the
//! rule-based editor.

use crate::config::{Prompts, Settings};
use crate::context::{ContextInference, ContextInferrer, OpenAiContextInferrer};
use crate::editor::{edit_transcript, EditorConfig, TransformationReport};
use crate::error::{Result, RetoucheError};
use crate::qa::{check_transcript, QaReport, QaThresholds};
use crate::transcript::{load_transcript, save_transcript, Transcript};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main pipeline: QA, then context inference, then editing.
pub struct Pipeline {
    qa_thresholds: QaThresholds,
    editor_config: EditorConfig,
    inferrer: Arc<dyn ContextInferrer>,
}

impl Pipeline {
    /// Create a pipeline backed by the OpenAI context inferrer.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        info!("Using context model {}", settings.context.model);
        let inferrer: Arc<dyn ContextInferrer> =
            Arc::new(OpenAiContextInferrer::with_config(&settings.context, prompts)?);

        Ok(Self::with_components(settings, inferrer))
    }

    /// Create a pipeline with a custom context inferrer.
    pub fn with_components(settings: &Settings, inferrer: Arc<dyn ContextInferrer>) -> Self {
        Self {
            qa_thresholds: settings.qa.thresholds(),
            editor_config: settings.editor.editor_config(),
            inferrer,
        }
    }

    pub fn qa_thresholds(&self) -> &QaThresholds {
        &self.qa_thresholds
    }

    pub fn editor_config(&self) -> &EditorConfig {
        &self.editor_config
    }

    /// Run the three stages over an in-memory transcript.
    ///
    /// The QA report is stored under `qa_report` before anything else; a
    /// failing report aborts the run with [`RetoucheError::QaFailed`].
    #[instrument(skip_all, fields(segments = transcript.messages.len()))]
    pub async fn process(&self, mut transcript: Transcript) -> Result<PipelineOutcome> {
        info!("Running timing checks...");
        let qa_report = check_transcript(&transcript, &self.qa_thresholds);
        transcript.set("qa_report", qa_report.to_value()?);

        if !qa_report.ok {
            return Err(RetoucheError::QaFailed(qa_report.errors.join("; ")));
        }
        for warning in &qa_report.warnings {
            warn!("QA: {}", warning);
        }

        info!("Inferring context...");
        let ContextInference {
            context_inferred,
            context_report,
        } = self.inferrer.infer(&transcript).await?;
        transcript.set("context_inferred", serde_json::to_value(&context_inferred)?);
        transcript.set("context_report", serde_json::to_value(&context_report)?);

        info!("Editing transcript...");
        let outcome = edit_transcript(&transcript, &self.editor_config);

        Ok(PipelineOutcome {
            transcript: outcome.transcript,
            warnings: qa_report.warnings.clone(),
            qa_report,
            edit_report: outcome.report,
        })
    }

    /// Read a transcript file, process it, and write the result as pretty JSON.
    #[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
    pub async fn process_file(&self, input: &Path, output: &Path) -> Result<PipelineOutcome> {
        let transcript = load_transcript(input)?;
        let outcome = self.process(transcript).await?;
        save_transcript(&outcome.transcript, output)?;
        info!("Wrote {}", output.display());
        Ok(outcome)
    }
}

/// Result of a full pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The edited transcript with `qa_report`, `context_inferred`,
    /// `context_report` and `transformation_report` attached.
    pub transcript: Transcript,
    /// Timing validator report.
    pub qa_report: QaReport,
    /// Editor report.
    pub edit_report: TransformationReport,
    /// QA warnings, surfaced to the caller.
    pub warnings: Vec<String>,
}

impl PipelineOutcome {
    /// The context report attached during the run, if any.
    pub fn context_report(&self) -> Option<&Value> {
        self.transcript.get("context_report")
    }
}
