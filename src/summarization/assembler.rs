use std::sync::Arc;

use super::invoker::ModelInvoker;
use super::local::{self, NO_TEXT_MARKER};
use super::normalize::summary_from_model;
use super::parser::parse_json;
use super::prompt::build_prompt;
use super::types::DocumentSummary;
use crate::extraction::{ExtractionError, FormatTag, TextExtractor};
use crate::metrics::PipelineMetrics;

/// Runs the full pipeline: extraction, prompt, model fallback, parsing, and degradation.
#[derive(Clone)]
pub struct SummaryAssembler {
    extractor: TextExtractor,
    invoker: ModelInvoker,
    metrics: Arc<PipelineMetrics>,
}

impl SummaryAssembler {
    /// Create an assembler from its collaborators.
    pub fn new(
        extractor: TextExtractor,
        invoker: ModelInvoker,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            extractor,
            invoker,
            metrics,
        }
    }

    /// Extractor used by [`summarize_file`](Self::summarize_file).
    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    /// Counters updated by every summary.
    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Summarize already-extracted text. Always returns a complete summary.
    ///
    /// Degrades from the model's parsed answer, to its unparsed output, to the leading sentences
    /// of `text`, to a raw prefix of `text`. Blank text skips the model entirely.
    pub async fn summarize_text(&self, text: &str) -> DocumentSummary {
        let summary = if text.trim().is_empty() {
            tracing::warn!("No extractable text; skipping model invocation");
            local::raw_excerpt(text, NO_TEXT_MARKER)
        } else {
            self.summarize_with_model(text).await
        };

        self.metrics.record_summary(summary.meta.tier);
        tracing::info!(
            tier = ?summary.meta.tier,
            model = summary.meta.model.as_deref().unwrap_or("none"),
            confidence = %summary.confidence,
            "Summary assembled"
        );
        summary
    }

    /// Extract text from `content` and summarize it.
    ///
    /// Extraction errors are returned, not degraded: there is no text to fall back on.
    pub async fn summarize_file(
        &self,
        content: Vec<u8>,
        format: FormatTag,
    ) -> Result<DocumentSummary, ExtractionError> {
        let text = match self.extractor.extract(content, format).await {
            Ok(text) => text,
            Err(error) => {
                self.metrics.record_extraction_failure();
                tracing::error!(format = %format, error = %error, "Text extraction failed");
                return Err(error);
            }
        };
        Ok(self.summarize_text(&text).await)
    }

    async fn summarize_with_model(&self, text: &str) -> DocumentSummary {
        let prompt = build_prompt(text);
        match self.invoker.invoke(&prompt).await {
            Ok(generation) => match parse_json(&generation.text) {
                Some(object) => summary_from_model(&object, &generation.model),
                None => {
                    tracing::warn!(
                        model = %generation.model,
                        "Model output held no JSON object; using raw output"
                    );
                    local::unparsed_response(&generation.text, &generation.model)
                }
            },
            Err(error) => {
                tracing::warn!(error = %error, "Generative service exhausted; summarizing locally");
                local::local_summary(text, &error)
            }
        }
    }
}
