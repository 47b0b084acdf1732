//! Resilient document summarization.
//!
//! [`SummaryAssembler`] drives the pipeline: the extracted text is wrapped in a fixed prompt,
//! [`ModelInvoker`] tries each model candidate in order over the transport chosen from the
//! credential shape, and [`parse_json`] recovers a JSON object from whatever comes back. When any
//! stage fails the assembler steps down a degradation ladder ([`SummaryTier`]) so a complete
//! [`DocumentSummary`] is always produced.

mod assembler;
mod error;
mod invoker;
mod local;
mod normalize;
mod parser;
mod prompt;
mod response;
mod transport;
mod types;

use std::sync::Arc;

pub use assembler::SummaryAssembler;
pub use error::{CandidateError, CandidateErrorKind, InvokeError};
pub use invoker::{FALLBACK_MODELS, Generation, ModelCandidates, ModelInvoker};
pub use local::EXCERPT_CHARS;
pub use parser::parse_json;
pub use prompt::build_prompt;
pub use response::extract_text as extract_response_text;
pub use transport::{
    ApiKeyTransport, GenerativeTransport, ManagedClientTransport, TransportMode, build_transport,
};
pub use types::{
    ActionItem, DocumentSummary, Priority, SummaryMeta, SummaryTier, UrgencyLevel,
};

use crate::config::Config;
use crate::extraction::TextExtractor;
use crate::metrics::PipelineMetrics;

/// Wire an assembler from configuration.
pub fn assembler_from_config(
    config: &Config,
    metrics: Arc<PipelineMetrics>,
) -> Result<SummaryAssembler, reqwest::Error> {
    let transport = build_transport(config)?;
    let candidates = Arc::new(ModelCandidates::with_primary(config.gemini_model.as_deref()));
    tracing::info!(candidates = ?candidates.as_slice(), "Model candidates configured");
    let invoker = ModelInvoker::new(candidates, transport, config.gemini_timeout);
    Ok(SummaryAssembler::new(
        TextExtractor::new(&config.libreoffice_path, config.libreoffice_timeout),
        invoker,
        metrics,
    ))
}
