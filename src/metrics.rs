use std::sync::atomic::{AtomicU64, Ordering};

use crate::summarization::SummaryTier;

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct PipelineMetrics {
    model_summaries: AtomicU64,
    unparsed_responses: AtomicU64,
    local_summaries: AtomicU64,
    raw_excerpts: AtomicU64,
    extraction_failures: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a summary produced by the given tier of the degradation ladder.
    pub fn record_summary(&self, tier: SummaryTier) {
        let counter = match tier {
            SummaryTier::Model => &self.model_summaries,
            SummaryTier::UnparsedResponse => &self.unparsed_responses,
            SummaryTier::LocalHeuristic => &self.local_summaries,
            SummaryTier::RawExcerpt => &self.raw_excerpts,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a document whose text could not be extracted.
    pub fn record_extraction_failure(&self) {
        self.extraction_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let model_summaries = self.model_summaries.load(Ordering::Relaxed);
        let unparsed_responses = self.unparsed_responses.load(Ordering::Relaxed);
        let local_summaries = self.local_summaries.load(Ordering::Relaxed);
        let raw_excerpts = self.raw_excerpts.load(Ordering::Relaxed);
        MetricsSnapshot {
            summaries_total: model_summaries + unparsed_responses + local_summaries + raw_excerpts,
            model_summaries,
            unparsed_responses,
            local_summaries,
            raw_excerpts,
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Summaries returned since startup, across every tier.
    pub summaries_total: u64,
    /// Summaries parsed from model output.
    pub model_summaries: u64,
    /// Summaries built from model output that held no usable JSON.
    pub unparsed_responses: u64,
    /// Summaries built locally after every model failed.
    pub local_summaries: u64,
    /// Summaries reduced to a raw text excerpt.
    pub raw_excerpts: u64,
    /// Documents rejected because extraction failed.
    pub extraction_failures: u64,
}
