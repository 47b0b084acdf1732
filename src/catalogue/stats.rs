use serde::Serialize;
use std::collections::BTreeMap;

use super::{DocumentRecord, DocumentStatus};

/// Aggregate view of the catalogue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageStats {
    /// Documents in the catalogue.
    pub total_documents: usize,
    /// Document count per status label.
    pub by_status: BTreeMap<String, usize>,
    /// Processed document count per lowercased category.
    pub by_category: BTreeMap<String, usize>,
    /// Processed document count per urgency label.
    pub by_urgency: BTreeMap<String, usize>,
    /// Mean confidence across processed documents, `0.0` when there are none.
    pub average_confidence: f64,
    /// Processed documents whose summary came from a fallback tier.
    pub fallback_summaries: usize,
}

/// Aggregate `records` into [`UsageStats`].
pub fn compute_usage_stats(records: &[DocumentRecord]) -> UsageStats {
    let mut stats = UsageStats {
        total_documents: records.len(),
        ..UsageStats::default()
    };
    for status in [
        DocumentStatus::Processing,
        DocumentStatus::Processed,
        DocumentStatus::Failed,
    ] {
        stats.by_status.insert(status.as_str().to_string(), 0);
    }

    let mut confidence_sum = 0u64;
    let mut summarized = 0u64;

    for record in records {
        *stats
            .by_status
            .entry(record.status.as_str().to_string())
            .or_default() += 1;

        let Some(summary) = record.summary.as_ref() else {
            continue;
        };
        summarized += 1;
        confidence_sum += u64::from(summary.confidence_value());
        if summary.meta.fallback {
            stats.fallback_summaries += 1;
        }
        *stats
            .by_urgency
            .entry(summary.urgency_level.as_str().to_string())
            .or_default() += 1;
        for category in &summary.categories {
            *stats.by_category.entry(category.to_lowercase()).or_default() += 1;
        }
    }

    if summarized > 0 {
        stats.average_confidence = confidence_sum as f64 / summarized as f64;
    }
    stats
}
