//! Structured summary returned by the pipeline.

use serde::{Deserialize, Serialize};

/// Confidence reported when the model omitted or garbled its own.
pub const DEFAULT_CONFIDENCE: &str = "50";
/// Confidence of a summary built from model output that held no usable JSON.
pub const UNPARSED_RESPONSE_CONFIDENCE: &str = "50";
/// Confidence of a summary built locally from sentence fragments.
pub const LOCAL_HEURISTIC_CONFIDENCE: &str = "30";
/// Confidence of a summary reduced to a raw text excerpt.
pub const RAW_EXCERPT_CONFIDENCE: &str = "10";

/// Normalized document summary.
///
/// Every field is always present; callers never need to check for missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    /// Short prose overview of the document.
    pub executive_summary: String,
    /// Main points, in document order.
    pub key_points: Vec<String>,
    /// Tasks the document asks someone to perform.
    pub action_items: Vec<ActionItem>,
    /// Regulatory or policy obligations mentioned in the document.
    pub compliance_items: Vec<String>,
    /// Risks called out by the document.
    pub risk_factors: Vec<String>,
    /// Suggested follow-ups.
    pub recommendations: Vec<String>,
    /// Free-form topic labels.
    pub categories: Vec<String>,
    /// Integer string in `0..=100`; signals which pipeline tier produced the summary.
    pub confidence: String,
    /// Language tag of the document, e.g. `en`.
    pub language: String,
    /// Kind of document, e.g. `report` or `memo`.
    pub document_type: String,
    /// How urgently the document needs attention.
    pub urgency_level: UrgencyLevel,
    /// Provenance of the summary; not part of the model schema.
    #[serde(rename = "_meta")]
    pub meta: SummaryMeta,
}

impl DocumentSummary {
    /// Summary with every field at its neutral default.
    pub fn empty(meta: SummaryMeta) -> Self {
        Self {
            executive_summary: String::new(),
            key_points: Vec::new(),
            action_items: Vec::new(),
            compliance_items: Vec::new(),
            risk_factors: Vec::new(),
            recommendations: Vec::new(),
            categories: Vec::new(),
            confidence: DEFAULT_CONFIDENCE.to_string(),
            language: "en".to_string(),
            document_type: "general".to_string(),
            urgency_level: UrgencyLevel::default(),
            meta,
        }
    }

    /// Confidence as a number, `0` when it does not parse.
    pub fn confidence_value(&self) -> u8 {
        self.confidence.parse().unwrap_or(0)
    }
}

/// Task extracted from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    /// What needs to be done.
    pub task: String,
    /// Relative importance.
    pub priority: Priority,
    /// Due date as written in the document; empty when none was given.
    pub deadline: String,
    /// Owning department; empty when none was given.
    pub department: String,
    /// Estimated effort in hours; `0` when unknown.
    pub estimated_hours: f64,
}

/// Action item priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Needs attention first.
    High,
    /// Default priority.
    #[default]
    Medium,
    /// Can wait.
    Low,
}

/// Document urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    /// No time pressure.
    Low,
    /// Default urgency.
    #[default]
    Medium,
    /// Should be handled soon.
    High,
    /// Needs immediate action.
    Critical,
}

impl UrgencyLevel {
    /// Lowercase label used in JSON and statistics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Rung of the degradation ladder that produced a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryTier {
    /// Parsed from the model's JSON answer.
    Model,
    /// The model answered, but without recoverable JSON.
    UnparsedResponse,
    /// Every model failed; built from the leading sentences of the text.
    LocalHeuristic,
    /// Nothing better was possible; a prefix of the text.
    RawExcerpt,
}

/// Provenance attached to every summary under `_meta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMeta {
    /// Model that produced the answer, when one did.
    pub model: Option<String>,
    /// Whether any fallback path was taken.
    pub fallback: bool,
    /// Ladder rung that produced the summary.
    pub tier: SummaryTier,
    /// Whether the model answered but its output could not be parsed.
    pub parse_failed: bool,
    /// Caller-safe description of what went wrong, if anything.
    pub error: Option<String>,
}

impl SummaryMeta {
    /// Metadata for a summary parsed from `model`'s answer.
    pub fn from_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            fallback: false,
            tier: SummaryTier::Model,
            parse_failed: false,
            error: None,
        }
    }

    /// Metadata for a fallback summary.
    pub fn fallback(tier: SummaryTier, model: Option<String>, error: Option<String>) -> Self {
        Self {
            model,
            fallback: true,
            tier,
            parse_failed: tier == SummaryTier::UnparsedResponse,
            error,
        }
    }
}
