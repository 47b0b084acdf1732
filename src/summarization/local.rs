//! Summaries built without the generative service.

use regex::Regex;
use std::sync::LazyLock;

use super::error::InvokeError;
use super::types::{
    DocumentSummary, LOCAL_HEURISTIC_CONFIDENCE, RAW_EXCERPT_CONFIDENCE, SummaryMeta, SummaryTier,
    UNPARSED_RESPONSE_CONFIDENCE,
};

/// Maximum characters kept by excerpt-based summaries.
pub const EXCERPT_CHARS: usize = 300;
const SUMMARY_SENTENCES: usize = 3;
const KEY_POINT_SENTENCES: usize = 5;

/// Marker recorded when the pipeline had no text to work with.
pub const NO_TEXT_MARKER: &str = "no extractable text";
/// Marker recorded when the sentence heuristic found nothing to keep.
pub const NO_SENTENCES_MARKER: &str = "no sentences found for local summary";

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+(?:[.!?]+|$)").expect("sentence pattern is valid"));

/// The model answered, but nothing in its output parsed as JSON.
pub fn unparsed_response(raw: &str, model: &str) -> DocumentSummary {
    let mut summary = DocumentSummary::empty(SummaryMeta::fallback(
        SummaryTier::UnparsedResponse,
        Some(model.to_string()),
        Some("model output was not valid JSON".to_string()),
    ));
    summary.executive_summary = truncate_chars(raw, EXCERPT_CHARS);
    summary.confidence = UNPARSED_RESPONSE_CONFIDENCE.to_string();
    summary
}

/// Every model failed: summarize from the leading sentences of `text`.
///
/// Falls through to [`raw_excerpt`] when no fragment of `text` holds a letter or digit.
pub fn local_summary(text: &str, error: &InvokeError) -> DocumentSummary {
    let fragments = sentence_fragments(text, KEY_POINT_SENTENCES);
    if fragments.is_empty() {
        tracing::warn!("Local heuristic found no sentences; returning raw excerpt");
        return raw_excerpt(text, NO_SENTENCES_MARKER);
    }

    let mut summary = DocumentSummary::empty(SummaryMeta::fallback(
        SummaryTier::LocalHeuristic,
        None,
        Some(format!(
            "generative service unavailable ({})",
            error.last_kind()
        )),
    ));
    summary.executive_summary = fragments
        .iter()
        .take(SUMMARY_SENTENCES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    summary.key_points = fragments;
    summary.confidence = LOCAL_HEURISTIC_CONFIDENCE.to_string();
    summary
}

/// Last resort: the first [`EXCERPT_CHARS`] characters of `text`.
pub fn raw_excerpt(text: &str, marker: &str) -> DocumentSummary {
    let mut summary = DocumentSummary::empty(SummaryMeta::fallback(
        SummaryTier::RawExcerpt,
        None,
        Some(marker.to_string()),
    ));
    summary.executive_summary = truncate_chars(text, EXCERPT_CHARS);
    summary.confidence = RAW_EXCERPT_CONFIDENCE.to_string();
    summary
}

/// Up to `limit` sentence fragments, whitespace collapsed, terminal punctuation kept.
///
/// Trailing text without terminal punctuation forms the last fragment.
pub(crate) fn sentence_fragments(text: &str, limit: usize) -> Vec<String> {
    SENTENCE
        .find_iter(text)
        .map(|fragment| collapse_whitespace(fragment.as_str()))
        .filter(|fragment| fragment.chars().any(char::is_alphanumeric))
        .take(limit)
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Prefix of `text` holding at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
