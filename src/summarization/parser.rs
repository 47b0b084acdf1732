//! Best-effort recovery of a JSON object from free-form model output.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```\s*json[ \t]*\r?\n?(.*?)```").expect("fenced json pattern is valid")
});

static BRACED_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("braced span pattern is valid"));

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("trailing comma pattern is valid"));

/// Recover a JSON object from `raw`, or `None` when nothing parses.
///
/// Strategies, each tried only when the previous one yields nothing:
/// 1. the contents of a fenced block labelled `json`;
/// 2. the span from the first `{` to the last `}`, then the same span with trailing commas
///    removed;
/// 3. the whole trimmed text.
///
/// Values that parse but are not objects are ignored.
pub fn parse_json(raw: &str) -> Option<Map<String, Value>> {
    if let Some(captures) = FENCED_JSON.captures(raw)
        && let Some(object) = parse_object(captures[1].trim())
    {
        return Some(object);
    }

    if let Some(span) = BRACED_SPAN.find(raw) {
        let candidate = span.as_str();
        if let Some(object) = parse_object(candidate) {
            return Some(object);
        }
        let repaired = TRAILING_COMMA.replace_all(candidate, "$1");
        if let Some(object) = parse_object(&repaired) {
            tracing::debug!("Recovered model JSON after removing trailing commas");
            return Some(object);
        }
    }

    parse_object(raw.trim())
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}
