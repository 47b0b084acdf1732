//! Text extraction from loosely typed `generateContent` responses.
//!
//! The direct endpoint returns `candidates` at the top level while managed clients wrap the same
//! payload in a `response` envelope or flatten it to `text`. Shapes are tried in order and the
//! first match wins; a body matching none of them is returned stringified so the parser still
//! gets a chance at it.

use serde_json::Value;

type Projector = fn(&Value) -> Option<String>;

const SHAPES: [(&str, Projector); 4] = [
    ("candidates", candidate_text),
    ("response.candidates", enveloped_candidate_text),
    ("response.text", enveloped_text),
    ("text", top_level_text),
];

/// Pull the generated text out of a response body. Never fails.
pub fn extract_text(body: &Value) -> String {
    if let Value::String(text) = body {
        return text.clone();
    }

    for (shape, project) in SHAPES {
        if let Some(text) = project(body) {
            tracing::trace!(shape, "Matched response shape");
            return text;
        }
    }

    tracing::debug!("Response matched no known shape; using serialized body");
    body.to_string()
}

fn candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    }
}

fn enveloped_candidate_text(body: &Value) -> Option<String> {
    candidate_text(body.get("response")?)
}

fn enveloped_text(body: &Value) -> Option<String> {
    top_level_text(body.get("response")?)
}

fn top_level_text(body: &Value) -> Option<String> {
    body.get("text").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn direct_candidates_parts_are_joined() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}
            }]
        });
        assert_eq!(extract_text(&body), "{\"a\":1}");
    }

    #[test]
    fn managed_envelopes_are_unwrapped() {
        let enveloped = json!({
            "response": {"candidates": [{"content": {"parts": [{"text": "wrapped"}]}}]}
        });
        assert_eq!(extract_text(&enveloped), "wrapped");

        let flattened = json!({"response": {"text": "flat"}});
        assert_eq!(extract_text(&flattened), "flat");

        assert_eq!(extract_text(&json!({"text": "top"})), "top");
    }

    #[test]
    fn earlier_shapes_win() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "first"}]}}],
            "text": "second"
        });
        assert_eq!(extract_text(&body), "first");
    }

    #[test]
    fn unknown_shapes_are_stringified() {
        let body = json!({"promptFeedback": {"blockReason": "OTHER"}});
        assert_eq!(extract_text(&body), body.to_string());
        assert_eq!(extract_text(&json!({"candidates": []})), "{\"candidates\":[]}");
    }

    #[test]
    fn plain_string_bodies_pass_through() {
        assert_eq!(extract_text(&json!("raw words")), "raw words");
    }
}
