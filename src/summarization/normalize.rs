//! Coercion of recovered model JSON into a complete [`DocumentSummary`].
//!
//! Models drift from the requested schema in small ways: snake_case keys, a bare string where a
//! list was asked for, a numeric confidence, an unknown urgency label. Every such deviation is
//! mapped onto the schema instead of being rejected.

use serde_json::{Map, Value};

use super::types::{
    ActionItem, DEFAULT_CONFIDENCE, DocumentSummary, Priority, SummaryMeta, UrgencyLevel,
};

/// Build a summary from the JSON object `model` produced.
pub fn summary_from_model(object: &Map<String, Value>, model: &str) -> DocumentSummary {
    let mut summary = DocumentSummary::empty(SummaryMeta::from_model(model));

    if let Some(text) = text_field(object, &["executiveSummary", "executive_summary", "summary"]) {
        summary.executive_summary = text;
    }
    summary.key_points = list_field(object, &["keyPoints", "key_points"]);
    summary.action_items = lookup(object, &["actionItems", "action_items"])
        .map(action_items)
        .unwrap_or_default();
    summary.compliance_items = list_field(object, &["complianceItems", "compliance_items"]);
    summary.risk_factors = list_field(object, &["riskFactors", "risk_factors"]);
    summary.recommendations = list_field(object, &["recommendations"]);
    summary.categories = list_field(object, &["categories"]);
    summary.confidence = lookup(object, &["confidence"])
        .and_then(confidence)
        .unwrap_or_else(|| DEFAULT_CONFIDENCE.to_string());
    if let Some(language) = text_field(object, &["language"]) {
        summary.language = language;
    }
    if let Some(document_type) = text_field(object, &["documentType", "document_type"]) {
        summary.document_type = document_type;
    }
    summary.urgency_level = text_field(object, &["urgencyLevel", "urgency_level", "urgency"])
        .map(|label| urgency(&label))
        .unwrap_or_default();

    summary
}

fn lookup<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| object.get(*key))
        .filter(|value| !value.is_null())
}

fn text_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    lookup(object, keys).and_then(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn list_field(object: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    match lookup(object, keys) {
        Some(Value::Array(items)) => items.iter().filter_map(item_text).collect(),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn item_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(fields) => ["text", "description", "title", "name"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(scalar_text)),
        other => scalar_text(other),
    }
}

fn action_items(value: &Value) -> Vec<ActionItem> {
    let entries: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    entries.into_iter().filter_map(action_item).collect()
}

fn action_item(value: &Value) -> Option<ActionItem> {
    match value {
        Value::Object(fields) => {
            let task = text_field(fields, &["task", "description", "action"])?;
            Some(ActionItem {
                task,
                priority: text_field(fields, &["priority"])
                    .map(|label| priority(&label))
                    .unwrap_or_default(),
                deadline: text_field(fields, &["deadline", "dueDate", "due_date"])
                    .unwrap_or_default(),
                department: text_field(fields, &["department", "owner"]).unwrap_or_default(),
                estimated_hours: lookup(fields, &["estimatedHours", "estimated_hours"])
                    .and_then(hours)
                    .unwrap_or(0.0),
            })
        }
        other => scalar_text(other).map(|task| ActionItem {
            task,
            priority: Priority::default(),
            deadline: String::new(),
            department: String::new(),
            estimated_hours: 0.0,
        }),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn hours(value: &Value) -> Option<f64> {
    number(value).filter(|hours| hours.is_finite() && *hours >= 0.0)
}

fn confidence(value: &Value) -> Option<String> {
    let raw = number(value).filter(|score| score.is_finite())?;
    // Scores in 0..=1 are fractions.
    let percent = if raw > 0.0 && raw <= 1.0 && raw.fract() != 0.0 {
        raw * 100.0
    } else {
        raw
    };
    Some((percent.round().clamp(0.0, 100.0) as u8).to_string())
}

fn priority(label: &str) -> Priority {
    match label.trim().to_ascii_lowercase().as_str() {
        "high" | "critical" | "urgent" => Priority::High,
        "low" => Priority::Low,
        _ => Priority::Medium,
    }
}

fn urgency(label: &str) -> UrgencyLevel {
    match label.trim().to_ascii_lowercase().as_str() {
        "low" => UrgencyLevel::Low,
        "high" => UrgencyLevel::High,
        "critical" => UrgencyLevel::Critical,
        _ => UrgencyLevel::Medium,
    }
}
