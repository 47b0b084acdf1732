//! Prompt template for structured document summaries.

const INSTRUCTIONS: &str = "System: You are a document analyst for a public transport operator. \
Read the document below and respond with a single JSON object and nothing else. Do not wrap \
the object in prose. Use exactly these keys:\n";

const SCHEMA: &str = r#"{
  "executiveSummary": "two to four sentence overview of the document",
  "keyPoints": ["main point", "..."],
  "actionItems": [
    {
      "task": "what needs to be done",
      "priority": "high | medium | low",
      "deadline": "due date as written, or empty string",
      "department": "owning department, or empty string",
      "estimatedHours": 0
    }
  ],
  "complianceItems": ["regulatory or policy obligation", "..."],
  "riskFactors": ["risk called out by the document", "..."],
  "recommendations": ["suggested follow-up", "..."],
  "categories": ["topic label", "..."],
  "confidence": "integer from 0 to 100 describing how well the document supports this summary",
  "language": "ISO 639-1 language code of the document",
  "documentType": "report | memo | policy | contract | invoice | schedule | general",
  "urgencyLevel": "low | medium | high | critical"
}"#;

/// Embed `text` in the fixed summary instruction template.
///
/// The text is inserted verbatim after the schema. The result depends on nothing but `text`.
pub fn build_prompt(text: &str) -> String {
    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + SCHEMA.len() + text.len() + 64);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str(SCHEMA);
    prompt.push_str("\n\nUse empty strings or empty lists when the document says nothing about a key.\n\n");
    prompt.push_str("Document:\n");
    prompt.push_str(text);
    prompt
}
