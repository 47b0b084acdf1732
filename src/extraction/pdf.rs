use super::{ExtractionError, FormatTag};

/// Extract the text layer of every page, in page order.
///
/// Pages whose content streams cannot be decoded contribute nothing; only a document that fails
/// to load at all is an error.
pub(super) fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|error| ExtractionError::failed(FormatTag::Pdf, error.to_string()))?;

    let pages = document.get_pages();
    let mut text = String::new();
    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                if !page_text.is_empty() && !page_text.ends_with('\n') {
                    text.push('\n');
                }
            }
            Err(error) => {
                tracing::debug!(page = page_number, error = %error, "Skipping unreadable PDF page");
            }
        }
    }

    tracing::debug!(pages = pages.len(), chars = text.len(), "Extracted PDF text");
    Ok(text)
}
