use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{ExtractionError, FormatTag};

/// Extract raw paragraph text from `.docx` bytes, discarding formatting.
pub(super) fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    docx_lite::extract_text_from_bytes(bytes)
        .map_err(|error| ExtractionError::failed(FormatTag::Word, error.to_string()))
}

/// Convert a Word 97-2003 document to `.docx` with headless LibreOffice.
pub(super) async fn convert_legacy_document(
    bytes: &[u8],
    binary: &Path,
    timeout: Duration,
) -> Result<Vec<u8>, ExtractionError> {
    let fail = |message: String| ExtractionError::failed(FormatTag::LegacyWord, message);

    let scratch = tempfile::tempdir().map_err(|error| fail(format!("scratch directory: {error}")))?;
    let input_path = scratch.path().join("input.doc");
    tokio::fs::write(&input_path, bytes)
        .await
        .map_err(|error| fail(format!("failed to stage document: {error}")))?;

    let child = Command::new(binary)
        .arg("--headless")
        .arg("--convert-to")
        .arg("docx")
        .arg("--outdir")
        .arg(scratch.path())
        .arg(&input_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|error| {
            if error.kind() == std::io::ErrorKind::NotFound {
                fail(format!(
                    "LibreOffice is required for .doc files but '{}' was not found; set LIBREOFFICE_PATH",
                    binary.display()
                ))
            } else {
                fail(format!("failed to launch LibreOffice: {error}"))
            }
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            fail(format!(
                "LibreOffice conversion timed out after {} seconds",
                timeout.as_secs()
            ))
        })?
        .map_err(|error| fail(format!("failed to wait for LibreOffice: {error}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(fail(format!(
            "LibreOffice exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let converted = tokio::fs::read(scratch.path().join("input.docx"))
        .await
        .map_err(|error| fail(format!("converted document missing: {error}")))?;
    if converted.is_empty() {
        return Err(fail("LibreOffice produced an empty document".into()));
    }

    tracing::debug!(
        input_bytes = bytes.len(),
        output_bytes = converted.len(),
        "Converted legacy Word document"
    );
    Ok(converted)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};
    use zip::write::{SimpleFileOptions, ZipWriter};

    /// Build a minimal `.docx` package with one paragraph per entry.
    pub(crate) fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|text| format!("<w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>"))
            .collect();
        let document = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
<w:body>{body}</w:body></w:document>"
        );

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let entries = [
            (
                "[Content_Types].xml",
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
</Types>"
                    .to_string(),
            ),
            (
                "_rels/.rels",
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
</Relationships>"
                    .to_string(),
            ),
            ("word/document.xml", document),
        ];
        for (name, content) in entries {
            writer.start_file(name, options).expect("zip entry");
            writer.write_all(content.as_bytes()).expect("zip write");
        }
        writer.finish().expect("zip finish").into_inner()
    }
}
