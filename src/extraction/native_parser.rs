//! Pure-Rust text extraction for uploaded case documents.
//!
//! Supports PDFs with a text layer (via `pdf-extract`) and UTF-8 text files.
//! Scanned or image-only PDFs are rejected: there is no OCR path.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::core::errors::{AppError, AppResult};
use crate::core::types::{Document, DocumentKind, ExtractedText};
use crate::extraction::normalize::normalize_text;

const PDF_MAGIC: &[u8] = b"%PDF-";

pub fn detect_kind(document: &Document) -> AppResult<DocumentKind> {
    let mime = document.mime.trim().to_ascii_lowercase();
    let ext = Path::new(&document.name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    // Text submitted through the JSON endpoint keeps its original file name,
    // so an explicit text mime outranks a `.pdf` extension.
    if document.bytes.starts_with(PDF_MAGIC) {
        Ok(DocumentKind::Pdf)
    } else if mime.starts_with("text/") {
        Ok(DocumentKind::Text)
    } else if ext == "pdf" || mime.contains("pdf") {
        Ok(DocumentKind::Pdf)
    } else if matches!(ext.as_str(), "txt" | "text" | "md" | "markdown") {
        Ok(DocumentKind::Text)
    } else {
        Err(AppError::Extraction(format!(
            "unsupported document type for {} (expected PDF or plain text)",
            document.name
        )))
    }
}

/// Extracts and normalizes the text of one document. `max_chars` bounds the
/// text handed to the model.
pub fn extract(document: &Document, max_chars: usize) -> AppResult<ExtractedText> {
    let kind = detect_kind(document)?;
    let raw = match kind {
        DocumentKind::Pdf => extract_pdf(&document.name, &document.bytes)?,
        DocumentKind::Text => extract_text(&document.name, &document.bytes)?,
    };

    let mut text = normalize_text(&raw);
    if text.is_empty() {
        return Err(AppError::Extraction(format!(
            "{} contains no text after cleanup",
            document.name
        )));
    }
    if let Some((cut, _)) = text.char_indices().nth(max_chars) {
        tracing::warn!(
            document = %document.name,
            max_chars,
            "document text truncated before prompting"
        );
        text.truncate(cut);
    }
    if text.trim().is_empty() {
        return Err(AppError::Extraction(format!(
            "{}: no text left within the {max_chars} character limit",
            document.name
        )));
    }
    tracing::debug!(
        document = %document.name,
        kind = kind.as_str(),
        chars = text.chars().count(),
        "document text extracted"
    );

    Ok(ExtractedText {
        document_name: document.name.clone(),
        kind,
        char_count: text.chars().count(),
        text,
        checksum: checksum_bytes(&document.bytes),
    })
}

// ── PDF ───────────────────────────────────────────────────────────────────────

fn extract_pdf(name: &str, bytes: &[u8]) -> AppResult<String> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        tracing::warn!(document = %name, error = %e, "pdf extraction failed");
        AppError::Extraction(format!("{name}: cannot read PDF: {e}"))
    })?;

    if text.trim().is_empty() {
        return Err(AppError::Extraction(format!(
            "{name}: PDF contains no extractable text layer (scanned or image-only PDFs are not supported)"
        )));
    }
    Ok(text)
}

// ── Plain text ────────────────────────────────────────────────────────────────

fn extract_text(name: &str, bytes: &[u8]) -> AppResult<String> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| AppError::Extraction(format!("{name}: file is not valid UTF-8 text: {e}")))?;
    if text.trim().is_empty() {
        return Err(AppError::Extraction(format!("{name}: file is empty")));
    }
    Ok(text.to_string())
}

pub fn checksum_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
