//! Paragraph segmentation of extracted document text.
//!
//! DOC extractions keep their paragraph breaks, so each non-blank line is a
//! paragraph. PDF extractions (often OCR) lose them; paragraphs are recovered
//! from numbering and section markers typical of resolutions.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::db::DbError;
use crate::models::{Document, DocumentFormat};

/// PDF fragments of this many characters or fewer are dropped as noise.
pub const MIN_PDF_LINE_CHARS: usize = 15;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
/// ` 3. The` → numbered paragraph
static NUMBERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" (\d+)\. ([A-Z])").expect("static regex"));
/// ` B 12` → section letter followed by a paragraph number
static SECTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" ([A-E]) (\d+)").expect("static regex"));
static ASSEMBLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" (The General Assembly)").expect("static regex"));
static SEMICOLON_NUMBERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"; (\d+)\.").expect("static regex"));
/// ` (a) ` → lettered sub-paragraph
static LETTERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" (\([a-z]\) )").expect("static regex"));

/// Split text with real paragraph breaks: trimmed, non-empty lines.
pub fn split_doc_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Recover paragraphs from PDF text with unreliable line breaks.
pub fn split_pdf_lines(text: &str) -> Vec<String> {
    let normalized = WHITESPACE_RE.replace_all(text, " ");
    let processed = NUMBERED_RE.replace_all(&normalized, "\n${1}. ${2}");
    let processed = SECTION_RE.replace_all(&processed, "\n${1}\n${2}");
    let processed = ASSEMBLY_RE.replace_all(&processed, "\n${1}");
    let processed = SEMICOLON_NUMBERED_RE.replace_all(&processed, ";\n${1}.");
    let processed = LETTERED_RE.replace_all(&processed, "\n${1}");

    processed
        .split('\n')
        .map(str::trim)
        .filter(|line| line.chars().count() > MIN_PDF_LINE_CHARS)
        .map(str::to_string)
        .collect()
}

/// Segment extracted text into paragraph lines according to its format.
pub fn segment(text: &str, format: DocumentFormat) -> Vec<String> {
    match format {
        DocumentFormat::Doc | DocumentFormat::Text => split_doc_lines(text),
        DocumentFormat::Pdf => split_pdf_lines(text),
    }
}

/// Build a document from already-extracted text.
pub fn document_from_text(symbol: &str, text: String, format: DocumentFormat) -> Document {
    let lines = segment(&text, format);
    Document {
        symbol: symbol.to_string(),
        text,
        lines,
        format,
    }
}

/// Read an extracted text file from disk.
///
/// The file name (without extension) is used as the symbol when none is given.
pub fn read_document_file(
    path: &Path,
    symbol: Option<&str>,
    format: DocumentFormat,
) -> Result<Document, DbError> {
    let text = std::fs::read_to_string(path)?;
    let symbol = match symbol {
        Some(s) => s.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    Ok(document_from_text(&symbol, text, format))
}
