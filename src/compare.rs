//! Pairwise document comparison.
//!
//! Coordinates the pipeline between two documents: retrieval from the
//! store, metadata lookup, line alignment and summary.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::align::align_lines_with_progress;
use crate::db::{load_document, load_metadata, DbError};
use crate::extract::read_document_file;
use crate::models::*;
use crate::symbol::extract_year;

/// Which document of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// A comparison could not be completed.
///
/// Raised for retrieval or catalog failures on either side; no partial
/// result is produced.
#[derive(Error, Debug)]
#[error("comparison could not be completed: {side} document {symbol}")]
pub struct CompareError {
    pub side: Side,
    pub symbol: String,
    #[source]
    pub source: DbError,
}

impl CompareError {
    fn new(side: Side, symbol: &str, source: DbError) -> Self {
        Self {
            side,
            symbol: symbol.to_string(),
            source,
        }
    }
}

/// Compare two stored documents.
///
/// Metadata comes from `catalog` when given, otherwise from the store's
/// metadata table.
pub fn compare_documents(
    symbol_a: &str,
    symbol_b: &str,
    db_path: &Path,
    params: &AlignParams,
    catalog: Option<&HashMap<String, DocumentMetadata>>,
    show_progress: bool,
) -> Result<ComparisonResult, CompareError> {
    info!(left = symbol_a, right = symbol_b, "loading documents");
    let doc_a = load_document(db_path, symbol_a).map_err(|e| CompareError::new(Side::Left, symbol_a, e))?;
    let doc_b = load_document(db_path, symbol_b).map_err(|e| CompareError::new(Side::Right, symbol_b, e))?;

    let metadata = match catalog {
        Some(catalog) => Sides {
            left: catalog.get(symbol_a).cloned(),
            right: catalog.get(symbol_b).cloned(),
        },
        None => Sides {
            left: load_metadata(db_path, symbol_a)
                .map_err(|e| CompareError::new(Side::Left, symbol_a, e))?,
            right: load_metadata(db_path, symbol_b)
                .map_err(|e| CompareError::new(Side::Right, symbol_b, e))?,
        },
    };

    Ok(compare_loaded(&doc_a, &doc_b, metadata, params, show_progress))
}

/// Compare two extracted text files; symbols are taken from the file names.
pub fn compare_files(
    path_a: &Path,
    path_b: &Path,
    formats: Sides<DocumentFormat>,
    params: &AlignParams,
    show_progress: bool,
) -> Result<ComparisonResult, CompareError> {
    let display = |p: &Path| p.display().to_string();
    let doc_a = read_document_file(path_a, None, formats.left)
        .map_err(|e| CompareError::new(Side::Left, &display(path_a), e))?;
    let doc_b = read_document_file(path_b, None, formats.right)
        .map_err(|e| CompareError::new(Side::Right, &display(path_b), e))?;

    let metadata = Sides {
        left: None,
        right: None,
    };
    Ok(compare_loaded(&doc_a, &doc_b, metadata, params, show_progress))
}

/// Compare two already-loaded documents.
pub fn compare_loaded(
    doc_a: &Document,
    doc_b: &Document,
    metadata: Sides<Option<DocumentMetadata>>,
    params: &AlignParams,
    show_progress: bool,
) -> ComparisonResult {
    info!(
        left_lines = doc_a.line_count(),
        right_lines = doc_b.line_count(),
        threshold = params.threshold,
        "aligning documents"
    );

    let progress = if show_progress {
        let pb = ProgressBar::new(doc_b.line_count() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let alignment = align_lines_with_progress(&doc_a.lines, &doc_b.lines, params, || {
        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    });

    if let Some(pb) = progress {
        pb.finish_with_message("Done");
    }

    let summary = summarize(&alignment, doc_a.line_count(), doc_b.line_count());
    info!(
        items = alignment.items.len(),
        matched = summary.matched,
        score = alignment.score,
        "comparison complete"
    );

    let years = Sides {
        left: document_year(&doc_a.symbol, metadata.left.as_ref()),
        right: document_year(&doc_b.symbol, metadata.right.as_ref()),
    };

    ComparisonResult {
        version: env!("CARGO_PKG_VERSION").to_string(),
        parameters: params.clone(),
        symbols: Sides {
            left: doc_a.symbol.clone(),
            right: doc_b.symbol.clone(),
        },
        score: alignment.score,
        items: alignment.items,
        formats: Sides {
            left: doc_a.format,
            right: doc_b.format,
        },
        metadata,
        years,
        summary,
    }
}

/// Catalog year, or the one implied by the symbol's session.
fn document_year(symbol: &str, metadata: Option<&DocumentMetadata>) -> Option<i32> {
    metadata
        .and_then(|m| m.year)
        .or_else(|| extract_year(symbol))
}

/// Count the kinds of items in an alignment.
pub fn summarize(alignment: &AlignmentResult, left_lines: usize, right_lines: usize) -> ComparisonSummary {
    let mut summary = ComparisonSummary {
        left_lines,
        right_lines,
        score: alignment.score,
        ..Default::default()
    };

    for item in &alignment.items {
        if item.is_identical() {
            summary.identical += 1;
        }
        match (item.left_number, item.right_number) {
            (_, None) => summary.left_only += 1,
            (Some(_), Some(_)) => summary.matched += 1,
            (None, Some(_)) if item.left_best.is_some() => summary.reference_only += 1,
            (None, Some(_)) => summary.unmatched_right += 1,
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::align_lines;
    use crate::db::{init_store, insert_document, insert_metadata};
    use crate::extract::document_from_text;

    fn doc(symbol: &str, text: &str) -> Document {
        document_from_text(symbol, text.to_string(), DocumentFormat::Doc)
    }

    fn no_metadata() -> Sides<Option<DocumentMetadata>> {
        Sides {
            left: None,
            right: None,
        }
    }

    #[test]
    fn test_summarize_counts() {
        let a = vec!["Preamble", "The cat sat", "Unrelated text"];
        let b = vec!["The cat sat", "Something else"];
        let alignment = align_lines(&a, &b, &AlignParams::default());
        let summary = summarize(&alignment, a.len(), b.len());

        assert_eq!(summary.left_lines, 3);
        assert_eq!(summary.right_lines, 2);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.identical, 1);
        assert_eq!(summary.unmatched_right, 1);
        assert_eq!(summary.reference_only, 0);
        // "Preamble" flushed, "Unrelated text" left over
        assert_eq!(summary.left_only, 2);
        assert_eq!(summary.score, alignment.score);
        assert_eq!(
            summary.matched + summary.reference_only + summary.unmatched_right,
            b.len()
        );
    }

    #[test]
    fn test_compare_loaded() {
        let doc_a = doc("A/RES/77/16", "The General Assembly\nRecalls its resolution");
        let doc_b = doc("A/RES/78/5", "The General Assembly\nRecalls its resolutions");
        let result = compare_loaded(&doc_a, &doc_b, no_metadata(), &AlignParams::default(), false);

        assert_eq!(result.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(result.symbols.left, "A/RES/77/16");
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.summary.matched, 2);
        assert_eq!(result.summary.identical, 1);
        assert_eq!(result.years, Sides { left: Some(2022), right: Some(2023) });
        assert_eq!(result.formats.left, DocumentFormat::Doc);
    }

    #[test]
    fn test_metadata_year_wins() {
        let meta = DocumentMetadata {
            symbol: "A/RES/77/16".to_string(),
            year: Some(2021),
            ..Default::default()
        };
        assert_eq!(document_year("A/RES/77/16", Some(&meta)), Some(2021));
        assert_eq!(document_year("A/RES/77/16", None), Some(2022));
        assert_eq!(document_year("draft", None), None);
    }

    #[test]
    fn test_compare_documents_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("store.db");
        init_store(&db).unwrap();
        insert_document(&db, "A/RES/77/16", DocumentFormat::Doc, "First\nSecond").unwrap();
        insert_document(&db, "A/RES/78/5", DocumentFormat::Doc, "First\nSecond\nThird").unwrap();
        insert_metadata(
            &db,
            &DocumentMetadata {
                symbol: "A/RES/78/5".to_string(),
                title: "Follow-up".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let result =
            compare_documents("A/RES/77/16", "A/RES/78/5", &db, &AlignParams::default(), None, false).unwrap();
        assert_eq!(result.metadata.left, None);
        assert_eq!(result.metadata.right.as_ref().map(|m| m.title.as_str()), Some("Follow-up"));
        assert_eq!(result.summary.matched, 2);
        assert_eq!(result.summary.unmatched_right, 1);
    }

    #[test]
    fn test_compare_documents_uses_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("store.db");
        init_store(&db).unwrap();
        insert_document(&db, "L", DocumentFormat::Doc, "Same line").unwrap();
        insert_document(&db, "R", DocumentFormat::Doc, "Same line").unwrap();

        let mut catalog = HashMap::new();
        catalog.insert(
            "R".to_string(),
            DocumentMetadata {
                symbol: "R".to_string(),
                year: Some(1999),
                ..Default::default()
            },
        );

        let result = compare_documents("L", "R", &db, &AlignParams::default(), Some(&catalog), false).unwrap();
        assert_eq!(result.metadata.left, None);
        assert_eq!(result.years.right, Some(1999));
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_compare_files() {
        let dir = tempfile::tempdir().unwrap();
        let left = dir.path().join("old.txt");
        let right = dir.path().join("new.txt");
        std::fs::write(&left, "Recalling its resolutions\nDecides to remain seized\n").unwrap();
        std::fs::write(&right, "Recalling its resolutions\n").unwrap();

        let formats = Sides {
            left: DocumentFormat::Text,
            right: DocumentFormat::Text,
        };
        let result = compare_files(&left, &right, formats.clone(), &AlignParams::default(), false).unwrap();
        assert_eq!(result.symbols.left, "old");
        assert_eq!(result.summary.matched, 1);
        assert_eq!(result.summary.left_only, 1);
        assert_eq!(result.years.left, None);

        let err = compare_files(&left, &dir.path().join("nope.txt"), formats, &AlignParams::default(), false)
            .unwrap_err();
        assert_eq!(err.side, Side::Right);
        assert!(matches!(err.source, DbError::Io(_)));
    }

    #[test]
    fn test_missing_document_fails_whole_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("store.db");
        init_store(&db).unwrap();
        insert_document(&db, "L", DocumentFormat::Doc, "Some text").unwrap();

        let err = compare_documents("L", "missing", &db, &AlignParams::default(), None, false).unwrap_err();
        assert_eq!(err.side, Side::Right);
        assert_eq!(err.symbol, "missing");
        assert!(matches!(err.source, DbError::NoAvailableFormat { .. }));
        assert_eq!(
            err.to_string(),
            "comparison could not be completed: right document missing"
        );
    }
}
