//! Paradiff Document Alignment Library
//!
//! Paragraph-level comparison of two versions of a document. Lines are
//! aligned greedily by normalized edit-distance similarity and every aligned
//! pair carries a character-level diff as inline markup.
//!
//! # Example
//!
//! ```
//! use paradiff::prelude::*;
//!
//! let a = vec!["The cat sat", "A dog ran"];
//! let b = vec!["The cat sat", "A dog sprinted"];
//!
//! let result = align_lines(&a, &b, &AlignParams::with_threshold(0.7));
//!
//! assert_eq!(result.items.len(), 2);
//! assert_eq!(result.items[0].score, Some(1.0));
//! ```
//!
//! # Store Example
//!
//! ```no_run
//! use paradiff::prelude::*;
//! use std::path::Path;
//!
//! let db_path = Path::new("documents.db");
//! let params = AlignParams::default();
//!
//! // Retrieves DOC text (or PDF as fallback) and aligns paragraphs
//! let result = compare_documents("A/RES/77/16", "A/RES/78/5", db_path, &params, None, true).unwrap();
//!
//! for item in &result.items {
//!     println!("{}", format_item(item));
//! }
//! ```

pub mod align;
pub mod compare;
pub mod db;
pub mod extract;
pub mod highlight;
pub mod models;
pub mod output;
pub mod similarity;
pub mod symbol;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::align::{align_lines, align_lines_with_progress};
    pub use crate::compare::{
        compare_documents, compare_files, compare_loaded, summarize, CompareError, Side,
    };
    pub use crate::db::{
        init_store, insert_document, insert_metadata, list_documents, load_document,
        load_document_as, load_metadata, load_metadata_from_excel, DbError, StoredDocument,
    };
    pub use crate::extract::{document_from_text, read_document_file, segment};
    pub use crate::highlight::{
        highlight, highlight_spans, parse_markup, render_left, render_right, HighlightResult, Span,
    };
    pub use crate::models::{
        AlignParams, AlignmentItem, AlignmentResult, ComparisonResult, ComparisonSummary,
        Document, DocumentFormat, DocumentMetadata, Sides, Vote, DEFAULT_THRESHOLD,
    };
    pub use crate::output::{
        format_item, print_items, print_summary, write_csv, write_csv_file, write_json,
        write_json_file, OutputError,
    };
    pub use crate::similarity::{levenshtein, similarity};
    pub use crate::symbol::{extract_year, parse_symbol, ParsedSymbol};
}

// Re-export commonly used types at the crate root
pub use align::align_lines;
pub use highlight::highlight;
pub use models::{AlignParams, AlignmentItem, AlignmentResult, ComparisonResult};
pub use similarity::similarity;
