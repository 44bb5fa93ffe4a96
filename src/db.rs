//! SQLite document store and metadata catalog.
//!
//! The store holds already-extracted text per document symbol and source
//! format. Retrieval prefers the DOC extraction and falls back to PDF.
//! Metadata comes from the store's `metadata` table or an Excel catalog.

use calamine::{open_workbook, Reader, Xlsx};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::extract::document_from_text;
use crate::models::{Document, DocumentFormat, DocumentMetadata, Vote};

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Excel XLSX error: {0}")]
    ExcelXlsx(#[from] calamine::XlsxError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Document store not found: {}", .0.display())]
    StoreNotFound(PathBuf),
    #[error("Document not found: {symbol} ({format})")]
    DocumentNotFound {
        symbol: String,
        format: DocumentFormat,
    },
    #[error("Failed to fetch document {symbol}: no available format (tried {tried})")]
    NoAvailableFormat { symbol: String, tried: String },
    #[error("Unknown document format: {0}")]
    UnknownFormat(String),
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        symbol TEXT NOT NULL,
        format TEXT NOT NULL,
        body   TEXT NOT NULL,
        PRIMARY KEY (symbol, format)
    );
    CREATE TABLE IF NOT EXISTS metadata (
        symbol          TEXT PRIMARY KEY,
        title           TEXT NOT NULL,
        date            TEXT,
        year            INTEGER,
        subjects        TEXT NOT NULL DEFAULT '[]',
        vote_in_favour  INTEGER,
        vote_against    INTEGER,
        vote_abstaining INTEGER,
        agenda_info     TEXT
    );
";

/// A stored document and the formats it is available in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDocument {
    pub symbol: String,
    pub formats: Vec<DocumentFormat>,
}

/// Open an existing store for reading; never creates the database file.
fn open_read_only(db_path: &Path) -> Result<Connection, DbError> {
    if !db_path.is_file() {
        return Err(DbError::StoreNotFound(db_path.to_path_buf()));
    }
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}

/// Create the store tables if they do not exist.
pub fn init_store(db_path: &Path) -> Result<(), DbError> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Insert (or replace) the extracted text of a document in one format.
pub fn insert_document(
    db_path: &Path,
    symbol: &str,
    format: DocumentFormat,
    body: &str,
) -> Result<(), DbError> {
    let conn = Connection::open(db_path)?;
    conn.execute(
        "INSERT OR REPLACE INTO documents (symbol, format, body) VALUES (?1, ?2, ?3)",
        params![symbol, format.as_str(), body],
    )?;
    debug!(symbol, %format, bytes = body.len(), "stored document");
    Ok(())
}

/// Insert (or replace) catalog metadata for a document.
pub fn insert_metadata(db_path: &Path, metadata: &DocumentMetadata) -> Result<(), DbError> {
    let conn = Connection::open(db_path)?;
    let subjects = serde_json::to_string(&metadata.subjects)?;
    conn.execute(
        "INSERT OR REPLACE INTO metadata
            (symbol, title, date, year, subjects, vote_in_favour, vote_against, vote_abstaining, agenda_info)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            metadata.symbol,
            metadata.title,
            metadata.date,
            metadata.year,
            subjects,
            metadata.vote.map(|v| v.in_favour),
            metadata.vote.map(|v| v.against),
            metadata.vote.map(|v| v.abstaining),
            metadata.agenda_info,
        ],
    )?;
    Ok(())
}

fn query_document_text(
    conn: &Connection,
    symbol: &str,
    format: DocumentFormat,
) -> Result<Option<String>, DbError> {
    let body = conn
        .query_row(
            "SELECT body FROM documents WHERE symbol = ?1 AND format = ?2",
            params![symbol, format.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(body)
}

/// Load a document in one specific format.
pub fn load_document_as(
    db_path: &Path,
    symbol: &str,
    format: DocumentFormat,
) -> Result<Document, DbError> {
    let conn = open_read_only(db_path)?;
    let body = query_document_text(&conn, symbol, format)?.ok_or_else(|| {
        DbError::DocumentNotFound {
            symbol: symbol.to_string(),
            format,
        }
    })?;
    Ok(document_from_text(symbol, body, format))
}

/// Load a document, trying DOC first and falling back to PDF.
///
/// A stored format whose text segments into no paragraphs counts as a
/// failed extraction and the next format is tried.
pub fn load_document(db_path: &Path, symbol: &str) -> Result<Document, DbError> {
    let conn = open_read_only(db_path)?;

    for format in DocumentFormat::RETRIEVAL_ORDER {
        let Some(body) = query_document_text(&conn, symbol, format)? else {
            continue;
        };
        let document = document_from_text(symbol, body, format);
        if document.lines.is_empty() {
            warn!(symbol, %format, "stored text has no paragraphs, trying next format");
            continue;
        }
        info!(symbol, %format, lines = document.line_count(), "loaded document");
        return Ok(document);
    }

    let tried = DocumentFormat::RETRIEVAL_ORDER
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Err(DbError::NoAvailableFormat {
        symbol: symbol.to_string(),
        tried,
    })
}

/// List stored documents with their available formats, ordered by symbol.
pub fn list_documents(db_path: &Path) -> Result<Vec<StoredDocument>, DbError> {
    let conn = open_read_only(db_path)?;
    let mut stmt = conn.prepare("SELECT symbol, format FROM documents ORDER BY symbol, format")?;
    let mut rows = stmt.query([])?;

    let mut documents: Vec<StoredDocument> = Vec::new();
    while let Some(row) = rows.next()? {
        let symbol: String = row.get(0)?;
        let tag: String = row.get(1)?;
        let format: DocumentFormat = tag.parse().map_err(DbError::UnknownFormat)?;

        match documents.last_mut() {
            Some(last) if last.symbol == symbol => last.formats.push(format),
            _ => documents.push(StoredDocument {
                symbol,
                formats: vec![format],
            }),
        }
    }

    Ok(documents)
}

/// Load catalog metadata for a document; `None` when it has no entry.
pub fn load_metadata(db_path: &Path, symbol: &str) -> Result<Option<DocumentMetadata>, DbError> {
    let conn = open_read_only(db_path)?;
    let row = conn
        .query_row(
            "SELECT symbol, title, date, year, subjects, vote_in_favour, vote_against,
                    vote_abstaining, agenda_info
             FROM metadata WHERE symbol = ?1",
            [symbol],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<i32>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<u32>>(5)?,
                    row.get::<_, Option<u32>>(6)?,
                    row.get::<_, Option<u32>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                ))
            },
        )
        .optional()?;

    let Some((symbol, title, date, year, subjects, in_favour, against, abstaining, agenda_info)) =
        row
    else {
        return Ok(None);
    };

    let vote = match (in_favour, against, abstaining) {
        (Some(in_favour), Some(against), Some(abstaining)) => Some(Vote {
            in_favour,
            against,
            abstaining,
        }),
        _ => None,
    };

    Ok(Some(DocumentMetadata {
        symbol,
        title,
        date,
        year,
        subjects: serde_json::from_str(&subjects)?,
        vote,
        agenda_info,
    }))
}

/// Load document metadata from an Excel catalog, keyed by symbol.
///
/// The first sheet is read; its header row names the columns. Subjects are
/// separated by `;`.
pub fn load_metadata_from_excel(
    excel_path: &Path,
) -> Result<HashMap<String, DocumentMetadata>, DbError> {
    let mut workbook: Xlsx<_> = open_workbook(excel_path)?;
    let mut metadata = HashMap::new();

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Ok(metadata);
    };
    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    let Some(header) = rows.next() else {
        return Ok(metadata);
    };
    let cols = find_column_indices(header);

    for row in rows {
        if let Some(entry) = metadata_from_row(row, &cols) {
            metadata.insert(entry.symbol.clone(), entry);
        }
    }

    info!(path = %excel_path.display(), entries = metadata.len(), "loaded metadata catalog");
    Ok(metadata)
}

/// Column indices for the metadata catalog
#[derive(Debug, Default)]
struct ColumnIndices {
    symbol: Option<usize>,
    title: Option<usize>,
    date: Option<usize>,
    year: Option<usize>,
    subjects: Option<usize>,
    in_favour: Option<usize>,
    against: Option<usize>,
    abstaining: Option<usize>,
    agenda_info: Option<usize>,
}

fn find_column_indices(header: &[calamine::Data]) -> ColumnIndices {
    let mut indices = ColumnIndices::default();

    for (i, cell) in header.iter().enumerate() {
        if let calamine::Data::String(s) = cell {
            match s.trim().to_lowercase().as_str() {
                "symbol" | "document_symbol" => indices.symbol = Some(i),
                "title" => indices.title = Some(i),
                "date" => indices.date = Some(i),
                "year" => indices.year = Some(i),
                "subjects" | "subject" => indices.subjects = Some(i),
                "in_favour" | "in_favor" | "yes" => indices.in_favour = Some(i),
                "against" | "no" => indices.against = Some(i),
                "abstaining" | "abstain" => indices.abstaining = Some(i),
                "agenda" | "agenda_info" => indices.agenda_info = Some(i),
                _ => {}
            }
        }
    }

    indices
}

fn metadata_from_row(row: &[calamine::Data], cols: &ColumnIndices) -> Option<DocumentMetadata> {
    let symbol = get_string_cell(row, cols.symbol)?;
    if symbol.is_empty() {
        return None;
    }

    let vote = match (
        get_u32_cell(row, cols.in_favour),
        get_u32_cell(row, cols.against),
        get_u32_cell(row, cols.abstaining),
    ) {
        (Some(in_favour), Some(against), Some(abstaining)) => Some(Vote {
            in_favour,
            against,
            abstaining,
        }),
        _ => None,
    };

    let subjects = get_string_cell(row, cols.subjects)
        .map(|s| {
            s.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(DocumentMetadata {
        symbol,
        title: get_string_cell(row, cols.title).unwrap_or_default(),
        date: get_string_cell(row, cols.date),
        year: get_i32_cell(row, cols.year),
        subjects,
        vote,
        agenda_info: get_string_cell(row, cols.agenda_info),
    })
}

fn get_string_cell(row: &[calamine::Data], col: Option<usize>) -> Option<String> {
    col.and_then(|i| row.get(i)).and_then(|cell| match cell {
        calamine::Data::String(s) => Some(s.trim().to_string()),
        calamine::Data::Int(n) => Some(n.to_string()),
        calamine::Data::Float(n) => Some(n.to_string()),
        _ => None,
    })
}

fn get_u32_cell(row: &[calamine::Data], col: Option<usize>) -> Option<u32> {
    col.and_then(|i| row.get(i)).and_then(|cell| match cell {
        calamine::Data::Int(n) => u32::try_from(*n).ok(),
        calamine::Data::Float(n) if *n >= 0.0 => Some(*n as u32),
        calamine::Data::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn get_i32_cell(row: &[calamine::Data], col: Option<usize>) -> Option<i32> {
    col.and_then(|i| row.get(i)).and_then(|cell| match cell {
        calamine::Data::Int(n) => i32::try_from(*n).ok(),
        calamine::Data::Float(n) => Some(*n as i32),
        calamine::Data::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
