//! Data structures for the paradiff alignment pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default similarity threshold for accepting a fuzzy line match.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Alignment parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignParams {
    /// Minimum similarity (exclusive) for two lines to count as a match
    pub threshold: f64,
    /// Run candidate searches on the rayon pool (never changes output)
    pub parallel: bool,
}

impl Default for AlignParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            parallel: true,
        }
    }
}

impl AlignParams {
    /// Parameters with the given threshold and the default search mode.
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }
}

/// One row of an alignment, pairing (at most) one line from each side.
///
/// `left_number`/`right_number` hold the original line index, or `None`
/// when the side is empty. On the wire `None` is written as `"-"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentItem {
    pub left: Option<String>,
    pub left_best: Option<String>,
    pub left_highlighted: String,
    #[serde(with = "line_number")]
    pub left_number: Option<usize>,
    pub right: Option<String>,
    pub right_best: Option<String>,
    pub right_highlighted: String,
    #[serde(with = "line_number")]
    pub right_number: Option<usize>,
    pub score: Option<f64>,
}

impl AlignmentItem {
    /// True when both sides were compared and are identical.
    pub fn is_identical(&self) -> bool {
        self.score == Some(1.0)
    }

    /// True for items emitted for A lines that never got a B slot.
    pub fn is_left_only(&self) -> bool {
        self.right_number.is_none()
    }
}

/// Full alignment of two line sequences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    /// Mean similarity over the scored items, 0 when there are none
    pub score: f64,
    pub items: Vec<AlignmentItem>,
}

/// Serde adapter writing a missing line index as `"-"`.
pub mod line_number {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub const NONE_MARKER: &str = "-";

    pub fn serialize<S: Serializer>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(n) => serializer.serialize_u64(*n as u64),
            None => serializer.serialize_str(NONE_MARKER),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        struct LineNumberVisitor;

        impl<'de> Visitor<'de> for LineNumberVisitor {
            type Value = Option<usize>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a line index or \"{}\"", NONE_MARKER)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Some(v as usize))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                usize::try_from(v)
                    .map(Some)
                    .map_err(|_| E::custom(format!("negative line index {}", v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v == NONE_MARKER {
                    Ok(None)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }
        }

        deserializer.deserialize_any(LineNumberVisitor)
    }
}

/// Source format of a document's extracted text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Word document (preferred, clean paragraph breaks)
    #[default]
    Doc,
    /// PDF (fallback, paragraphs recovered heuristically)
    Pdf,
    /// Plain text supplied directly
    Text,
}

impl DocumentFormat {
    /// Formats tried, in order, when retrieving a document from the store.
    pub const RETRIEVAL_ORDER: [DocumentFormat; 2] = [DocumentFormat::Doc, DocumentFormat::Pdf];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Doc => "doc",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Text => "text",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "doc" | "docx" => Ok(DocumentFormat::Doc),
            "pdf" => Ok(DocumentFormat::Pdf),
            "text" | "txt" => Ok(DocumentFormat::Text),
            other => Err(other.to_string()),
        }
    }
}

/// A document after text extraction and paragraph segmentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub symbol: String,
    pub text: String,
    pub lines: Vec<String>,
    pub format: DocumentFormat,
}

impl Document {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Recorded vote on a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub in_favour: u32,
    pub against: u32,
    pub abstaining: u32,
}

/// Catalog metadata for a document (display only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub symbol: String,
    pub title: String,
    pub date: Option<String>,
    pub year: Option<i32>,
    pub subjects: Vec<String>,
    pub vote: Option<Vote>,
    pub agenda_info: Option<String>,
}

/// A value for each side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sides<T> {
    pub left: T,
    pub right: T,
}

/// Counts describing an alignment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub left_lines: usize,
    pub right_lines: usize,
    /// Main items whose B line was bound to an A line
    pub matched: usize,
    /// Main items with only a reference candidate from A
    pub reference_only: usize,
    /// Main items with nothing from A
    pub unmatched_right: usize,
    /// Items for A lines without a B slot
    pub left_only: usize,
    /// Items with score exactly 1
    pub identical: usize,
    pub score: f64,
}

/// Full comparison of two documents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub version: String,
    pub parameters: AlignParams,
    pub symbols: Sides<String>,
    pub score: f64,
    pub items: Vec<AlignmentItem>,
    pub formats: Sides<DocumentFormat>,
    pub metadata: Sides<Option<DocumentMetadata>>,
    pub years: Sides<Option<i32>>,
    pub summary: ComparisonSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item(left_number: Option<usize>, right_number: Option<usize>) -> AlignmentItem {
        AlignmentItem {
            left: Some("a".to_string()),
            left_best: None,
            left_highlighted: "a".to_string(),
            left_number,
            right: right_number.map(|_| "a".to_string()),
            right_best: None,
            right_highlighted: "a".to_string(),
            right_number,
            score: right_number.map(|_| 1.0),
        }
    }

    #[test]
    fn test_default_params() {
        let params = AlignParams::default();
        assert_eq!(params.threshold, 0.8);
        assert!(params.parallel);
        assert_eq!(AlignParams::with_threshold(0.5).threshold, 0.5);
    }

    #[test]
    fn test_item_wire_format() {
        let item = sample_item(Some(3), None);
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["leftNumber"], 3);
        assert_eq!(json["rightNumber"], "-");
        assert!(json["score"].is_null());
        assert!(json["leftBest"].is_null());
        assert_eq!(json["leftHighlighted"], "a");
    }

    #[test]
    fn test_item_deserialize_markers() {
        let item = sample_item(None, Some(7));
        let json = serde_json::to_string(&item).unwrap();
        let back: AlignmentItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.left_number, None);
        assert_eq!(back.right_number, Some(7));

        let bad = json.replace("\"leftNumber\":\"-\"", "\"leftNumber\":\"x\"");
        assert!(serde_json::from_str::<AlignmentItem>(&bad).is_err());
    }

    #[test]
    fn test_item_flags() {
        assert!(sample_item(Some(0), Some(0)).is_identical());
        assert!(sample_item(Some(0), None).is_left_only());
        assert!(!sample_item(Some(0), None).is_identical());
    }

    #[test]
    fn test_document_format_parse() {
        assert_eq!("doc".parse::<DocumentFormat>(), Ok(DocumentFormat::Doc));
        assert_eq!("PDF".parse::<DocumentFormat>(), Ok(DocumentFormat::Pdf));
        assert_eq!("txt".parse::<DocumentFormat>(), Ok(DocumentFormat::Text));
        assert!("odt".parse::<DocumentFormat>().is_err());
        assert_eq!(DocumentFormat::Pdf.to_string(), "pdf");
        assert_eq!(
            serde_json::to_string(&DocumentFormat::Doc).unwrap(),
            "\"doc\""
        );
    }

    #[test]
    fn test_metadata_wire_format() {
        let meta = DocumentMetadata {
            symbol: "A/RES/77/16".to_string(),
            title: "Cooperation".to_string(),
            vote: Some(Vote {
                in_favour: 120,
                against: 5,
                abstaining: 40,
            }),
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["vote"]["inFavour"], 120);
        assert!(json["agendaInfo"].is_null());
    }
}
