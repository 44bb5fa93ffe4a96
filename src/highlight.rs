//! Character-level highlighting of the differences between two lines.
//!
//! The diff is kept as tagged spans and flattened to the inline markup
//! consumers expect: `~~removed~~` on the left, `**added**` on the right.
//! Delimiters occurring literally in the input are not escaped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};

pub const REMOVED_DELIMITER: &str = "~~";
pub const ADDED_DELIMITER: &str = "**";

/// Markup spans in rendered text: `~~removed~~` or `**added**`
static MARKUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"~~([^~]+)~~|\*\*([^*]+)\*\*").expect("static markup regex"));

/// A run of characters classified by the diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Span {
    /// Present on both sides
    Unchanged(String),
    /// Present only on the right
    Added(String),
    /// Present only on the left
    Removed(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Span::Unchanged(s) | Span::Added(s) | Span::Removed(s) => s,
        }
    }
}

/// Rendered markup for both sides of a pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighlightResult {
    pub left: String,
    pub right: String,
}

/// Append a run, merging it into the previous span when the kind matches.
fn push_run(spans: &mut Vec<Span>, tag: ChangeTag, value: &str) {
    match (spans.last_mut(), tag) {
        (Some(Span::Unchanged(s)), ChangeTag::Equal)
        | (Some(Span::Added(s)), ChangeTag::Insert)
        | (Some(Span::Removed(s)), ChangeTag::Delete) => s.push_str(value),
        (_, ChangeTag::Equal) => spans.push(Span::Unchanged(value.to_string())),
        (_, ChangeTag::Insert) => spans.push(Span::Added(value.to_string())),
        (_, ChangeTag::Delete) => spans.push(Span::Removed(value.to_string())),
    }
}

/// Minimal character diff from `a` to `b` as merged spans.
///
/// A missing side is treated as the empty string.
pub fn highlight_spans(a: Option<&str>, b: Option<&str>) -> Vec<Span> {
    let old = a.unwrap_or("");
    let new = b.unwrap_or("");

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_chars(old, new);

    let mut spans = Vec::new();
    for change in diff.iter_all_changes() {
        push_run(&mut spans, change.tag(), change.value());
    }
    spans
}

/// Left-side markup: unchanged text plus `~~removed~~` runs.
pub fn render_left(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Unchanged(s) => out.push_str(s),
            Span::Removed(s) => {
                out.push_str(REMOVED_DELIMITER);
                out.push_str(s);
                out.push_str(REMOVED_DELIMITER);
            }
            Span::Added(_) => {}
        }
    }
    out
}

/// Right-side markup: unchanged text plus `**added**` runs.
pub fn render_right(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Unchanged(s) => out.push_str(s),
            Span::Added(s) => {
                out.push_str(ADDED_DELIMITER);
                out.push_str(s);
                out.push_str(ADDED_DELIMITER);
            }
            Span::Removed(_) => {}
        }
    }
    out
}

/// Highlight the differences between `a` and `b` as inline markup.
pub fn highlight(a: Option<&str>, b: Option<&str>) -> HighlightResult {
    let spans = highlight_spans(a, b);
    HighlightResult {
        left: render_left(&spans),
        right: render_right(&spans),
    }
}

/// Parse rendered markup back into spans.
///
/// The earliest marker wins; a run cannot contain its own delimiter
/// character, so markup produced from text containing `~` or `*` may not
/// round-trip.
pub fn parse_markup(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in MARKUP_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            spans.push(Span::Unchanged(text[last..whole.start()].to_string()));
        }
        if let Some(removed) = caps.get(1) {
            spans.push(Span::Removed(removed.as_str().to_string()));
        } else if let Some(added) = caps.get(2) {
            spans.push(Span::Added(added.as_str().to_string()));
        }
        last = whole.end();
    }

    if last < text.len() {
        spans.push(Span::Unchanged(text[last..].to_string()));
    }
    spans
}

/// Concatenated unchanged text shared by both sides.
pub fn unchanged_text(spans: &[Span]) -> String {
    spans
        .iter()
        .filter_map(|span| match span {
            Span::Unchanged(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}
