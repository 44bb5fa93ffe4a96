//! Output formatting for comparison results (JSON, CSV, text).

use crate::models::{AlignmentItem, ComparisonResult, DocumentMetadata};
use crate::models::line_number::NONE_MARKER;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write comparison result as JSON.
pub fn write_json<W: Write>(result: &ComparisonResult, writer: &mut W) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(result)?;
    writer.write_all(json.as_bytes())?;
    Ok(())
}

/// Write comparison result as JSON to a file.
pub fn write_json_file(result: &ComparisonResult, path: &Path) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_json(result, &mut file)
}

/// Quote a CSV field when it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_number(value: Option<usize>) -> String {
    value.map_or_else(|| NONE_MARKER.to_string(), |n| n.to_string())
}

/// Write alignment items as CSV.
pub fn write_csv<W: Write>(items: &[AlignmentItem], writer: &mut W) -> Result<(), OutputError> {
    writeln!(
        writer,
        "left_number,right_number,score,left,right,left_best,right_best,\
         left_highlighted,right_highlighted"
    )?;

    for item in items {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{}",
            csv_number(item.left_number),
            csv_number(item.right_number),
            item.score.map(|s| format!("{:.4}", s)).unwrap_or_default(),
            csv_field(item.left.as_deref().unwrap_or("")),
            csv_field(item.right.as_deref().unwrap_or("")),
            csv_field(item.left_best.as_deref().unwrap_or("")),
            csv_field(item.right_best.as_deref().unwrap_or("")),
            csv_field(&item.left_highlighted),
            csv_field(&item.right_highlighted),
        )?;
    }

    Ok(())
}

/// Write alignment items as CSV to a file.
pub fn write_csv_file(items: &[AlignmentItem], path: &Path) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_csv(items, &mut file)
}

fn format_metadata(metadata: Option<&DocumentMetadata>) -> String {
    let Some(meta) = metadata else {
        return String::new();
    };
    let mut out = String::new();
    if !meta.title.is_empty() {
        out.push_str(&format!(" \"{}\"", truncate_text(&meta.title, 60)));
    }
    if let Some(vote) = meta.vote {
        out.push_str(&format!(
            " [vote {}-{}-{}]",
            vote.in_favour, vote.against, vote.abstaining
        ));
    }
    out
}

/// Write a summary report to stdout.
pub fn print_summary(result: &ComparisonResult) {
    let year = |y: Option<i32>| y.map(|y| format!(", {}", y)).unwrap_or_default();

    println!("\n=== Comparison Summary ===");
    println!("Version: {}", result.version);
    println!();
    println!(
        "Left:  {} ({}{}, {} lines){}",
        result.symbols.left,
        result.formats.left,
        year(result.years.left),
        result.summary.left_lines,
        format_metadata(result.metadata.left.as_ref()),
    );
    println!(
        "Right: {} ({}{}, {} lines){}",
        result.symbols.right,
        result.formats.right,
        year(result.years.right),
        result.summary.right_lines,
        format_metadata(result.metadata.right.as_ref()),
    );
    println!();
    println!("Parameters:");
    println!("  Threshold: {:.2}", result.parameters.threshold);
    println!("  Parallel: {}", result.parameters.parallel);
    println!();
    println!("Results:");
    println!("  Items: {}", result.items.len());
    println!("  Matched: {}", result.summary.matched);
    println!("  Identical: {}", result.summary.identical);
    println!("  Reference only: {}", result.summary.reference_only);
    println!("  Unmatched right lines: {}", result.summary.unmatched_right);
    println!("  Left-only lines: {}", result.summary.left_only);
    println!("  Score: {:.1}%", result.score * 100.0);
}

/// Format an item as a human-readable string.
pub fn format_item(item: &AlignmentItem) -> String {
    let marker = match (item.left_number, item.right_number, item.score) {
        (_, None, _) => "-",
        (None, Some(_), _) => "+",
        (_, _, Some(s)) if s == 1.0 => "=",
        _ => "~",
    };
    let score = item
        .score
        .map(|s| format!("{:.1}%", s * 100.0))
        .unwrap_or_else(|| NONE_MARKER.to_string());

    format!(
        "{} [{} | {}] {}\n\
         \x20 L: {}\n\
         \x20 R: {}",
        marker,
        csv_number(item.left_number),
        csv_number(item.right_number),
        score,
        truncate_text(&item.left_highlighted, 100),
        truncate_text(&item.right_highlighted, 100),
    )
}

/// Print items in a human-readable format.
pub fn print_items(items: &[AlignmentItem], limit: Option<usize>) {
    let to_print = match limit {
        Some(n) => &items[..n.min(items.len())],
        None => items,
    };

    for item in to_print {
        println!("{}", format_item(item));
    }

    if let Some(n) = limit {
        if items.len() > n {
            println!("... and {} more items", items.len() - n);
        }
    }
}

/// Truncate text to a maximum length, adding ellipsis if needed.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
