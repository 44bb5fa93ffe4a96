//! Paradiff Document Comparison CLI
//!
//! Aligns the paragraphs of two document versions and reports
//! character-level differences for every aligned pair.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use paradiff::align::align_lines;
use paradiff::compare::{compare_documents, compare_files};
use paradiff::db::{
    init_store, insert_document, insert_metadata, list_documents, load_document,
    load_document_as, load_metadata, load_metadata_from_excel,
};
use paradiff::extract::read_document_file;
use paradiff::highlight::highlight;
use paradiff::models::{AlignParams, ComparisonResult, DocumentFormat, Sides};
use paradiff::output::{
    print_items, print_summary, truncate_text, write_csv, write_csv_file, write_json,
    write_json_file,
};
use paradiff::similarity::{levenshtein, similarity};
use paradiff::symbol::{extract_year, parse_symbol};

#[derive(Parser)]
#[command(name = "paradiff")]
#[command(about = "Paragraph alignment and character diff for document versions")]
#[command(version)]
struct Cli {
    /// Suppress progress output and informational logging
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for comparison results
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON (wire format)
    Json,
    /// One CSV row per alignment item
    Csv,
    /// Human-readable summary and items
    Text,
}

/// Alignment parameters; unset values inherit from AlignParams::default()
#[derive(Args)]
struct AlignArgs {
    /// Minimum similarity (exclusive) for a line match [default: 0.8]
    #[arg(long)]
    threshold: Option<f64>,

    /// Run candidate searches in parallel [default: true]
    #[arg(long, action = clap::ArgAction::Set)]
    parallel: Option<bool>,
}

impl AlignArgs {
    fn to_params(&self) -> AlignParams {
        let defaults = AlignParams::default();
        AlignParams {
            threshold: self.threshold.unwrap_or(defaults.threshold),
            parallel: self.parallel.unwrap_or(defaults.parallel),
        }
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Output file path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print first N items to console
    #[arg(long)]
    show_items: Option<usize>,
}

fn parse_format(s: &str) -> Result<DocumentFormat, String> {
    s.parse()
        .map_err(|tag| format!("unknown document format '{}' (expected doc, pdf or text)", tag))
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two documents from the store
    Compare {
        /// Path to the document store
        #[arg(long)]
        db: PathBuf,

        /// Symbol of the earlier version
        #[arg(long)]
        left: String,

        /// Symbol of the later version
        #[arg(long)]
        right: String,

        /// Excel metadata catalog (overrides the store's metadata table)
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[command(flatten)]
        align: AlignArgs,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Compare two extracted text files
    Files {
        /// Earlier version
        left: PathBuf,

        /// Later version
        right: PathBuf,

        /// Segmentation of the left file: doc, pdf or text
        #[arg(long, default_value = "text", value_parser = parse_format)]
        left_format: DocumentFormat,

        /// Segmentation of the right file: doc, pdf or text
        #[arg(long, default_value = "text", value_parser = parse_format)]
        right_format: DocumentFormat,

        #[command(flatten)]
        align: AlignArgs,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Import extracted text or a metadata catalog into the store
    Import {
        /// Path to the document store (created if missing)
        #[arg(long)]
        db: PathBuf,

        /// Extracted text file to store
        #[arg(long)]
        file: Option<PathBuf>,

        /// Symbol for the file [default: file name]
        #[arg(long)]
        symbol: Option<String>,

        /// Source format of the file: doc, pdf or text
        #[arg(long, default_value = "doc", value_parser = parse_format)]
        format: DocumentFormat,

        /// Excel metadata catalog to load into the metadata table
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Show stored documents, or details of one document
    Info {
        /// Path to the document store
        #[arg(long)]
        db: PathBuf,

        /// Document symbol
        #[arg(long)]
        symbol: Option<String>,

        /// Show the segmented lines
        #[arg(long)]
        show_lines: bool,
    },

    /// Similarity score of two strings
    Similarity { a: String, b: String },

    /// Character-level highlight of two strings
    Highlight { a: String, b: String },

    /// Benchmark alignment performance
    Benchmark {
        /// Number of alignment iterations
        #[arg(long, default_value = "20")]
        iterations: usize,

        /// Lines per document
        #[arg(long, default_value = "200")]
        lines: usize,
    },
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let quiet = cli.quiet;
    init_tracing(quiet);

    match cli.command {
        Commands::Compare {
            db,
            left,
            right,
            catalog,
            align,
            out,
        } => {
            let catalog = catalog.as_deref().map(load_metadata_from_excel).transpose()?;
            let params = align.to_params();
            let result = compare_documents(&left, &right, &db, &params, catalog.as_ref(), !quiet)?;
            emit_result(&result, &out, quiet)?;
        }

        Commands::Files {
            left,
            right,
            left_format,
            right_format,
            align,
            out,
        } => {
            let formats = Sides {
                left: left_format,
                right: right_format,
            };
            let params = align.to_params();
            let result = compare_files(&left, &right, formats, &params, !quiet)?;
            emit_result(&result, &out, quiet)?;
        }

        Commands::Import {
            db,
            file,
            symbol,
            format,
            catalog,
        } => {
            if file.is_none() && catalog.is_none() {
                return Err("nothing to import: pass --file and/or --catalog".into());
            }
            init_store(&db)?;

            if let Some(path) = file {
                let doc = read_document_file(&path, symbol.as_deref(), format)?;
                insert_document(&db, &doc.symbol, format, &doc.text)?;
                println!(
                    "Imported {} ({}, {} lines)",
                    doc.symbol,
                    format,
                    doc.line_count()
                );
            }

            if let Some(path) = catalog {
                let entries = load_metadata_from_excel(&path)?;
                for meta in entries.values() {
                    insert_metadata(&db, meta)?;
                }
                println!("Imported metadata for {} documents", entries.len());
            }
        }

        Commands::Info {
            db,
            symbol,
            show_lines,
        } => match symbol {
            None => {
                let documents = list_documents(&db)?;
                println!("=== Documents ({}) ===", documents.len());
                for doc in &documents {
                    let formats: Vec<&str> = doc.formats.iter().map(|f| f.as_str()).collect();
                    println!("  {} [{}]", doc.symbol, formats.join(", "));
                }
            }
            Some(symbol) => print_document_info(&db, &symbol, show_lines)?,
        },

        Commands::Similarity { a, b } => {
            println!("Similarity: {:.4}", similarity(&a, &b));
            println!("Edit distance: {}", levenshtein(&a, &b));
        }

        Commands::Highlight { a, b } => {
            let result = highlight(Some(a.as_str()), Some(b.as_str()));
            println!("L: {}", result.left);
            println!("R: {}", result.right);
        }

        Commands::Benchmark { iterations, lines } => {
            run_benchmark(iterations, lines);
        }
    }

    Ok(())
}

/// Write a comparison in the requested format.
fn emit_result(
    result: &ComparisonResult,
    out: &OutputArgs,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match (out.format, &out.output) {
        (OutputFormat::Json, Some(path)) => write_json_file(result, path)?,
        (OutputFormat::Json, None) => {
            write_json(result, &mut io::stdout().lock())?;
            println!();
        }
        (OutputFormat::Csv, Some(path)) => write_csv_file(&result.items, path)?,
        (OutputFormat::Csv, None) => write_csv(&result.items, &mut io::stdout().lock())?,
        (OutputFormat::Text, _) => {
            print_summary(result);
            println!("\n=== Items ===");
            print_items(&result.items, out.show_items);
            return Ok(());
        }
    }

    if let Some(path) = &out.output {
        info!(path = %path.display(), "wrote output");
        if !quiet {
            print_summary(result);
        }
        if let Some(limit) = out.show_items {
            println!("\n=== Sample Items ===");
            print_items(&result.items, Some(limit));
        }
    }

    Ok(())
}

fn print_document_info(
    db: &Path,
    symbol: &str,
    show_lines: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = parse_symbol(symbol);
    let metadata = load_metadata(db, symbol)?;

    println!("=== {} ===", symbol);
    println!("Body: {}", parsed.body);
    if let Some(session) = parsed.session {
        println!("Session: {}", session);
    }
    let year = metadata.as_ref().and_then(|m| m.year).or_else(|| extract_year(symbol));
    if let Some(year) = year {
        println!("Year: {}", year);
    }

    if let Some(meta) = &metadata {
        println!("Title: {}", meta.title);
        if let Some(date) = &meta.date {
            println!("Date: {}", date);
        }
        if !meta.subjects.is_empty() {
            println!("Subjects: {}", meta.subjects.join("; "));
        }
        if let Some(vote) = meta.vote {
            println!(
                "Vote: {} in favour, {} against, {} abstaining",
                vote.in_favour, vote.against, vote.abstaining
            );
        }
        if let Some(agenda) = &meta.agenda_info {
            println!("Agenda: {}", agenda);
        }
    }

    let stored = list_documents(db)?
        .into_iter()
        .find(|d| d.symbol == symbol)
        .map(|d| d.formats)
        .unwrap_or_default();
    println!("\n=== Formats ===");
    for format in &stored {
        let doc = load_document_as(db, symbol, *format)?;
        println!("  {}: {} lines", format, doc.line_count());
    }

    if show_lines {
        let doc = load_document(db, symbol)?;
        println!("\n=== Lines ({}) ===", doc.format);
        for (i, line) in doc.lines.iter().enumerate() {
            println!("  {:>4}  {}", i, truncate_text(line, 100));
        }
    }

    Ok(())
}

/// Run alignment benchmark to measure performance.
fn run_benchmark(iterations: usize, lines: usize) {
    println!("=== Alignment Benchmark ===");
    println!("Iterations: {}", iterations);
    println!("Lines per document: {}", lines);

    let original: Vec<String> = (0..lines)
        .map(|i| format!("{}. Recalls its resolution {} on regional cooperation and development", i + 1, i * 7))
        .collect();
    let edited: Vec<String> = original
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i % 3 == 0 {
                line.replace("Recalls", "Reaffirms")
            } else {
                line.clone()
            }
        })
        .collect();
    let unrelated: Vec<String> = (0..lines)
        .map(|i| format!("Unrelated paragraph {} with entirely different wording", i))
        .collect();

    let cases = [
        ("Identical documents", &original),
        ("One third of lines edited", &edited),
        ("No matching lines", &unrelated),
    ];

    for (name, other) in cases {
        for parallel in [false, true] {
            let params = AlignParams {
                parallel,
                ..Default::default()
            };
            println!("\n{} ({}):", name, if parallel { "parallel" } else { "sequential" });

            let start = Instant::now();
            let mut score = 0.0;
            for _ in 0..iterations {
                score = align_lines(&original, other, &params).score;
            }
            let elapsed = start.elapsed();
            let per_alignment = elapsed.as_secs_f64() / iterations.max(1) as f64;
            println!("  Total time: {:.3}s", elapsed.as_secs_f64());
            println!("  Per alignment: {:.3}ms", per_alignment * 1000.0);
            println!("  Score: {:.3}", score);
        }
    }
}
