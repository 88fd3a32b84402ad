mod db;
mod extract;
mod parser;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use extract::FileKind;
use parser::SchemeParser;

#[derive(Parser)]
#[command(name = "scheme_parser", about = "Scheme-of-work parser and lesson classifier")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse scheme documents and store the lessons
    Ingest {
        /// Files to ingest (.pdf, .docx, .txt)
        files: Vec<PathBuf>,
    },
    /// Parse a single document and print the result without storing it
    Parse {
        file: PathBuf,
        /// Emit the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print intermediate parser state for a document
    Inspect { file: PathBuf },
    /// Stored lessons overview table
    Lessons {
        /// Filter by week number
        #[arg(short, long)]
        week: Option<u32>,
        /// Filter by strand (case-insensitive)
        #[arg(short, long)]
        strand: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Show store statistics
    Stats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let scheme_parser = SchemeParser::new();

    let result = match cli.command {
        Commands::Ingest { files } => {
            if files.is_empty() {
                println!("No files given. Pass one or more .pdf/.docx/.txt documents.");
                return Ok(());
            }
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let counts = ingest_files(&conn, &scheme_parser, &files)?;
            counts.print();
            Ok(())
        }
        Commands::Parse { file, json } => {
            let kind = FileKind::from_path(&file).with_context(|| {
                format!(
                    "Unsupported file type: {} (allowed: .pdf, .docx, .txt)",
                    file.display()
                )
            })?;
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let result = scheme_parser
                .parse_bytes(&bytes, kind)
                .with_context(|| format!("Failed to extract text from {}", file.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_parse_result(&file, kind, &result);
            }
            Ok(())
        }
        Commands::Inspect { file } => {
            let (_, text) = load_document(&file)?;
            inspect_document(&scheme_parser, &file, &text);
            Ok(())
        }
        Commands::Lessons { week, strand, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_lessons(&conn, week, strand.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No lessons found.");
                return Ok(());
            }

            println!(
                "{:>4} | {:>3} | {:>4} | {:>2} | {:<18} | {:<20} | {:<36}",
                "Id", "Doc", "Week", "Ls", "Strand", "Sub-strand", "Title"
            );
            println!("{}", "-".repeat(103));
            for row in &rows {
                let r = &row.record;
                println!(
                    "{:>4} | {:>3} | {:>4} | {:>2} | {:<18} | {:<20} | {:<36}",
                    row.id,
                    row.document_id,
                    r.week,
                    r.lesson_number,
                    truncate(&r.strand, 18),
                    truncate(&r.sub_strand, 20),
                    truncate(&r.title, 36),
                );
            }
            println!("\n{} lessons", rows.len());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Documents: {}", s.documents);
            println!("Lessons:   {}", s.lessons);
            println!("Weeks:     {}", s.distinct_weeks);
            if !s.strands.is_empty() {
                println!("\n--- Strands ---");
                for (strand, count) in &s.strands {
                    println!("  {:<24} {}", strand, count);
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct IngestCounts {
    documents: usize,
    lessons: usize,
    failed: usize,
}

impl IngestCounts {
    fn print(&self) {
        println!(
            "Saved {} documents, {} lessons ({} failed).",
            self.documents, self.lessons, self.failed
        );
    }
}

/// Extract every file up front, parse the batch in parallel, then store
/// serially.
fn ingest_files(
    conn: &rusqlite::Connection,
    scheme_parser: &SchemeParser,
    files: &[PathBuf],
) -> anyhow::Result<IngestCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let mut counts = IngestCounts {
        documents: 0,
        lessons: 0,
        failed: 0,
    };

    let mut extracted: Vec<(PathBuf, FileKind, String)> = Vec::new();
    for file in files {
        match load_document(file) {
            Ok((kind, text)) => extracted.push((file.clone(), kind, text)),
            Err(e) => {
                warn!("Skipping {}: {:#}", file.display(), e);
                counts.failed += 1;
            }
        }
    }

    let pb = ProgressBar::new(extracted.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec})")?
            .progress_chars("=> "),
    );

    let results: Vec<_> = extracted
        .par_iter()
        .map(|(file, kind, text)| {
            let result = scheme_parser.parse(text);
            pb.inc(1);
            (file, *kind, result)
        })
        .collect();
    pb.finish_and_clear();

    for (file, kind, result) in results {
        if !result.success {
            warn!("{}: {}", file.display(), result.message);
            counts.failed += 1;
            continue;
        }
        let doc_id = db::insert_document(
            conn,
            &db::DocumentRow {
                filename: file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.display().to_string()),
                kind: kind.label().to_string(),
                imported_at: chrono::Utc::now().to_rfc3339(),
                lesson_count: result.lessons.len(),
                weeks_found: result.weeks_found.clone(),
            },
        )?;
        db::save_lessons(conn, doc_id, &result.lessons)?;
        counts.documents += 1;
        counts.lessons += result.lessons.len();
    }

    Ok(counts)
}

fn load_document(file: &Path) -> anyhow::Result<(FileKind, String)> {
    let kind = FileKind::from_path(file).with_context(|| {
        format!(
            "Unsupported file type: {} (allowed: .pdf, .docx, .txt)",
            file.display()
        )
    })?;
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let text = extract::extract_text(&bytes, kind)
        .with_context(|| format!("Failed to extract text from {}", file.display()))?;
    Ok((kind, text))
}

fn print_parse_result(file: &Path, kind: FileKind, result: &parser::ParseResult) {
    println!("{} ({})", file.display(), kind.label());
    println!("{}", result.message);
    if !result.success {
        return;
    }
    println!("Weeks: {:?}\n", result.weeks_found);

    println!(
        "{:>4} | {:>2} | {:<18} | {:<20} | {:<36}",
        "Week", "Ls", "Strand", "Sub-strand", "Title"
    );
    println!("{}", "-".repeat(92));
    for lesson in &result.lessons {
        println!(
            "{:>4} | {:>2} | {:<18} | {:<20} | {:<36}",
            lesson.week,
            lesson.lesson_number,
            truncate(&lesson.strand, 18),
            truncate(&lesson.sub_strand, 20),
            truncate(&lesson.title, 36),
        );
    }
}

/// Debug harness: prints the intermediate state a parse would go through so
/// malformed documents can be diagnosed by eye.
fn inspect_document(scheme_parser: &SchemeParser, file: &Path, text: &str) {
    let lines: Vec<&str> = text.lines().collect();
    let non_empty: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    println!("File:            {}", file.display());
    println!("Characters:      {}", text.len());
    println!("Lines:           {}", lines.len());
    println!("Non-empty lines: {}", non_empty.len());

    println!("\n--- First 20 non-empty lines ---");
    for line in non_empty.iter().take(20) {
        println!("  {}", truncate(line, 100));
    }

    println!("\n--- Week markers (first 50 lines) ---");
    let mut found_any = false;
    for (i, line) in non_empty.iter().take(50).enumerate() {
        if let Some(week) = scheme_parser.week_patterns().match_week(line) {
            println!("  line {:>3}: week {:>2}  {}", i + 1, week, truncate(line, 60));
            found_any = true;
        }
    }
    if !found_any {
        println!("  none");
    }

    println!("\n--- Keyword counts ---");
    for keyword in [
        "strand",
        "sub-strand",
        "title",
        "objective",
        "outcome",
        "resource",
        "activity",
        "assessment",
    ] {
        let count = non_empty
            .iter()
            .filter(|l| l.to_lowercase().contains(keyword))
            .count();
        println!("  {:<12} {}", keyword, count);
    }

    println!("\n--- Layout ---");
    match parser::layout::detect_table(text) {
        Some(header) => {
            println!(
                "  table header at line {} ({} separator, {} columns)",
                header.line_index + 1,
                header.separator.label(),
                header.columns.len()
            );
            let mapping = parser::layout::map_columns(&header, scheme_parser.library());
            for (column, field) in header.columns.iter().zip(&mapping) {
                let mapped = field.map(|f| f.name()).unwrap_or("(unmapped)");
                println!("    {:<28} -> {}", truncate(column, 28), mapped);
            }
        }
        None => println!("  free-form (no table header detected)"),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
