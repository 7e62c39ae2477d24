//! inorm CLI - insight content normalization tool
//!
//! A command-line tool for repairing, normalizing, and auditing insight
//! content files.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use inorm::{
    eliminate, render_document, render_document_compact, BatchSummary, DedupReport,
    NormalizedDocument, PipelineOptions,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Insight content normalization, repair, and duplicate auditing
#[derive(Parser)]
#[command(
    name = "inorm",
    version,
    about = "Normalize and deduplicate insight content files",
    long_about = "inorm - insight content normalization tool.\n\n\
                  Repairs malformed exported JSON, normalizes it into the\n\
                  canonical behavioral-insights shape, and audits for\n\
                  duplicate content.\n\n\
                  Usage:\n  \
                  inorm <file>              Normalize a file next to itself\n  \
                  inorm <dir> <output>      Normalize a directory into <output>\n  \
                  inorm audit <dir>         Report duplicates and uniqueness"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input file or directory (for default normalization)
    #[arg(global = false)]
    input: Option<PathBuf>,

    /// Output file or directory (for default normalization)
    #[arg(global = false)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a file or directory (default command)
    Normalize {
        /// Input file or directory
        input: PathBuf,

        /// Output file or directory (default: derived from input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Behavioral category constant stamped on output documents
        #[arg(long, default_value = "behavioral_analysis")]
        category: String,

        /// Skip the duplicate audit
        #[arg(long)]
        no_dedupe: bool,

        /// Near-duplicate similarity threshold (strictly greater than)
        #[arg(long, default_value = "0.80")]
        threshold: f64,

        /// Keep attempted repairs of unparsable files for inspection
        #[arg(long)]
        keep_attempts: bool,
    },

    /// Audit a file or directory for duplicate content
    Audit {
        /// Input file or directory
        input: PathBuf,

        /// Near-duplicate similarity threshold (strictly greater than)
        #[arg(long, default_value = "0.80")]
        threshold: f64,

        /// Uniqueness acceptance bar
        #[arg(long, default_value = "0.98")]
        acceptance: f64,

        /// Print the audit as JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Replace one duplicate record's text in a normalized file
    Fix {
        /// Normalized JSON file to rewrite in place
        input: PathBuf,

        /// Index of the record to replace
        #[arg(long)]
        at: usize,

        /// Replacement text
        #[arg(long = "with")]
        replacement: String,
    },

    /// Show file information without writing output
    Info {
        /// Input file path
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Handle default command (inorm <input> [output])
    if cli.command.is_none() {
        if let Some(input) = cli.input {
            return run_normalize(
                &input,
                cli.output.as_deref(),
                PipelineOptions::default(),
            );
        } else {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            return Ok(());
        }
    }

    match cli.command.unwrap() {
        Commands::Normalize {
            input,
            output,
            category,
            no_dedupe,
            threshold,
            keep_attempts,
        } => {
            let mut options = PipelineOptions::default()
                .with_dedup(!no_dedupe)
                .with_behavioral_category(category);
            options.dedup.near_threshold = threshold;
            if keep_attempts {
                options = options.keep_failed_repairs();
            }
            run_normalize(&input, output.as_deref(), options)?;
        }

        Commands::Audit {
            input,
            threshold,
            acceptance,
            json,
        } => {
            run_audit(&input, threshold, acceptance, json)?;
        }

        Commands::Fix {
            input,
            at,
            replacement,
        } => {
            run_fix(&input, at, &replacement)?;
        }

        Commands::Info { input } => {
            run_info(&input)?;
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn run_normalize(
    input: &Path,
    output: Option<&Path>,
    options: PipelineOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    if input.is_dir() {
        return run_normalize_dir(input, output, options);
    }

    let pb = create_spinner("Normalizing...");
    let report = inorm::process_file(input, &options)?;

    let out_path = match output {
        Some(p) => p.to_path_buf(),
        None => {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            input
                .parent()
                .unwrap_or(Path::new("."))
                .join(format!("{}_normalized.json", stem))
        }
    };
    inorm::render_to_file(&report.document, &out_path)?;
    pb.finish_and_clear();

    println!(
        "{} Normalized {} -> {}",
        "✓".green().bold(),
        input.display(),
        out_path.display()
    );

    let mut summary = BatchSummary {
        files_processed: 1,
        records_extracted: report.record_count(),
        ..Default::default()
    };
    if let Some(ref dedup) = report.dedup {
        summary.duplicates_found = dedup.duplicate_count();
        summary.uniqueness_score = Some(dedup.uniqueness_score);
    }
    if report.topic.is_none() {
        summary
            .unresolved_topics
            .push(input.to_string_lossy().into_owned());
    }
    print_summary(&summary);
    Ok(())
}

fn run_normalize_dir(
    input: &Path,
    output: Option<&Path>,
    options: PipelineOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = match output {
        Some(p) => p.to_path_buf(),
        None => {
            let name = input.file_name().unwrap_or_default().to_string_lossy();
            input
                .parent()
                .unwrap_or(Path::new("."))
                .join(format!("{}_normalized", name))
        }
    };

    let pb = create_spinner("Processing batch...");
    let batch = inorm::run_batch(input, &options)?;

    fs::create_dir_all(&output_dir)?;
    for report in &batch.files {
        let stem = report.path.file_stem().unwrap_or_default().to_string_lossy();
        let out_path = output_dir.join(format!("{}_normalized.json", stem));
        inorm::render_to_file(&report.document, &out_path)?;
    }
    pb.finish_and_clear();

    println!("{}", "Normalization Complete".green().bold());
    println!("{}", "─".repeat(40));
    println!("{}: {}", "Output".bold(), output_dir.display());
    print_summary(&batch.summary);
    Ok(())
}

fn run_audit(
    input: &Path,
    threshold: f64,
    acceptance: f64,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = PipelineOptions::default().with_dedup(true);
    options.dedup.near_threshold = threshold;
    options.dedup.acceptance_score = acceptance;

    let pb = create_spinner("Auditing...");
    let reports: Vec<(PathBuf, inorm::FileReport)> = if input.is_dir() {
        let batch = inorm::run_batch(input, &options)?;
        pb.finish_and_clear();
        print_summary(&batch.summary);
        batch
            .files
            .into_iter()
            .map(|r| (r.path.clone(), r))
            .collect()
    } else {
        let report = inorm::process_file(input, &options)?;
        pb.finish_and_clear();
        vec![(input.to_path_buf(), report)]
    };

    if json {
        let audits: Vec<&DedupReport> =
            reports.iter().filter_map(|(_, r)| r.dedup.as_ref()).collect();
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", serde_json::to_string_pretty(&audits)?)?;
        return Ok(());
    }

    for (path, report) in &reports {
        let Some(ref dedup) = report.dedup else {
            continue;
        };

        println!();
        println!("{}", path.display().to_string().cyan().bold());
        println!("{}", "─".repeat(40));
        for set in &dedup.sets {
            let kind = if set.similarity >= 1.0 {
                "exact".red()
            } else {
                "near".yellow()
            };
            println!(
                "  {} x{} ({:.3}): {}",
                kind,
                set.len(),
                set.similarity,
                truncate(&set.canonical_text, 60)
            );
            for location in &set.locations {
                println!("      at {}[{}]", location.source, location.index);
            }
        }
        let verdict = if dedup.meets(acceptance) {
            "PASS".green().bold()
        } else {
            "BELOW BAR".yellow().bold()
        };
        println!(
            "  {} uniqueness {:.2}% (bar {:.2}%)",
            verdict,
            dedup.uniqueness_score * 100.0,
            acceptance * 100.0
        );
    }

    Ok(())
}

fn run_fix(input: &Path, at: usize, replacement: &str) -> Result<(), Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(input)?;
    let mut document: NormalizedDocument = serde_json::from_str(&raw)?;

    eliminate(
        &mut document.behavioral_insights,
        at,
        replacement,
        &inorm::DedupOptions::default(),
    )?;

    // Full render before the write; a failure leaves the file untouched
    let rendered = render_document(&document)?;
    fs::write(input, rendered)?;

    println!(
        "{} Replaced record {} in {}",
        "✓".green().bold(),
        at,
        input.display()
    );
    Ok(())
}

fn run_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let pb = create_spinner("Analyzing...");
    let report = inorm::process_file(input, &PipelineOptions::default())?;
    pb.finish_and_clear();

    println!("{}", "File Information".cyan().bold());
    println!("{}", "─".repeat(40));
    println!(
        "{}: {}",
        "File".bold(),
        input.file_name().unwrap_or_default().to_string_lossy()
    );
    println!("{}: {}", "Schema".bold(), report.schema);
    match &report.topic {
        Some(topic) => println!("{}: {}", "Topic".bold(), topic),
        None => println!("{}: {}", "Topic".bold(), "unresolved".yellow()),
    }
    println!("{}: {}", "Records".bold(), report.record_count());
    println!(
        "{}: {}",
        "Repaired".bold(),
        if report.repaired { "yes" } else { "no" }
    );
    if let Some(ref dedup) = report.dedup {
        println!(
            "{}: {:.2}% ({} duplicate sets)",
            "Uniqueness".bold(),
            dedup.uniqueness_score * 100.0,
            dedup.sets.len()
        );
    }
    let compact = render_document_compact(&report.document)?;
    println!("{}: {} bytes", "Output size".bold(), compact.len());

    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("{}", "Summary".cyan().bold());
    println!("{}", "─".repeat(40));
    print!("{}", summary);
}

fn print_version() {
    println!("{} {}", "inorm".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Insight content normalization and deduplication tool");
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
