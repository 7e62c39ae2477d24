//! inorm quick converter - normalize one insight content file
//!
//! Usage:
//!   inorm <input.json|md> [output_dir] [--no-dedupe]

use inorm::{render_document, PipelineOptions};
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <input.json|md> [output_dir] [OPTIONS]", args[0]);
        eprintln!();
        eprintln!("Normalizes one insight content file into the canonical JSON shape.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  input       Input JSON or markdown-wrapped JSON file");
        eprintln!("  output_dir  Output directory (default: <input>_output)");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --no-dedupe      Skip the duplicate audit");
        eprintln!("  --keep-attempts  Keep attempted repairs of unparsable files");
        std::process::exit(1);
    }

    let no_dedupe = args.iter().any(|a| a == "--no-dedupe");
    let keep_attempts = args.iter().any(|a| a == "--keep-attempts");

    let positional_args: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let input_path = Path::new(&positional_args[1]);

    if !input_path.exists() {
        eprintln!("Error: Input file not found: {}", input_path.display());
        std::process::exit(1);
    }

    let output_dir = if positional_args.len() > 2 {
        Path::new(positional_args[2]).to_path_buf()
    } else {
        let stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
        input_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(format!("{}_output", stem))
    };

    if let Err(e) = fs::create_dir_all(&output_dir) {
        eprintln!("Error: Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    let mut options = PipelineOptions::default().with_dedup(!no_dedupe);
    if keep_attempts {
        options = options.keep_failed_repairs();
    }

    println!("Normalizing: {}", input_path.display());

    let report = match inorm::process_file(input_path, &options) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: Failed to normalize file: {}", e);
            std::process::exit(1);
        }
    };

    let json = match render_document(&report.document) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: Failed to render output: {}", e);
            std::process::exit(1);
        }
    };

    let stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
    let out_path = output_dir.join(format!("{}_normalized.json", stem));

    if let Err(e) = fs::write(&out_path, &json) {
        eprintln!("Error: Failed to write output file: {}", e);
        std::process::exit(1);
    }

    println!("Schema: {}", report.schema);
    if report.repaired {
        println!("Repair: structural repair applied");
    }
    println!("Records: {}", report.record_count());
    if let Some(ref dedup) = report.dedup {
        println!(
            "Duplicates: {} ({} sets), uniqueness {:.2}%",
            dedup.duplicate_count(),
            dedup.sets.len(),
            dedup.uniqueness_score * 100.0
        );
    }
    println!("Output: {}", out_path.display());
    println!("Done!");
}
