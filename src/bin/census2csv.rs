//! CLI tool converting a census incident report to CSV
//!
//! # Usage
//!
//! ```bash
//! # Parse the default page range of a PDF, CSV to stdout
//! census2csv report.pdf
//!
//! # Pre-extracted text (pdftotext -layout), explicit range and output
//! census2csv report.txt --text --start-page 20 --end-page 32 -o records.csv
//! ```

use census_parser::{process_file, write_csv, write_csv_file, AssemblerConfig, ParseError};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process;

/// Extract incident records from a three-column census report
#[derive(Parser, Debug)]
#[command(name = "census2csv")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input PDF (or text file with --text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output CSV file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// First page to parse (0-indexed)
    #[arg(long, default_value = "20")]
    start_page: usize,

    /// Last page to parse (0-indexed, inclusive)
    #[arg(long, default_value = "32")]
    end_page: usize,

    /// Treat the input as form-feed separated text instead of a PDF
    #[arg(long)]
    text: bool,

    /// Prefix every fragment with its page and line number
    #[arg(long)]
    annotate: bool,
}

fn run(args: &Args) -> Result<(), ParseError> {
    let config = AssemblerConfig {
        annotate_lines: args.annotate,
        ..AssemblerConfig::with_pages(args.start_page, args.end_page)
    };

    let result = process_file(&args.input, &config, args.text)?;
    eprintln!(
        "Parsed {} records from {} pages in {}ms",
        result.records.len(),
        result.pages_processed,
        result.processing_time_ms
    );

    match &args.output {
        Some(path) => {
            write_csv_file(&result.records, path)?;
            eprintln!("CSV written to: {}", path.display());
        }
        None => write_csv(&result.records, io::stdout().lock())?,
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
