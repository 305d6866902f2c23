//! Incident record extraction from three-column census reports
//!
//! This crate provides:
//! - Recovery of a reading-order text stream from three-column pages whose
//!   column gaps are sometimes collapsed to a single space
//! - Segmentation of that stream into `LOCATION, MONTH DD, YYYY` records
//! - Field extraction of location, date, narrative and classifications
//! - CSV export of the parsed records

pub mod assembler;
pub mod columns;
pub mod extractor;
pub mod record;
pub mod segmenter;
pub mod sink;
pub mod source;

pub use assembler::{
    assemble, AssemblerConfig, DocumentStream, LineRoute, PageAssembler, PageText,
};
pub use columns::{split_line, ColumnAssignment};
pub use record::{extract_record, Classification, Record, NOT_AVAILABLE};
pub use segmenter::segment;
pub use sink::{write_csv, write_csv_file};
pub use source::{load_pages, PageSource, PdfPageSource, TextPageSource};

use std::path::Path;

/// Result of parsing a page range
#[derive(Debug)]
pub struct ParseResult {
    /// Records in document order
    pub records: Vec<Record>,
    /// Number of pages assembled
    pub pages_processed: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Parse the configured page range of a document into records
///
/// This function will:
/// 1. Validate the page range against the document
/// 2. Load every page of the range up front
/// 3. Reassemble the columns into one stream
/// 4. Split the stream into records and extract their fields
pub fn parse_document<S: PageSource + Sync + ?Sized>(
    source: &S,
    config: &AssemblerConfig,
) -> Result<ParseResult, ParseError> {
    let start = std::time::Instant::now();

    config.validate(source.page_count())?;
    let pages = load_pages(source, config.start_page, config.end_page)?;

    let mut assembler = PageAssembler::new(config.clone());
    for (offset, lines) in pages.iter().enumerate() {
        assembler.push_page(config.start_page + offset, lines);
    }
    let pages_processed = assembler.pages_assembled();
    let stream = assembler.finish();

    let records = parse_stream(stream.as_str());
    log::info!(
        "parsed {} records from pages {}..={}",
        records.len(),
        config.start_page,
        config.end_page
    );

    Ok(ParseResult {
        records,
        pages_processed,
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}

/// Segment an assembled stream and extract every record
pub fn parse_stream(doc: &str) -> Vec<Record> {
    segment(doc).into_iter().map(extract_record).collect()
}

/// Parse a PDF file, or a form-feed separated text file when `as_text` is set
pub fn process_file<P: AsRef<Path>>(
    path: P,
    config: &AssemblerConfig,
    as_text: bool,
) -> Result<ParseResult, ParseError> {
    if as_text {
        parse_document(&TextPageSource::from_path(path)?, config)
    } else {
        parse_document(&PdfPageSource::open(path)?, config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Pdf(String),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },
    #[error("invalid page range: start {start} is after end {end}")]
    InvalidPageRange { start: usize, end: usize },
}

impl From<lopdf::Error> for ParseError {
    fn from(e: lopdf::Error) -> Self {
        ParseError::Pdf(e.to_string())
    }
}

impl From<csv::Error> for ParseError {
    fn from(e: csv::Error) -> Self {
        ParseError::Csv(e.to_string())
    }
}
