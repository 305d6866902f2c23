//! Page reassembly into a single reading-order stream
//!
//! Each page line is split into three columns and appended to per-column
//! buffers. When the page is done, column 1 is read top to bottom, then
//! column 2, then column 3. Pages are concatenated in order.

use crate::columns::{split_line, ColumnAssignment};
use crate::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// The raw text lines of one page, as produced by the text extractor
pub type PageText = Vec<String>;

static PAGE_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:PAGE|P A G E) \d+").unwrap());

/// Configuration for page assembly
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// First page to assemble (0-indexed, inclusive)
    pub start_page: usize,
    /// Last page to assemble (0-indexed, inclusive)
    pub end_page: usize,
    /// Leading lines of the start page copied verbatim into column 1
    pub title_lines: usize,
    /// Prefix every fragment with its page and line number
    pub annotate_lines: bool,
}

impl Default for AssemblerConfig {
    /// Page range of the incident listing in the Arizona census report
    fn default() -> Self {
        Self {
            start_page: 20,
            end_page: 32,
            title_lines: 4,
            annotate_lines: false,
        }
    }
}

impl AssemblerConfig {
    pub fn with_pages(start_page: usize, end_page: usize) -> Self {
        Self {
            start_page,
            end_page,
            ..Self::default()
        }
    }

    /// Check the page range against a document's page count
    pub fn validate(&self, page_count: usize) -> Result<(), ParseError> {
        if self.start_page > self.end_page {
            return Err(ParseError::InvalidPageRange {
                start: self.start_page,
                end: self.end_page,
            });
        }
        if self.end_page >= page_count {
            return Err(ParseError::PageOutOfRange {
                page: self.end_page,
                page_count,
            });
        }
        Ok(())
    }

    /// Decide what the assembler does with line `line_no` of page `page_index`
    pub fn route_line(&self, page_index: usize, line_no: usize, raw: &str) -> LineRoute {
        let line = raw.strip_prefix(' ').unwrap_or(raw);
        if is_page_marker(line) {
            return LineRoute::PageMarker;
        }
        // Page markers still count toward the title lines
        if page_index == self.start_page && line_no < self.title_lines {
            return LineRoute::Title(line.to_string());
        }
        LineRoute::Columns(split_line(raw))
    }
}

/// Where one raw page line ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRoute {
    /// Dropped
    PageMarker,
    /// Copied verbatim into column 1
    Title(String),
    Columns(ColumnAssignment),
}

/// Lines such as `PAGE 21` or `P A G E 21` carry no column data
pub fn is_page_marker(line: &str) -> bool {
    PAGE_MARKER_RE.is_match(line)
}

/// The reassembled text of a page range
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStream {
    text: String,
}

impl DocumentStream {
    pub fn as_str(&self) -> &str {
        &self.text
    }

}

impl fmt::Display for DocumentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Column buffers for the page currently being assembled
#[derive(Debug, Default)]
struct ColumnBuffers {
    columns: [Vec<String>; 3],
}

impl ColumnBuffers {
    fn push_title(&mut self, line: String) {
        self.columns[0].push(line);
    }

    fn push(&mut self, fragments: [String; 3]) {
        for (buffer, fragment) in self.columns.iter_mut().zip(fragments) {
            buffer.push(fragment);
        }
    }

    /// Column 1, then column 2, then column 3, without empty fragments
    fn into_page_text(self) -> String {
        self.columns
            .into_iter()
            .flatten()
            .filter(|fragment| !fragment.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Accumulates pages, in reading order, into a [`DocumentStream`]
#[derive(Debug)]
pub struct PageAssembler {
    config: AssemblerConfig,
    stream: String,
    pages: usize,
}

impl PageAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self {
            config,
            stream: String::new(),
            pages: 0,
        }
    }

    /// Assemble one page and append it to the stream
    ///
    /// Pages must be pushed in document order.
    pub fn push_page<S: AsRef<str>>(&mut self, page_index: usize, lines: &[S]) {
        let mut buffers = ColumnBuffers::default();

        for (line_no, raw) in lines.iter().enumerate() {
            match self.config.route_line(page_index, line_no, raw.as_ref()) {
                LineRoute::PageMarker => {}
                LineRoute::Title(line) => {
                    buffers.push_title(self.annotate(line, page_index, line_no));
                }
                LineRoute::Columns(columns) => {
                    let fragments = columns
                        .into_columns()
                        .map(|fragment| self.annotate(fragment, page_index, line_no));
                    buffers.push(fragments);
                }
            }
        }

        let page_text = buffers.into_page_text();
        log::debug!(
            "page {}: {} lines, {} chars",
            page_index,
            lines.len(),
            page_text.len()
        );

        self.stream.push(' ');
        self.stream.push_str(&page_text);
        self.pages += 1;
    }

    fn annotate(&self, fragment: String, page_index: usize, line_no: usize) -> String {
        if self.config.annotate_lines && !fragment.is_empty() {
            format!("(Page:{} Line:{}){}", page_index, line_no, fragment)
        } else {
            fragment
        }
    }

    pub fn pages_assembled(&self) -> usize {
        self.pages
    }

    pub fn finish(self) -> DocumentStream {
        DocumentStream { text: self.stream }
    }
}

/// Assemble pages `start..=end` of a document into one stream
///
/// `pages` holds every page of the document, indexed from 0.
pub fn assemble<S: AsRef<str>>(
    pages: &[Vec<S>],
    start: usize,
    end: usize,
) -> Result<DocumentStream, ParseError> {
    let config = AssemblerConfig::with_pages(start, end);
    config.validate(pages.len())?;

    let mut assembler = PageAssembler::new(config);
    for (index, lines) in pages.iter().enumerate().take(end + 1).skip(start) {
        assembler.push_page(index, lines);
    }
    Ok(assembler.finish())
}
