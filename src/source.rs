//! Page sources: where raw page lines come from
//!
//! Pages are addressed by 0-based index. Two sources are provided: PDF
//! documents rendered through [`crate::extractor`], and pre-extracted text
//! with form-feed page separators (the `pdftotext -layout` format).

use crate::assembler::PageText;
use crate::extractor::{extract_pages, extract_pages_mem, layout_lines, TextItem};
use crate::ParseError;
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Supplies the raw text lines of each page of a document
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Lines of page `index`; fails with [`ParseError::PageOutOfRange`]
    /// past the last page
    fn page_lines(&self, index: usize) -> Result<PageText, ParseError>;
}

fn check_index(index: usize, page_count: usize) -> Result<(), ParseError> {
    if index >= page_count {
        return Err(ParseError::PageOutOfRange { page: index, page_count });
    }
    Ok(())
}

/// Pages of already-extracted text
#[derive(Debug, Clone, Default)]
pub struct TextPageSource {
    pages: Vec<PageText>,
}

impl TextPageSource {
    /// Split text into pages on form feeds, and pages into lines
    pub fn from_text(text: &str) -> Self {
        let mut pages: Vec<&str> = text.split('\x0c').collect();
        // pdftotext terminates every page, including the last, with a form feed
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }
        Self {
            pages: pages
                .into_iter()
                .map(|page| page.lines().map(str::to_string).collect())
                .collect(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        Ok(Self::from_text(&fs::read_to_string(path)?))
    }

    pub fn from_pages(pages: Vec<PageText>) -> Self {
        Self { pages }
    }
}

impl PageSource for TextPageSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_lines(&self, index: usize) -> Result<PageText, ParseError> {
        check_index(index, self.pages.len())?;
        Ok(self.pages[index].clone())
    }
}

/// Pages of a PDF document, rendered as fixed-pitch layout lines
#[derive(Debug, Clone)]
pub struct PdfPageSource {
    pages: Vec<Vec<TextItem>>,
}

impl PdfPageSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let pages = extract_pages(path)?;
        log::info!("loaded PDF with {} pages", pages.len());
        Ok(Self { pages })
    }

    /// Same as [`PdfPageSource::open`], from a memory buffer
    pub fn open_mem(buffer: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            pages: extract_pages_mem(buffer)?,
        })
    }

    pub fn from_items(pages: Vec<Vec<TextItem>>) -> Self {
        Self { pages }
    }
}

impl PageSource for PdfPageSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_lines(&self, index: usize) -> Result<PageText, ParseError> {
        check_index(index, self.pages.len())?;
        Ok(layout_lines(&self.pages[index]))
    }
}

/// Fetch pages `start..=end`, in page order
///
/// Pages are rendered in parallel; the result keeps document order.
pub fn load_pages<S: PageSource + Sync + ?Sized>(
    source: &S,
    start: usize,
    end: usize,
) -> Result<Vec<PageText>, ParseError> {
    (start..=end)
        .into_par_iter()
        .map(|index| source.page_lines(index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_pages_split_on_form_feed() {
        let source = TextPageSource::from_text("a\nb\n\x0cc\n\x0c");
        assert_eq!(source.page_count(), 2);
        assert_eq!(source.page_lines(0).unwrap(), vec!["a", "b"]);
        assert_eq!(source.page_lines(1).unwrap(), vec!["c"]);
    }

    #[test]
    fn test_text_without_form_feed_is_one_page() {
        let source = TextPageSource::from_text("only\npage");
        assert_eq!(source.page_count(), 1);
    }

    #[test]
    fn test_page_out_of_range() {
        let source = TextPageSource::from_text("one\x0ctwo");
        assert!(matches!(
            source.page_lines(2),
            Err(ParseError::PageOutOfRange {
                page: 2,
                page_count: 2
            })
        ));
    }

    #[test]
    fn test_load_pages_keeps_order() {
        let pages: Vec<PageText> = (0..20).map(|i| vec![format!("page {}", i)]).collect();
        let source = TextPageSource::from_pages(pages);
        let loaded = load_pages(&source, 5, 15).unwrap();
        assert_eq!(loaded.len(), 11);
        for (offset, lines) in loaded.iter().enumerate() {
            assert_eq!(lines[0], format!("page {}", offset + 5));
        }
    }

    #[test]
    fn test_pdf_source_renders_items() {
        let source = PdfPageSource::from_items(vec![vec![
            TextItem::new("PHOENIX,", 0.0, 700.0, 12.0),
            TextItem::new("JAN", 60.0, 700.0, 12.0),
        ]]);
        assert_eq!(source.page_count(), 1);
        assert_eq!(source.page_lines(0).unwrap(), vec!["PHOENIX,  JAN"]);
        assert!(source.page_lines(1).is_err());
    }

    #[test]
    fn test_pdf_source_from_memory() {
        use lopdf::content::Operation;
        use lopdf::Object;

        let pdf = crate::extractor::tests::single_page_pdf(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("TEMPE - FEB 2, 2012")]),
            Operation::new("Td", vec![0.into(), (-14).into()]),
            Operation::new("Tj", vec![Object::string_literal("A shooting")]),
            Operation::new("ET", vec![]),
        ]);

        let source = PdfPageSource::open_mem(&pdf).unwrap();
        assert_eq!(source.page_count(), 1);
        assert_eq!(
            source.page_lines(0).unwrap(),
            vec!["TEMPE - FEB 2, 2012", "A shooting"]
        );
    }
}
