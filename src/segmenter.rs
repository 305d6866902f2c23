//! Record segmentation of the assembled document stream
//!
//! Every incident starts with a `LOCATION, MONTH DD, YYYY ` header. The
//! stream is cut immediately before each header.

use once_cell::sync::Lazy;
use regex::Regex;

/// Location and date of a record header, captured as groups 1 and 2.
///
/// Accepts `PHOENIX, JAN 1, 2013`, `MESA, AZ, MAY 5, 2013` and
/// `TUCSON - MARCH 3, 2012`.
pub const HEADER_PATTERN: &str = r"([A-Z ]+),? (?:AZ, |- )?([A-Z]+,? \d+, \d{4})";

static RECORD_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("{} ", HEADER_PATTERN)).unwrap());

/// Split the stream into record spans, in order
///
/// Text before the first header comes back as its own span. When the
/// first header starts at offset 0 (the header's location absorbs the
/// stream's leading space) there is no such text, and no empty span is
/// emitted for it. A stream without any header comes back whole.
pub fn segment(doc: &str) -> Vec<&str> {
    let starts: Vec<usize> = RECORD_START_RE.find_iter(doc).map(|m| m.start()).collect();
    let Some(&first) = starts.first() else {
        log::debug!("no record headers in {} chars", doc.len());
        return vec![doc];
    };

    let mut spans = Vec::with_capacity(starts.len() + 1);
    if first > 0 {
        spans.push(&doc[..first]);
    }
    for pair in starts.windows(2) {
        spans.push(&doc[pair[0]..pair[1]]);
    }
    if let Some(&last) = starts.last() {
        spans.push(&doc[last..]);
    }

    log::debug!("segmented {} record headers", starts.len());
    spans
}
