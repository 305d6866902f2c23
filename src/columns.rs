//! Column recovery for three-column page lines
//!
//! The census pages print incidents in three fixed-width columns. Layout-mode
//! text extraction normally keeps a wide whitespace gap between columns, but
//! on some rows a boundary collapses to a single space. This module splits a
//! raw line into its three columns and recovers those hidden boundaries using
//! the known physical column widths.

use once_cell::sync::Lazy;
use regex::Regex;

/// Narrowest plausible single column, in characters. Fragments longer than
/// this may hide a column boundary.
pub const MIN_COLUMN_WIDTH: usize = 42;

/// Character offset at which the third column begins when all three
/// columns were merged into one fragment.
pub const THIRD_COLUMN_OFFSET: usize = 92;

/// Text past a column offset that is at most this long is treated as noise
/// (a wrapped word, a stray digit) rather than a hidden column.
pub const NOISE_FLOOR: usize = 5;

/// A line with two declared columns shorter than this holds columns 1 and 2;
/// at or above it the middle column is empty and the line holds 1 and 3.
pub const TWO_COLUMN_LINE_WIDTH: usize = 96;

/// Longest whitespace run collapsed into a single column delimiter.
pub const MAX_COLUMN_GAP: usize = 52;

static COLUMN_GAP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\s{{2,{}}}", MAX_COLUMN_GAP)).unwrap());

/// The three column fragments recovered from one input line
///
/// Any fragment may be empty. Empty fragments are dropped later by the
/// page assembler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAssignment {
    columns: [String; 3],
}

impl ColumnAssignment {
    pub fn new(first: &str, second: &str, third: &str) -> Self {
        Self {
            columns: [first.to_string(), second.to_string(), third.to_string()],
        }
    }

    /// A line that belongs entirely to the first column
    pub fn single(fragment: &str) -> Self {
        Self::new(fragment, "", "")
    }

    pub fn columns(&self) -> &[String; 3] {
        &self.columns
    }

    pub fn into_columns(self) -> [String; 3] {
        self.columns
    }
}

impl PartialEq<[&str; 3]> for ColumnAssignment {
    fn eq(&self, other: &[&str; 3]) -> bool {
        self.columns.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

/// Outcome of searching one fragment for collapsed column boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenSplit<'a> {
    /// The fragment is a single column (or the tail is noise)
    NotFound,
    /// Two adjacent columns were merged
    Two(&'a str, &'a str),
    /// All three columns were merged
    Three(&'a str, &'a str, &'a str),
}

/// Split one raw page line into its three columns
///
/// Never fails: a line that cannot be split confidently comes back as a
/// first-column fragment padded with empty columns.
pub fn split_line(line: &str) -> ColumnAssignment {
    // The layout engine indents some lines by exactly one space
    let line = line.strip_prefix(' ').unwrap_or(line);
    let fragments = declared_columns(line);
    resolve_columns(&fragments, line.chars().count())
}

/// Split a line on wide whitespace gaps
///
/// Trailing gaps carry no column information, so empty trailing fragments
/// are discarded when the line would otherwise exceed three columns. Any
/// fragments beyond the third are folded into it.
pub fn declared_columns(line: &str) -> Vec<String> {
    let mut fragments: Vec<&str> = COLUMN_GAP_RE.split(line).collect();
    if fragments.len() <= 3 {
        return fragments.into_iter().map(str::to_string).collect();
    }

    while fragments.len() > 3 && fragments.last().is_some_and(|f| f.is_empty()) {
        fragments.pop();
    }

    let mut columns: Vec<String> = fragments.iter().take(2).map(|f| f.to_string()).collect();
    if fragments.len() > 2 {
        columns.push(join_columns(&fragments[2..]));
    }
    columns
}

fn resolve_columns(fragments: &[String], line_len: usize) -> ColumnAssignment {
    match fragments {
        [first, second, third] => ColumnAssignment::new(first, second, third),
        [only] => match find_hidden_split(only) {
            HiddenSplit::NotFound => ColumnAssignment::single(only),
            HiddenSplit::Two(a, b) => ColumnAssignment::new(a, b, ""),
            HiddenSplit::Three(a, b, c) => ColumnAssignment::new(a, b, c),
        },
        [first, second] => {
            match find_hidden_split(first) {
                HiddenSplit::Two(a, b) => return ColumnAssignment::new(a, b, second),
                HiddenSplit::Three(a, b, c) => {
                    return ColumnAssignment::new(a, b, &join_columns(&[c, second.as_str()]))
                }
                HiddenSplit::NotFound => {}
            }
            match find_hidden_split(second) {
                HiddenSplit::Two(b, c) => ColumnAssignment::new(first, b, c),
                HiddenSplit::Three(b, c, overflow) => {
                    ColumnAssignment::new(first, b, &join_columns(&[c, overflow]))
                }
                HiddenSplit::NotFound if line_len < TWO_COLUMN_LINE_WIDTH => {
                    ColumnAssignment::new(first, second, "")
                }
                HiddenSplit::NotFound => ColumnAssignment::new(first, "", second),
            }
        }
        // declared_columns never yields zero or more than three fragments
        _ => ColumnAssignment::single(&join_columns(fragments)),
    }
}

/// Look for column boundaries that collapsed to a single space
///
/// Fragments of `MIN_COLUMN_WIDTH` characters or fewer are never split.
pub fn find_hidden_split(fragment: &str) -> HiddenSplit<'_> {
    let len = fragment.chars().count();
    if len <= MIN_COLUMN_WIDTH {
        return HiddenSplit::NotFound;
    }

    let Some(first) = whitespace_from(fragment, MIN_COLUMN_WIDTH) else {
        return HiddenSplit::NotFound;
    };

    if len > THIRD_COLUMN_OFFSET && len - THIRD_COLUMN_OFFSET > NOISE_FLOOR {
        let head = &fragment[..first.byte];
        let rest = &fragment[first.after()..];
        let second = whitespace_from(fragment, THIRD_COLUMN_OFFSET.max(first.index + 1));
        return match second {
            Some(second) => {
                log::trace!("three-column merge at {} and {}", first.index, second.index);
                HiddenSplit::Three(
                    head,
                    &fragment[first.after()..second.byte],
                    &fragment[second.after()..],
                )
            }
            None => {
                log::trace!("two-column merge at {} (no third boundary)", first.index);
                HiddenSplit::Two(head, rest)
            }
        };
    }

    if len - MIN_COLUMN_WIDTH <= NOISE_FLOOR {
        return HiddenSplit::NotFound;
    }

    log::trace!("two-column merge at {}", first.index);
    HiddenSplit::Two(&fragment[..first.byte], &fragment[first.after()..])
}

/// Position of a whitespace character within a fragment
#[derive(Debug, Clone, Copy)]
struct Boundary {
    /// Character index
    index: usize,
    /// Byte offset of the whitespace character
    byte: usize,
    /// Encoded length of the whitespace character
    width: usize,
}

impl Boundary {
    fn after(self) -> usize {
        self.byte + self.width
    }
}

/// First whitespace character at or after character index `from`
fn whitespace_from(text: &str, from: usize) -> Option<Boundary> {
    text.char_indices()
        .enumerate()
        .skip(from)
        .find(|(_, (_, c))| c.is_whitespace())
        .map(|(index, (byte, c))| Boundary {
            index,
            byte,
            width: c.len_utf8(),
        })
}

fn join_columns<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
