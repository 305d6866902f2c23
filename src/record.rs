//! Field extraction for a single incident record
//!
//! A record span looks like
//!
//! ```text
//! PHOENIX, JAN 1, 2013 <narrative> Shooter Suicide: Yes Shooter DV History: ...
//! ```
//!
//! The header gives the location and date. The narrative runs up to the
//! `Shooter Suicide:` marker, and everything after it is the classification
//! block holding six labelled values.

use crate::segmenter::HEADER_PATTERN;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::Serialize;

/// Phrase that opens the classification block
pub const CLASSIFICATION_MARKER: &str = "Shooter Suicide:";

/// Value used when the classification block lacks a label
pub const NOT_AVAILABLE: &str = "N/A";

static ANCHORED_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{} ?", HEADER_PATTERN)).unwrap());

/// One labelled value in the classification block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    ShooterSuicide,
    DvHistory,
    PriorConvictions,
    OrderOfProtection,
    FirearmSurrender,
    FederalProhibition,
}

impl Classification {
    pub const ALL: [Self; 6] = [
        Self::ShooterSuicide,
        Self::DvHistory,
        Self::PriorConvictions,
        Self::OrderOfProtection,
        Self::FirearmSurrender,
        Self::FederalProhibition,
    ];

    /// Label as it appears in current editions of the report
    pub const fn canonical(self) -> &'static str {
        match self {
            Self::ShooterSuicide => "Shooter Suicide",
            Self::DvHistory => "Shooter DV History",
            Self::PriorConvictions => "Shooter Had Prior Convictions",
            Self::OrderOfProtection => "Order of Protection",
            Self::FirearmSurrender => "Order Required Shooter to Turn in Firearms",
            Self::FederalProhibition => "Fed. Prohib. from Owning Firearms",
        }
    }

    /// Label used by older editions of the report
    pub const fn legacy(self) -> Option<&'static str> {
        match self {
            Self::DvHistory => Some("Shooter Domestic Violence History"),
            Self::PriorConvictions => Some("Had Prior Convictions"),
            Self::FederalProhibition => Some("Fed Prohibited / Owning Firearms"),
            _ => None,
        }
    }

    /// Column name in the exported table
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::ShooterSuicide => "shooter_suicide",
            Self::DvHistory => "dv_history",
            Self::PriorConvictions => "prior_convict",
            Self::OrderOfProtection => "order_of_protect",
            Self::FirearmSurrender => "require_turn_in_firearm",
            Self::FederalProhibition => "fed_prohib",
        }
    }

    pub fn labels(self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.canonical()).chain(self.legacy())
    }
}

/// Compiled label and value patterns for one classification
struct ClassificationPattern {
    kind: Classification,
    /// Either label variant; the canonical one is tried first
    label: Regex,
    /// `<canonical>: <value>` up to the next line break
    value: Regex,
}

static CLASSIFICATION_PATTERNS: Lazy<Vec<ClassificationPattern>> = Lazy::new(|| {
    Classification::ALL
        .iter()
        .map(|&kind| {
            let label = kind
                .labels()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join("|");
            ClassificationPattern {
                kind,
                label: Regex::new(&label).unwrap(),
                value: Regex::new(&format!(
                    r"{}: (.*?) ?(?:\n|$)",
                    regex::escape(kind.canonical())
                ))
                .unwrap(),
            }
        })
        .collect()
});

/// A structured incident record
///
/// `None` means the value was never looked for (no header, or no
/// classification block). `Some("N/A")` means the classification block was
/// present but lacked that label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Text")]
    pub text: String,
    pub shooter_suicide: Option<String>,
    pub dv_history: Option<String>,
    pub prior_convict: Option<String>,
    pub order_of_protect: Option<String>,
    pub require_turn_in_firearm: Option<String>,
    pub fed_prohib: Option<String>,
}

impl Record {
    /// Column names in export order
    pub const HEADERS: [&'static str; 9] = [
        "Location",
        "Date",
        "Text",
        "shooter_suicide",
        "dv_history",
        "prior_convict",
        "order_of_protect",
        "require_turn_in_firearm",
        "fed_prohib",
    ];

    /// A span without a header: only the text is known
    pub fn text_only(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn has_header(&self) -> bool {
        self.location.is_some()
    }

    pub fn classification(&self, kind: Classification) -> Option<&str> {
        self.slot(kind).as_deref()
    }

    fn set_classification(&mut self, kind: Classification, value: String) {
        *self.slot_mut(kind) = Some(value);
    }

    fn slot(&self, kind: Classification) -> &Option<String> {
        match kind {
            Classification::ShooterSuicide => &self.shooter_suicide,
            Classification::DvHistory => &self.dv_history,
            Classification::PriorConvictions => &self.prior_convict,
            Classification::OrderOfProtection => &self.order_of_protect,
            Classification::FirearmSurrender => &self.require_turn_in_firearm,
            Classification::FederalProhibition => &self.fed_prohib,
        }
    }

    fn slot_mut(&mut self, kind: Classification) -> &mut Option<String> {
        match kind {
            Classification::ShooterSuicide => &mut self.shooter_suicide,
            Classification::DvHistory => &mut self.dv_history,
            Classification::PriorConvictions => &mut self.prior_convict,
            Classification::OrderOfProtection => &mut self.order_of_protect,
            Classification::FirearmSurrender => &mut self.require_turn_in_firearm,
            Classification::FederalProhibition => &mut self.fed_prohib,
        }
    }
}

/// Parse one record span into a [`Record`]
pub fn extract_record(span: &str) -> Record {
    let Some(caps) = ANCHORED_HEADER_RE.captures(span) else {
        return Record::text_only(span);
    };

    let header_end = caps.get(0).map_or(0, |m| m.end());
    let body = &span[header_end..];
    let mut record = Record {
        location: caps.get(1).map(|m| m.as_str().trim().to_string()),
        date: caps.get(2).map(|m| m.as_str().trim().to_string()),
        text: body.to_string(),
        ..Record::default()
    };

    let Some(marker) = body.find(CLASSIFICATION_MARKER) else {
        return record;
    };

    record.text = body[..marker].trim_end().to_string();
    let block = normalize_block(&body[marker..]);
    for pattern in CLASSIFICATION_PATTERNS.iter() {
        let value = classification_value(pattern, &block);
        record.set_classification(pattern.kind, value);
    }
    record
}

/// Put every classification after the first on its own line, under its
/// canonical label
fn normalize_block(block: &str) -> String {
    let mut normalized = block.to_string();
    for pattern in CLASSIFICATION_PATTERNS.iter().skip(1) {
        let replacement = format!("\n{}", pattern.kind.canonical());
        normalized = pattern
            .label
            .replace_all(&normalized, NoExpand(&replacement))
            .into_owned();
    }
    normalized
}

fn classification_value(pattern: &ClassificationPattern, block: &str) -> String {
    if !block.contains(pattern.kind.canonical()) {
        return NOT_AVAILABLE.to_string();
    }
    pattern
        .value
        .captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
