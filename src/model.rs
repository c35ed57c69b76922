use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Extraction origin that asserted a metric requirement.
///
/// Regulatory sources are the higher-authority origin: they are scanned first
/// during consolidation and win conflicting category suggestions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Origin {
    Regulatory,
    Investor,
}

impl Origin {
    pub const ALL: [Origin; 2] = [Origin::Regulatory, Origin::Investor];

    /// Human-readable label used in report cells and log output.
    pub fn label(&self) -> &'static str {
        match self {
            Origin::Regulatory => "Regulatory",
            Origin::Investor => "Investor",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed taxonomy used to group metrics into report sheets.
///
/// Declaration order is the sheet order in the generated workbook.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    Environmental,
    Social,
    Governance,
    /// Default bucket for cross-cutting or unclassified metrics.
    General,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Environmental,
        Category::Social,
        Category::Governance,
        Category::General,
    ];

    /// Bucket assigned when neither origin suggests a recognizable category.
    pub const DEFAULT: Category = Category::General;

    pub fn label(&self) -> &'static str {
        match self {
            Category::Environmental => "Environmental",
            Category::Social => "Social",
            Category::Governance => "Governance",
            Category::General => "General",
        }
    }

    /// Maps a free-form suggestion label onto the taxonomy. Matching is
    /// case-insensitive and tolerates the common aliases seen in extraction
    /// output. Unrecognized labels return `None`; the caller decides whether
    /// to default them.
    pub fn from_label(raw: &str) -> Option<Category> {
        match raw.trim().to_lowercase().as_str() {
            "environmental" | "environment" | "e" => Some(Category::Environmental),
            "social" | "s" => Some(Category::Social),
            "governance" | "g" => Some(Category::Governance),
            "general" | "cross-cutting" | "cross cutting" | "other" => Some(Category::General),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Punctuation characters removed while deriving a metric identifier.
const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '"', '\'', '/', '\\', '-', '_',
    '&', '%', '#', '*', '+', '|',
];

/// Derives the normalized identifier for a raw metric name.
///
/// Case-folds, strips punctuation, and collapses internal whitespace, so that
/// names differing only in those respects map to the same identifier. The
/// function is total: an input that normalizes to nothing (all punctuation,
/// all whitespace) falls back to a deterministic UUIDv5 of the raw string.
pub fn normalize(raw_name: &str) -> String {
    let mut lowered = String::with_capacity(raw_name.len());
    for ch in raw_name.chars() {
        if STRIPPED_PUNCTUATION.contains(&ch) {
            lowered.push(' ');
        } else {
            lowered.extend(ch.to_lowercase());
        }
    }

    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, raw_name.as_bytes());
        format!("urn:uuid:{uuid}")
    } else {
        collapsed
    }
}

/// One consolidated ESG data-capture requirement.
///
/// Records are created by the consolidator and never mutated afterwards;
/// merging two records produces a new one so provenance additions stay
/// traceable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Normalized key, unique within a consolidated collection.
    pub identifier: String,
    /// Human-readable label in its first-seen form.
    pub display_name: String,
    /// Free-text explanation, possibly empty.
    pub description: String,
    /// Assigned taxonomy bucket.
    pub category: Category,
    /// Every origin that asserted this metric. Never empty.
    pub sources: BTreeSet<Origin>,
    /// Original raw description per origin, preserved through merges.
    pub source_detail: BTreeMap<Origin, String>,
}

impl MetricRecord {
    /// Builds a record from one raw extraction entry.
    pub fn from_raw(
        origin: Origin,
        raw_name: &str,
        raw_description: Option<&str>,
        category: Category,
    ) -> Self {
        let description = raw_description.unwrap_or_default().trim().to_string();
        let mut sources = BTreeSet::new();
        sources.insert(origin);
        let mut source_detail = BTreeMap::new();
        if !description.is_empty() {
            source_detail.insert(origin, description.clone());
        }
        Self {
            identifier: normalize(raw_name),
            display_name: raw_name.trim().to_string(),
            description,
            category,
            sources,
            source_detail,
        }
    }

    /// Merges two records that stand for the same metric into a new record.
    ///
    /// Covers both duplicate identifiers and near-duplicate absorption
    /// within a category, where the identifiers differ: the retained
    /// record `a` keeps its identifier and first-seen display name.
    /// `sources` and `source_detail` take the union (existing detail entries
    /// win) and the description keeps the longer of the two (tie goes to
    /// `a`). The category keeps `a`'s value; conflicting suggestions are
    /// resolved by the consolidator before records reach this point.
    pub fn merge(a: &MetricRecord, b: &MetricRecord) -> MetricRecord {
        let description = if b.description.len() > a.description.len() {
            b.description.clone()
        } else {
            a.description.clone()
        };

        let mut sources = a.sources.clone();
        sources.extend(b.sources.iter().copied());

        let mut source_detail = a.source_detail.clone();
        for (origin, detail) in &b.source_detail {
            source_detail.entry(*origin).or_insert_with(|| detail.clone());
        }

        MetricRecord {
            identifier: a.identifier.clone(),
            display_name: a.display_name.clone(),
            description,
            category: a.category,
            sources,
            source_detail,
        }
    }
}
