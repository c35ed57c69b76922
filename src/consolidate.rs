use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, instrument};

use crate::error::{Result, ToolError};
use crate::extract::RawMetricEntry;
use crate::model::{Category, MetricRecord, Origin, normalize};

/// Minimum token-overlap ratio (Jaccard, over normalized display-name tokens)
/// at which two records in the same category are treated as the same metric.
pub const NEAR_DUPLICATE_CUTOFF: f64 = 0.6;

/// One decision taken while merging the two extraction origins. The audit
/// log is returned alongside the consolidated records so callers can inspect
/// every merge regardless of how they frame the outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEntry {
    /// A later entry carried an identifier already retained.
    ExactMerge { identifier: String, origin: Origin },
    /// Two distinct identifiers in the same category were close enough to
    /// treat as one metric. The earlier record is kept.
    NearDuplicateMerge {
        kept: String,
        absorbed: String,
        similarity: f64,
        category: Category,
    },
    /// Both origins suggested a category and they disagreed; the regulatory
    /// suggestion was retained.
    CategoryConflict {
        identifier: String,
        regulatory: Category,
        investor: Category,
    },
    /// A suggestion label did not map onto the taxonomy and the record fell
    /// into the default bucket.
    UnrecognizedCategory {
        identifier: String,
        label: String,
        origin: Origin,
    },
    /// An extraction origin failed or returned nothing and was treated as an
    /// empty sequence.
    OriginDegraded { origin: Origin, reason: String },
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEntry::ExactMerge { identifier, origin } => {
                write!(f, "merged duplicate identifier '{identifier}' from {origin}")
            }
            AuditEntry::NearDuplicateMerge {
                kept,
                absorbed,
                similarity,
                category,
            } => write!(
                f,
                "near-duplicate '{absorbed}' absorbed into '{kept}' (similarity {similarity:.2}, {category})"
            ),
            AuditEntry::CategoryConflict {
                identifier,
                regulatory,
                investor,
            } => write!(
                f,
                "category conflict for '{identifier}': regulatory={regulatory}, investor={investor}; regulatory retained"
            ),
            AuditEntry::UnrecognizedCategory {
                identifier,
                label,
                origin,
            } => write!(
                f,
                "unrecognized category label '{label}' for '{identifier}' from {origin}; defaulted to {}",
                Category::DEFAULT
            ),
            AuditEntry::OriginDegraded { origin, reason } => {
                write!(f, "origin {origin} degraded to empty: {reason}")
            }
        }
    }
}

/// Result of one consolidation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Consolidation {
    /// Deduplicated records in first-appearance order.
    pub records: Vec<MetricRecord>,
    /// Every merge and category decision, in the order it was taken.
    pub audit: Vec<AuditEntry>,
}

/// Working state for one identifier during the scan phase. The category on
/// the inner record is provisional until the suggestions are resolved.
struct Slot {
    record: MetricRecord,
    suggestions: BTreeMap<Origin, Category>,
}

/// Merges the regulatory and investor extraction lists into one
/// deduplicated, categorized collection.
///
/// The regulatory sequence is scanned first, then the investor sequence, in
/// original order; the first sighting of an identifier fixes the record's
/// position and display name. Category suggestions are resolved with the
/// regulatory side winning conflicts, then a second pass merges
/// near-duplicate display names within each category.
#[instrument(level = "debug", skip_all, fields(regulatory = regulatory.len(), investor = investor.len()))]
pub fn consolidate(
    regulatory: &[RawMetricEntry],
    investor: &[RawMetricEntry],
) -> Result<Consolidation> {
    if regulatory.is_empty() && investor.is_empty() {
        return Err(ToolError::EmptyInput);
    }

    let mut audit: Vec<AuditEntry> = Vec::new();
    let mut order: Vec<String> = Vec::new();
    let mut retained: BTreeMap<String, Slot> = BTreeMap::new();

    for (origin, entries) in [
        (Origin::Regulatory, regulatory),
        (Origin::Investor, investor),
    ] {
        for entry in entries {
            let identifier = normalize(&entry.name);
            let suggestion = resolve_suggestion(entry, &identifier, origin, &mut audit);
            let incoming = MetricRecord::from_raw(
                origin,
                &entry.name,
                entry.description.as_deref(),
                suggestion.unwrap_or(Category::DEFAULT),
            );

            match retained.entry(identifier.clone()) {
                Entry::Occupied(mut occupied) => {
                    audit.push(AuditEntry::ExactMerge {
                        identifier,
                        origin,
                    });
                    let slot = occupied.get_mut();
                    slot.record = MetricRecord::merge(&slot.record, &incoming);
                    if let Some(category) = suggestion {
                        slot.suggestions.entry(origin).or_insert(category);
                    }
                }
                Entry::Vacant(vacant) => {
                    let mut suggestions = BTreeMap::new();
                    if let Some(category) = suggestion {
                        suggestions.insert(origin, category);
                    }
                    order.push(identifier);
                    vacant.insert(Slot {
                        record: incoming,
                        suggestions,
                    });
                }
            }
        }
    }

    let mut records: Vec<MetricRecord> = Vec::with_capacity(order.len());
    for identifier in &order {
        let slot = retained
            .remove(identifier)
            .ok_or_else(|| ToolError::CategoryTaxonomy(format!("lost identifier '{identifier}'")))?;
        records.push(resolve_category(slot, identifier, &mut audit));
    }

    let records = merge_near_duplicates(records, &mut audit);
    debug!(record_count = records.len(), decisions = audit.len(), "consolidation complete");

    Ok(Consolidation { records, audit })
}

fn resolve_suggestion(
    entry: &RawMetricEntry,
    identifier: &str,
    origin: Origin,
    audit: &mut Vec<AuditEntry>,
) -> Option<Category> {
    let label = entry.category.as_deref()?.trim();
    if label.is_empty() {
        return None;
    }
    match Category::from_label(label) {
        Some(category) => Some(category),
        None => {
            audit.push(AuditEntry::UnrecognizedCategory {
                identifier: identifier.to_string(),
                label: label.to_string(),
                origin,
            });
            None
        }
    }
}

/// Applies the category tie-break: regulatory wins a disagreement, a lone
/// suggestion is taken as-is, and no suggestion lands in the default bucket.
fn resolve_category(slot: Slot, identifier: &str, audit: &mut Vec<AuditEntry>) -> MetricRecord {
    let regulatory = slot.suggestions.get(&Origin::Regulatory).copied();
    let investor = slot.suggestions.get(&Origin::Investor).copied();

    if let (Some(reg), Some(inv)) = (regulatory, investor) {
        if reg != inv {
            audit.push(AuditEntry::CategoryConflict {
                identifier: identifier.to_string(),
                regulatory: reg,
                investor: inv,
            });
        }
    }

    let mut record = slot.record;
    record.category = regulatory.or(investor).unwrap_or(Category::DEFAULT);
    record
}

/// Second dedup pass: records whose normalized display names overlap at or
/// above the cutoff merge, but only within the same category. Same-named
/// metrics with different regulatory intent in different categories stay
/// separate.
fn merge_near_duplicates(
    records: Vec<MetricRecord>,
    audit: &mut Vec<AuditEntry>,
) -> Vec<MetricRecord> {
    let mut merged: Vec<MetricRecord> = Vec::with_capacity(records.len());

    for record in records {
        let mut absorbed = false;
        for kept in merged.iter_mut() {
            if kept.category != record.category {
                continue;
            }
            let similarity = token_overlap(&kept.display_name, &record.display_name);
            if similarity >= NEAR_DUPLICATE_CUTOFF {
                audit.push(AuditEntry::NearDuplicateMerge {
                    kept: kept.identifier.clone(),
                    absorbed: record.identifier.clone(),
                    similarity,
                    category: kept.category,
                });
                *kept = MetricRecord::merge(kept, &record);
                absorbed = true;
                break;
            }
        }
        if !absorbed {
            merged.push(record);
        }
    }

    merged
}

/// Jaccard ratio over the normalized token sets of two display names.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let norm_a = normalize(a);
    let norm_b = normalize(b);
    let tokens_a: BTreeSet<&str> = norm_a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = norm_b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f64 / union as f64
}
