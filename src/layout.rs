use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::error::{Result, ToolError};
use crate::model::{Category, MetricRecord, Origin};

/// Sheet holding the run totals. Always emitted, always first.
pub const SUMMARY_SHEET: &str = "Summary";

/// Fixed column schema of every per-category data-capture sheet. The last
/// column is left blank for the end user to fill in.
pub const REPORT_COLUMNS: [&str; 6] = [
    "Metric Name",
    "Description",
    "Required By",
    "Category",
    "Source Detail",
    "Captured Value",
];

/// Column schema of the summary sheet.
pub const SUMMARY_COLUMNS: [&str; 3] = ["Kind", "Name", "Count"];

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// All tables required to materialise the report workbook, in sheet order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub tables: Vec<SheetTable>,
}

/// Maps the consolidated collection into the report's sheet structure.
///
/// The summary table comes first, followed by one table per non-empty
/// category in taxonomy order. Row order within a category preserves the
/// consolidated collection's order; nothing is re-sorted. An empty
/// collection yields a summary-only layout with zero counts.
#[instrument(level = "debug", skip_all, fields(record_count = records.len()))]
pub fn build_report(records: &[MetricRecord]) -> Result<ReportLayout> {
    let mut buckets: BTreeMap<Category, Vec<&MetricRecord>> = BTreeMap::new();
    for record in records {
        buckets.entry(record.category).or_default().push(record);
    }

    let grouped: usize = buckets.values().map(Vec::len).sum();
    if grouped != records.len() {
        return Err(ToolError::CategoryTaxonomy(format!(
            "grouped {grouped} records out of {}",
            records.len()
        )));
    }

    let mut tables = vec![build_summary(records)];
    for category in Category::ALL {
        let Some(bucket) = buckets.get(&category) else {
            continue;
        };
        if bucket.is_empty() {
            continue;
        }
        tables.push(SheetTable {
            sheet_name: sanitize_sheet_name(category.label()),
            columns: REPORT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: bucket.iter().map(|record| metric_row(record)).collect(),
        });
    }

    if !records.is_empty() && tables.len() == 1 {
        return Err(ToolError::EmptyCategory);
    }

    debug!(sheet_count = tables.len(), "report layout constructed");
    Ok(ReportLayout { tables })
}

/// Run totals: the overall metric count, a zero-inclusive count per taxonomy
/// category, and a count per extraction origin.
fn build_summary(records: &[MetricRecord]) -> SheetTable {
    let mut rows = vec![vec![
        "total".to_string(),
        "Metrics".to_string(),
        records.len().to_string(),
    ]];

    for category in Category::ALL {
        let count = records.iter().filter(|r| r.category == category).count();
        rows.push(vec![
            "category".to_string(),
            category.label().to_string(),
            count.to_string(),
        ]);
    }

    for origin in Origin::ALL {
        let count = records.iter().filter(|r| r.sources.contains(&origin)).count();
        rows.push(vec![
            "origin".to_string(),
            origin.label().to_string(),
            count.to_string(),
        ]);
    }

    SheetTable {
        sheet_name: SUMMARY_SHEET.to_string(),
        columns: SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

fn metric_row(record: &MetricRecord) -> Vec<String> {
    vec![
        record.display_name.clone(),
        record.description.clone(),
        required_by(record),
        record.category.label().to_string(),
        source_detail(record),
        String::new(),
    ]
}

/// Comma-joined origin labels, regulatory first.
fn required_by(record: &MetricRecord) -> String {
    record
        .sources
        .iter()
        .map(|origin| origin.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Per-origin raw descriptions, labelled and concatenated for audit.
fn source_detail(record: &MetricRecord) -> String {
    record
        .source_detail
        .iter()
        .map(|(origin, detail)| format!("{}: {detail}", origin.label()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Replaces characters Excel rejects in sheet names and enforces the 31
/// character limit.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']', '\'', '"'];
    let mut sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    sanitized = sanitized.trim().to_string();
    if sanitized.is_empty() {
        sanitized = "Sheet".to_string();
    }

    if sanitized.chars().count() > 31 {
        sanitized = sanitized.chars().take(31).collect();
    }

    sanitized
}
