use calamine::{Reader, Xlsx, open_workbook};
use esg_form_tools::consolidate::{AuditEntry, consolidate};
use esg_form_tools::extract::{ExtractionAdapter, JsonExtractionAdapter, RawMetricEntry};
use esg_form_tools::layout::{REPORT_COLUMNS, SUMMARY_SHEET, build_report, sanitize_sheet_name};
use esg_form_tools::model::Origin;
use esg_form_tools::pipeline;
use esg_form_tools::{Result, ToolError};
use std::fs;
use tempfile::tempdir;

fn sample_regulatory() -> Vec<RawMetricEntry> {
    vec![
        RawMetricEntry::new("GHG Emissions")
            .with_description("Scope 1 and 2")
            .with_category("Environmental"),
        RawMetricEntry::new("Water Usage")
            .with_description("Total municipal water drawn")
            .with_category("Environmental"),
        RawMetricEntry::new("Board Diversity").with_category("Governance"),
    ]
}

fn sample_investor() -> Vec<RawMetricEntry> {
    vec![
        RawMetricEntry::new("ghg emissions").with_description("Total carbon footprint"),
        RawMetricEntry::new("Pay Equity")
            .with_description("Gender pay gap ratio")
            .with_category("Social"),
    ]
}

#[test]
fn no_record_is_lost_or_duplicated_across_tables() {
    let consolidation =
        consolidate(&sample_regulatory(), &sample_investor()).expect("consolidation");
    let layout = build_report(&consolidation.records).expect("layout");

    let data_rows: usize = layout
        .tables
        .iter()
        .filter(|table| table.sheet_name != SUMMARY_SHEET)
        .map(|table| table.rows.len())
        .sum();
    assert_eq!(data_rows, consolidation.records.len());
}

#[test]
fn summary_comes_first_and_counts_every_category() {
    let consolidation =
        consolidate(&sample_regulatory(), &sample_investor()).expect("consolidation");
    let layout = build_report(&consolidation.records).expect("layout");

    let summary = &layout.tables[0];
    assert_eq!(summary.sheet_name, SUMMARY_SHEET);

    // total + four categories + two origins
    assert_eq!(summary.rows.len(), 7);
    assert_eq!(summary.rows[0], ["total", "Metrics", "4"]);

    let category_row = |name: &str| {
        summary
            .rows
            .iter()
            .find(|row| row[0] == "category" && row[1] == name)
            .unwrap_or_else(|| panic!("missing category row {name}"))
            .clone()
    };
    assert_eq!(category_row("Environmental")[2], "2");
    assert_eq!(category_row("Social")[2], "1");
    assert_eq!(category_row("Governance")[2], "1");
    // Scenario E: an empty category is still counted as zero...
    assert_eq!(category_row("General")[2], "0");
    // ...but produces no sheet.
    assert!(!layout.tables.iter().any(|t| t.sheet_name == "General"));
}

#[test]
fn category_sheets_follow_taxonomy_order_with_fixed_columns() {
    let consolidation =
        consolidate(&sample_regulatory(), &sample_investor()).expect("consolidation");
    let layout = build_report(&consolidation.records).expect("layout");

    let names: Vec<&str> = layout
        .tables
        .iter()
        .map(|table| table.sheet_name.as_str())
        .collect();
    assert_eq!(names, ["Summary", "Environmental", "Social", "Governance"]);

    for table in layout.tables.iter().skip(1) {
        assert_eq!(table.columns, REPORT_COLUMNS);
        for row in &table.rows {
            assert_eq!(row.len(), REPORT_COLUMNS.len());
            // Captured Value stays blank for the end user.
            assert_eq!(row[5], "");
        }
    }

    let environmental = &layout.tables[1];
    assert_eq!(environmental.rows[0][0], "GHG Emissions");
    assert_eq!(environmental.rows[0][2], "Regulatory, Investor");
    assert_eq!(environmental.rows[0][3], "Environmental");
    assert_eq!(
        environmental.rows[0][4],
        "Regulatory: Scope 1 and 2; Investor: Total carbon footprint"
    );
    assert_eq!(environmental.rows[1][0], "Water Usage");
    assert_eq!(environmental.rows[1][2], "Regulatory");
}

#[test]
fn empty_collection_yields_summary_only_layout() {
    let layout = build_report(&[]).expect("layout");
    assert_eq!(layout.tables.len(), 1);
    assert_eq!(layout.tables[0].sheet_name, SUMMARY_SHEET);
    assert_eq!(layout.tables[0].rows[0], ["total", "Metrics", "0"]);
}

#[test]
fn sheet_names_are_sanitized_for_excel() {
    assert_eq!(sanitize_sheet_name("Summary"), "Summary");
    assert_eq!(sanitize_sheet_name("a/b:c"), "a_b_c");
    assert_eq!(sanitize_sheet_name("   "), "Sheet");
    assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
    // Multi-byte names are cut on a character boundary.
    let truncated = sanitize_sheet_name(&"é".repeat(40));
    assert_eq!(truncated.chars().count(), 31);
}

#[test]
fn generated_workbook_preserves_sheet_row_and_column_order() {
    let temp_dir = tempdir().expect("temporary directory");
    let regulatory_path = temp_dir.path().join("regulatory.json");
    let investor_path = temp_dir.path().join("investor.json");

    fs::write(
        &regulatory_path,
        serde_json::json!([
            {"name": "GHG Emissions", "description": "Scope 1 and 2", "category": "Environmental"},
            {"name": "Board Diversity", "category": "Governance"}
        ])
        .to_string(),
    )
    .expect("regulatory input written");
    fs::write(
        &investor_path,
        serde_json::json!([
            {"name": "ghg emissions", "description": "Total carbon footprint"}
        ])
        .to_string(),
    )
    .expect("investor input written");

    let adapter = JsonExtractionAdapter::new(regulatory_path, investor_path);
    let report =
        pipeline::generate(&adapter, "capture", temp_dir.path()).expect("pipeline run");
    assert_eq!(report.metric_count, 2);
    assert_eq!(report.sheet_count, 3);
    assert!(!report.audit.is_empty());

    let mut workbook: Xlsx<_> = open_workbook(&report.output).expect("workbook opened");
    assert_eq!(
        workbook.sheet_names().to_vec(),
        ["Summary", "Environmental", "Governance"]
    );

    let range = workbook
        .worksheet_range("Environmental")
        .expect("sheet present")
        .expect("sheet read");
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| cell.get_string().unwrap_or_default().to_string())
                .collect()
        })
        .collect();

    assert_eq!(rows[0], REPORT_COLUMNS);
    assert_eq!(rows[1][0], "GHG Emissions");
    assert_eq!(rows[1][1], "Total carbon footprint");
    assert_eq!(rows[1][2], "Regulatory, Investor");
}

#[test]
fn missing_origin_degrades_instead_of_failing() {
    let temp_dir = tempdir().expect("temporary directory");
    let regulatory_path = temp_dir.path().join("regulatory.json");
    fs::write(
        &regulatory_path,
        serde_json::json!([
            {"name": "Energy Use", "category": "Environmental"}
        ])
        .to_string(),
    )
    .expect("regulatory input written");

    let adapter =
        JsonExtractionAdapter::new(regulatory_path, temp_dir.path().join("absent.json"));
    let report = pipeline::generate(&adapter, "degraded", temp_dir.path()).expect("pipeline run");
    assert_eq!(report.metric_count, 1);
    assert!(report
        .audit
        .iter()
        .any(|entry| entry.to_string().contains("origin Investor degraded")));
}

#[test]
fn origin_with_zero_entries_is_surfaced_in_the_audit_log() {
    let temp_dir = tempdir().expect("temporary directory");
    let regulatory_path = temp_dir.path().join("regulatory.json");
    let investor_path = temp_dir.path().join("investor.json");
    fs::write(
        &regulatory_path,
        serde_json::json!([
            {"name": "Energy Use", "category": "Environmental"}
        ])
        .to_string(),
    )
    .expect("regulatory input written");
    fs::write(&investor_path, "[]").expect("investor input written");

    let adapter = JsonExtractionAdapter::new(regulatory_path, investor_path);
    let report = pipeline::generate(&adapter, "sparse", temp_dir.path()).expect("pipeline run");
    assert_eq!(report.metric_count, 1);
    assert!(report.audit.iter().any(|entry| matches!(
        entry,
        AuditEntry::OriginDegraded { origin: Origin::Investor, .. }
    )));
}

#[test]
fn both_origins_failing_aborts_the_run() {
    struct FailingAdapter;
    impl ExtractionAdapter for FailingAdapter {
        fn extract(&self, origin: Origin) -> Result<Vec<RawMetricEntry>> {
            Err(ToolError::MissingInput(origin.label().into()))
        }
    }

    let temp_dir = tempdir().expect("temporary directory");
    let error = pipeline::generate(&FailingAdapter, "none", temp_dir.path())
        .expect_err("run must fail");
    assert!(matches!(error, ToolError::EmptyInput));
    // No partial file was written.
    assert!(!temp_dir.path().join("none.xlsx").exists());
}
