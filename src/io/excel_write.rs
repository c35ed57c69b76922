use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::layout::ReportLayout;

/// Writes the report layout to the given path as a multi-tab workbook.
///
/// Table order, row order, and column order are preserved exactly as laid
/// out; the writer performs no re-sorting or filtering of its own. The file
/// is only saved once every sheet has been built, so a failed run leaves no
/// partial artifact behind.
pub fn write_report(path: &Path, layout: &ReportLayout) -> Result<()> {
    let mut workbook = Workbook::new();

    for table in &layout.tables {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string(0, col_idx as u16, header)?;
            worksheet.set_column_width(col_idx as u16, column_width(header))?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
            }
        }

        let mut excel_table = rust_xlsxwriter::Table::new();
        excel_table.set_autofilter(true);

        let col_end = (table.columns.len() as u16).saturating_sub(1);
        let row_end = if table.rows.is_empty() {
            1
        } else {
            table.rows.len() as u32
        };
        worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;
        worksheet.set_freeze_panes(1, 0)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Widths tuned for the fixed capture-form schema; anything else gets a
/// sensible default.
fn column_width(header: &str) -> f64 {
    match header {
        "Metric Name" => 35.0,
        "Description" => 50.0,
        "Required By" => 22.0,
        "Category" => 15.0,
        "Source Detail" => 60.0,
        "Captured Value" => 25.0,
        _ => 18.0,
    }
}
