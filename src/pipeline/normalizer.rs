use crate::options::PipelineOptions;
use crate::pipeline::extractor::extract;
use crate::pipeline::scanner::scan;
use crate::pipeline::table::SheetTable;
use crate::spreadsheet::RawSheet;
use crate::spreadsheet::Value;
use tracing::debug;
use tracing::info;

/// Turns one raw sheet into a table carrying its student metadata.
///
/// Appends the school, grade, student name and sheet label as constant
/// columns. Unusable sheets (empty, headerless or without data rows) yield
/// `None` and contribute nothing to the document.
pub fn normalize(sheet: &RawSheet, sheet_label: &str, options: &PipelineOptions) -> Option<SheetTable> {
    if sheet.is_empty() {
        info!(sheet = sheet_label, "Skipping empty sheet");
        return None;
    }

    let labels = &options.labels;
    let (header_row, metadata) = scan(sheet, labels, options.metadata_window);
    let Some(header_row) = header_row else {
        info!(sheet = sheet_label, "Skipping sheet without a header row");
        return None;
    };
    let Some(mut table) = extract(sheet, header_row) else {
        info!(sheet = sheet_label, header_row, "Skipping sheet without data rows");
        return None;
    };

    if metadata.school.is_none() || metadata.grade.is_none() || metadata.student_name.is_none() {
        debug!(sheet = sheet_label, ?metadata, "Incomplete student metadata");
    }
    table.set_constant(&labels.school, metadata.school.unwrap_or_default());
    table.set_constant(&labels.grade, metadata.grade.unwrap_or_default());
    table.set_constant(&labels.student_name, metadata.student_name.unwrap_or_default());
    table.set_constant(&labels.sheet_name, Value::text(sheet_label));

    debug!(sheet = sheet_label, header_row, rows = table.len(), "Normalized sheet");
    Some(table)
}
