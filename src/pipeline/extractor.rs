use crate::pipeline::table::SheetTable;
use crate::spreadsheet::RawSheet;
use crate::spreadsheet::Value;

/// Slices the header labels and the non-empty data rows below them out of a sheet.
///
/// Labels are taken verbatim from the header row. Returns `None` when no data
/// row survives the empty-row filter.
pub fn extract(sheet: &RawSheet, header_row: usize) -> Option<SheetTable> {
    let labels: Vec<String> = sheet.row(header_row)?.iter().map(Value::to_string).collect();
    let rows: Vec<Vec<Value>> = sheet
        .rows()
        .skip(header_row + 1)
        .filter(|row| !row.iter().all(Value::is_blank))
        .map(<[Value]>::to_vec)
        .collect();
    if rows.is_empty() {
        return None;
    }
    Some(SheetTable::new(sheet.name(), labels, rows))
}
