use crate::pipeline::PipelineError;
use crate::pipeline::table::CombinedTable;
use crate::pipeline::table::SheetTable;
use tracing::info;

/// Concatenates normalized sheet tables in document order.
///
/// An empty input means the whole document was unusable, which is reported
/// as [`PipelineError::NoUsableData`] rather than an empty table.
pub fn merge(tables: Vec<SheetTable>) -> Result<CombinedTable, PipelineError> {
    if tables.is_empty() {
        return Err(PipelineError::NoUsableData);
    }
    let combined = CombinedTable::from_sheets(tables);
    info!(sheets = combined.sheets().len(), rows = combined.len(), "Merged sheets");
    Ok(combined)
}
