//! # Pipeline Module
//!
//! Normalizes a reading log workbook into the canonical table:
//!
//! 1. [`scanner`] finds the student metadata and the header row of a sheet
//! 2. [`extractor`] slices the data rows below the header
//! 3. [`normalizer`] runs both per sheet and attaches the metadata columns
//! 4. [`merger`] concatenates the sheet tables in document order
//! 5. [`cleaner`] projects onto the canonical columns and coerces values
//! 6. [`dates`] fills missing dates from their components
pub mod cleaner;
pub mod dates;
pub mod extractor;
pub mod merger;
pub mod normalizer;
pub mod record;
pub mod scanner;
pub mod table;

pub use record::CanonicalRecord;
pub use record::CanonicalTable;
pub use record::EntryDate;

use crate::error::ReadingLogError;
use crate::error::ResultMessage;
use crate::options::PipelineOptions;
use crate::spreadsheet::RawSheet;
use crate::spreadsheet::read_sheets;
use crate::spreadsheet::write_table;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Name of the single worksheet in the output workbook.
pub const OUTPUT_SHEET_NAME: &str = "Sheet1";

/// Directory receiving outputs when no explicit path is given.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Document-level failures of the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No usable sheet in document: no sheet has a header row followed by data")]
    NoUsableData,

    #[error("Column '{label}' is missing from every sheet")]
    MissingColumn { label: String },
}

/// Default output location: `output/<input stem>_processed.xlsx`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().map(|stem| stem.to_string_lossy()).unwrap_or_default();
    Path::new(DEFAULT_OUTPUT_DIR).join(format!("{stem}_processed.xlsx"))
}

/// Runs every in-memory stage over sheets already read from a document.
pub fn process_sheets(sheets: &[RawSheet], options: &PipelineOptions) -> Result<CanonicalTable, PipelineError> {
    let tables = sheets
        .iter()
        .filter_map(|sheet| normalizer::normalize(sheet, sheet.name(), options))
        .collect();
    let combined = merger::merge(tables)?;
    let cleaned = cleaner::clean(&combined, options)?;
    Ok(dates::synthesize(cleaned))
}

/// Reads a workbook and returns its canonical table without writing anything.
pub fn process(input: &Path, options: &PipelineOptions) -> Result<CanonicalTable, ReadingLogError> {
    let sheets = read_sheets(input, |name| options.accept(name))
        .with_prefix(&format!("Failed to read '{}'", input.display()))?;
    info!(input = %input.display(), sheets = sheets.len(), "Read workbook");
    Ok(process_sheets(&sheets, options)?)
}

/// Processes `input` and writes the canonical table as a workbook.
///
/// Without `output` the table goes to [`default_output_path`]. Missing parent
/// directories are created. The written file depends only on the input, so
/// reruns over the same workbook reproduce it byte for byte.
pub fn run(input: &Path, output: Option<&Path>, options: &PipelineOptions) -> Result<CanonicalTable, ReadingLogError> {
    let table = process(input, options)?;
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_output_path(input));
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_table(&output, OUTPUT_SHEET_NAME, &table.headers(), table.rows())
        .with_prefix(&format!("Failed to write '{}'", output.display()))?;
    info!(output = %output.display(), rows = table.len(), "Wrote canonical table");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::Value;
    use chrono::NaiveDate;

    fn log_sheet(name: &str, student: &str, rows: &[&[&str]]) -> RawSheet {
        let preamble: [&[&str]; 6] = [
            &["독서 기록장"],
            &[],
            &["학교", "Lincoln Elementary", "", "학년", "3rd grade"],
            &["이름", student],
            &[],
            &["년", "월", "날짜", "Date", "순번", "코드번호", "책제목", "레벨 ", "저자", "시리즈", "구분"],
        ];
        let mut grid = preamble.to_vec();
        grid.extend_from_slice(rows);
        RawSheet::from_text_rows(name, &grid)
    }

    #[test]
    fn processes_a_document() {
        let march = log_sheet(
            "3월",
            "Kim",
            &[
                &["2023", "3", "14", "", "1", "B-1", "Frog and Toad", "Lv 2", "Lobel", "I Can Read", "Fiction"],
                &[],
                &["2023", "2", "30", "", "2", "", "Zoo", "", "", "", "Nonfiction"],
                &["2023", "3", "15", "", "3", "", "", "4"],
            ],
        );
        let notes = RawSheet::from_text_rows("메모", &[&["remember to return books"]]);
        let april = log_sheet("4월", "Kim", &[&["2023", "4", "1", "", "4", "", "Matilda", "5"]]);

        let table = process_sheets(&[march, notes, april], &PipelineOptions::default()).unwrap();
        let titles: Vec<&str> = table.records().iter().map(|record| record.title.as_str()).collect();
        assert_eq!(titles, vec!["Frog and Toad", "Zoo", "Matilda"]);

        let first = &table.records()[0];
        assert_eq!(first.level, 2);
        assert_eq!(first.grade, 3);
        assert_eq!(first.school, Value::text("Lincoln Elementary"));
        assert_eq!(first.student_name, Value::text("Kim"));
        assert_eq!(first.date, EntryDate::Composed(NaiveDate::from_ymd_opt(2023, 3, 14).unwrap()));
        assert_eq!(table.records()[1].date, EntryDate::NotADate);
        assert_eq!(table.records()[1].level, -1);
        assert!(table.records().iter().all(|record| record.level >= -1));
    }

    #[test]
    fn headerless_document_has_no_usable_data() {
        let sheets = [
            RawSheet::from_text_rows("a", &[&["년도", "월별"], &["2023", "3"]]),
            RawSheet::new("b", Vec::new()),
        ];
        let result = process_sheets(&sheets, &PipelineOptions::default());
        assert!(matches!(result, Err(PipelineError::NoUsableData)));
    }

    #[test]
    fn default_output_sits_in_output_directory() {
        let path = default_output_path(Path::new("/data/uploads/reading log.xlsx"));
        assert_eq!(path, Path::new("output").join("reading log_processed.xlsx"));
    }
}
