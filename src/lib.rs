//! # Reading Log
//!
//! Normalizes multi-sheet student reading log workbooks into one canonical table.
//!
//! Every sheet of an `.xlsx` document is expected to carry labelled student
//! metadata (school, grade, name) somewhere in its top-left corner and a header
//! row with a year and a month column somewhere below. Layouts otherwise vary
//! from sheet to sheet. The pipeline:
//!
//! - locates the metadata and header row of each sheet, skipping unusable sheets
//! - extracts the non-empty data rows and tags them with the sheet's metadata
//! - merges all sheets in document order
//! - projects the rows onto fourteen canonical columns with fixed semantics:
//!   numeric fields fall back to `0`, unreadable levels to `-1`, and rows
//!   without a book title are dropped
//! - composes missing dates from year, month and day of month, using an
//!   explicit not-a-date marker for impossible calendar dates
//!
//! The result is written as a single-sheet workbook. [`cache`] adds a content
//! hash check on top so unchanged inputs are not reprocessed, and [`summary`]
//! derives per-student progress from the table.
//!
//! ```no_run
//! use reading_log::PipelineOptions;
//! use std::path::Path;
//!
//! let table = reading_log::run(Path::new("logs.xlsx"), None, &PipelineOptions::default())?;
//! println!("{} entries", table.len());
//! # Ok::<(), reading_log::ReadingLogError>(())
//! ```
mod helpers;

pub mod cache;
pub mod error;
pub mod logging;
pub mod options;
pub mod pipeline;
pub mod spreadsheet;
pub mod summary;

pub use error::ReadingLogError;
pub use options::CanonicalColumn;
pub use options::Labels;
pub use options::MissingColumnPolicy;
pub use options::PipelineOptions;
pub use pipeline::CanonicalRecord;
pub use pipeline::CanonicalTable;
pub use pipeline::EntryDate;
pub use pipeline::PipelineError;
pub use pipeline::default_output_path;
pub use pipeline::process;
pub use pipeline::run;
