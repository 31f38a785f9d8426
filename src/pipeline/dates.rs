use crate::pipeline::record::CanonicalTable;
use crate::pipeline::record::EntryDate;
use chrono::NaiveDate;
use tracing::debug;

/// Calendar date from integer components, if they form one.
pub(crate) fn compose(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    if !(1..=9999).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

/// Fills every missing date from the row's year, month and day of month.
///
/// Recorded dates are kept unchanged. Components that do not form a calendar
/// date yield [`EntryDate::NotADate`]; the row is kept either way.
pub fn synthesize(mut table: CanonicalTable) -> CanonicalTable {
    let mut composed = 0;
    let mut invalid = 0;
    for record in table.records_mut().iter_mut().filter(|record| record.date.is_missing()) {
        record.date = match compose(record.year, record.month, record.day_of_month) {
            Some(date) => {
                composed += 1;
                EntryDate::Composed(date)
            }
            None => {
                invalid += 1;
                EntryDate::NotADate
            }
        };
    }
    debug!(composed, invalid, "Synthesized dates");
    table
}
