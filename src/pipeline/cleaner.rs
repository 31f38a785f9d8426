use crate::options::CanonicalColumn;
use crate::options::MissingColumnPolicy;
use crate::options::PipelineOptions;
use crate::pipeline::PipelineError;
use crate::pipeline::record::CanonicalRecord;
use crate::pipeline::record::CanonicalTable;
use crate::pipeline::record::EntryDate;
use crate::pipeline::scanner::first_digits;
use crate::pipeline::table::CombinedTable;
use crate::pipeline::table::SheetTable;
use crate::spreadsheet::Value;
use tracing::info;
use tracing::warn;

type Positions = [Option<usize>; CanonicalColumn::ALL.len()];

/// Removes all whitespace, so "레벨 " and "레벨" name the same column.
fn squeeze(label: &str) -> String {
    label.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Column index of every canonical column within one sheet; first match wins.
fn resolve(sheet: &SheetTable, options: &PipelineOptions) -> Positions {
    let labels: Vec<String> = sheet.labels().iter().map(|label| squeeze(label)).collect();
    let mut positions = [None; CanonicalColumn::ALL.len()];
    for (slot, column) in positions.iter_mut().zip(CanonicalColumn::ALL) {
        let wanted = squeeze(options.labels.label(column));
        *slot = labels.iter().position(|label| *label == wanted);
    }
    positions
}

/// Whole-number reading with 0 for anything unreadable; fractions truncate.
pub(crate) fn to_count(value: &Value) -> i64 {
    value.to_number().map(|number| number.trunc() as i64).unwrap_or(0)
}

/// First digit run of the value's text, or -1 when there is none.
pub(crate) fn to_level(value: &Value) -> i64 {
    first_digits(&value.to_string())
        .and_then(|digits| digits.parse::<i64>().ok())
        .unwrap_or(-1)
}

/// Projects the combined table onto the canonical columns.
///
/// Rows without a title are dropped. Year, month, day of month, sequence
/// number and grade read as whole numbers with `0` as fallback; the level
/// keeps its first digit run with `-1` as fallback. Dates are carried over
/// as recorded and left for the date synthesizer when blank.
pub fn clean(combined: &CombinedTable, options: &PipelineOptions) -> Result<CanonicalTable, PipelineError> {
    let positions: Vec<Positions> = combined.sheets().iter().map(|sheet| resolve(sheet, options)).collect();

    for (index, column) in CanonicalColumn::ALL.iter().enumerate() {
        if positions.iter().any(|sheet| sheet[index].is_some()) {
            continue;
        }
        let label = options.labels.label(*column);
        match options.missing_columns {
            MissingColumnPolicy::Fail => {
                return Err(PipelineError::MissingColumn {
                    label: label.to_owned(),
                });
            }
            MissingColumnPolicy::NullFill => warn!(column = label, "Column missing from every sheet, reading it as unset"),
        }
    }

    let mut records = Vec::with_capacity(combined.len());
    let mut dropped = 0;
    for (sheet, positions) in combined.sheets().iter().zip(&positions) {
        for values in sheet.rows() {
            let field = |column: CanonicalColumn| -> Value {
                positions[column as usize]
                    .and_then(|col| values.get(col))
                    .cloned()
                    .unwrap_or_default()
            };

            let title = field(CanonicalColumn::Title);
            if title.is_blank() {
                dropped += 1;
                continue;
            }
            let date = field(CanonicalColumn::Date);
            records.push(CanonicalRecord {
                year: to_count(&field(CanonicalColumn::Year)),
                month: to_count(&field(CanonicalColumn::Month)),
                date: if date.is_blank() { EntryDate::Missing } else { EntryDate::Recorded(date) },
                day_of_month: to_count(&field(CanonicalColumn::DayOfMonth)),
                sequence_number: to_count(&field(CanonicalColumn::SequenceNumber)),
                code: field(CanonicalColumn::Code),
                title: title.to_string(),
                level: to_level(&field(CanonicalColumn::Level)),
                author: field(CanonicalColumn::Author),
                series: field(CanonicalColumn::Series),
                category: field(CanonicalColumn::Category),
                school: field(CanonicalColumn::School),
                grade: to_count(&field(CanonicalColumn::Grade)),
                student_name: field(CanonicalColumn::StudentName),
            });
        }
    }

    info!(rows = records.len(), dropped, "Cleaned table");
    Ok(CanonicalTable::new(&options.labels, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|label| label.to_string()).collect()
    }

    fn row(values: &[&str]) -> Vec<Value> {
        values.iter().map(|value| Value::text(*value)).collect()
    }

    const FULL: [&str; 14] = [
        "년", "월", "날짜", "Date", "순번", "코드번호", "책제목", "레벨 ", "저자", "시리즈", "구분", "학교", "학년", "이름",
    ];

    fn combined(rows: Vec<Vec<Value>>) -> CombinedTable {
        CombinedTable::from_sheets(vec![SheetTable::new("s", labels(&FULL), rows)])
    }

    #[test]
    fn coerces_fields() {
        let table = combined(vec![row(&[
            "2023", "3.7", "x", "", "12", "A-1", "Frog", "Lv.12a", "Lobel", "", "Fiction", "Lincoln", "3", "Kim",
        ])]);
        let table = clean(&table, &PipelineOptions::default()).unwrap();
        let record = &table.records()[0];
        assert_eq!(record.year, 2023);
        assert_eq!(record.month, 3);
        assert_eq!(record.day_of_month, 0);
        assert_eq!(record.date, EntryDate::Missing);
        assert_eq!(record.sequence_number, 12);
        assert_eq!(record.code, Value::text("A-1"));
        assert_eq!(record.title, "Frog");
        assert_eq!(record.level, 12);
        assert_eq!(record.series, Value::Empty);
        assert_eq!(record.grade, 3);
        assert_eq!(record.student_name, Value::text("Kim"));
    }

    #[test]
    fn drops_rows_without_title() {
        let table = combined(vec![
            row(&["2023", "1", "", "", "1", "", "A"]),
            row(&["2023", "1", "", "", "2", "", "  "]),
            row(&["2023", "1", "", "", "3"]),
            row(&["2023", "1", "", "", "4", "", "B"]),
        ]);
        let table = clean(&table, &PipelineOptions::default()).unwrap();
        let titles: Vec<&str> = table.records().iter().map(|record| record.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert!(table.records().iter().all(|record| !record.title.trim().is_empty()));
    }

    #[test]
    fn levels_are_minus_one_or_non_negative() {
        for (raw, expected) in [("3", 3), ("Level 7", 7), ("", -1), ("N/A", -1), ("2.5", 2), ("-4", 4)] {
            assert_eq!(to_level(&Value::text(raw)), expected, "{raw}");
        }
        assert_eq!(to_level(&Value::Number(5.0)), 5);
    }

    #[test]
    fn unreadable_numbers_become_zero() {
        assert_eq!(to_count(&Value::text("N/A")), 0);
        assert_eq!(to_count(&Value::Empty), 0);
        assert_eq!(to_count(&Value::Number(-2.9)), -2);
        assert_eq!(to_count(&Value::Bool(true)), 1);
    }

    #[test]
    fn keeps_recorded_dates() {
        let mut values = row(&["2023", "1", "5", "", "1", "", "A"]);
        values[3] = Value::Number(45000.0);
        let table = clean(&combined(vec![values]), &PipelineOptions::default()).unwrap();
        assert_eq!(table.records()[0].date, EntryDate::Recorded(Value::Number(45000.0)));
    }

    #[test]
    fn matches_labels_ignoring_whitespace_and_keeps_sheet_order() {
        let first = SheetTable::new("a", labels(&[" 책 제목", "레벨"]), vec![row(&["A", "1"]), row(&["B", "2"])]);
        let second = SheetTable::new("b", labels(&["레벨", "책제목", "책제목"]), vec![row(&["3", "C", "ignored"])]);
        let combined = CombinedTable::from_sheets(vec![first, second]);
        let table = clean(&combined, &PipelineOptions::default()).unwrap();
        let titles: Vec<(&str, i64)> = table.records().iter().map(|record| (record.title.as_str(), record.level)).collect();
        assert_eq!(titles, vec![("A", 1), ("B", 2), ("C", 3)]);
    }

    #[test]
    fn missing_columns_follow_policy() {
        let sheet = SheetTable::new("s", labels(&["책제목"]), vec![row(&["A"])]);
        let combined = CombinedTable::from_sheets(vec![sheet]);

        let table = clean(&combined, &PipelineOptions::default()).unwrap();
        assert_eq!(table.records()[0].level, -1);
        assert_eq!(table.records()[0].year, 0);

        let options = PipelineOptions {
            missing_columns: MissingColumnPolicy::Fail,
            ..PipelineOptions::default()
        };
        match clean(&combined, &options) {
            Err(PipelineError::MissingColumn { label }) => assert_eq!(label, "년"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_title_column_drops_every_row() {
        let sheet = SheetTable::new("s", labels(&["년", "월"]), vec![row(&["2023", "1"])]);
        let table = clean(&CombinedTable::from_sheets(vec![sheet]), &PipelineOptions::default()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers().len(), 14);
    }
}
