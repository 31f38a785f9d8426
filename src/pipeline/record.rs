//! Strictly typed output rows of the pipeline.
use crate::options::CanonicalColumn;
use crate::options::Labels;
use crate::spreadsheet::Value;
use chrono::NaiveDate;
use chrono::NaiveTime;

/// Date of a reading log entry.
#[derive(Clone, Debug, PartialEq)]
pub enum EntryDate {
    /// No date recorded and none composed yet
    Missing,
    /// Date cell as found in the source sheet
    Recorded(Value),
    /// Composed from the year, month and day-of-month fields
    Composed(NaiveDate),
    /// The components did not form a calendar date
    NotADate,
}

impl EntryDate {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Cell value written for this date; `NotADate` and `Missing` are empty cells.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Recorded(value) => value.clone(),
            Self::Composed(date) => Value::DateTime(date.and_time(NaiveTime::MIN)),
            Self::Missing | Self::NotADate => Value::Empty,
        }
    }
}

/// One cleaned reading log entry.
///
/// The title is never empty and the level is either `-1` (unknown) or a
/// non-negative whole number. Numeric fields that could not be read are `0`.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalRecord {
    pub year: i64,
    pub month: i64,
    pub date: EntryDate,
    pub day_of_month: i64,
    pub sequence_number: i64,
    pub code: Value,
    pub title: String,
    pub level: i64,
    pub author: Value,
    pub series: Value,
    pub category: Value,
    pub school: Value,
    pub grade: i64,
    pub student_name: Value,
}

impl CanonicalRecord {
    /// Output cell of one canonical column.
    pub fn value(&self, column: CanonicalColumn) -> Value {
        match column {
            CanonicalColumn::Year => Value::from(self.year),
            CanonicalColumn::Month => Value::from(self.month),
            CanonicalColumn::DayOfMonth => Value::from(self.day_of_month),
            CanonicalColumn::Date => self.date.to_value(),
            CanonicalColumn::SequenceNumber => Value::from(self.sequence_number),
            CanonicalColumn::Code => self.code.clone(),
            CanonicalColumn::Title => Value::text(self.title.as_str()),
            CanonicalColumn::Level => Value::from(self.level),
            CanonicalColumn::Author => self.author.clone(),
            CanonicalColumn::Series => self.series.clone(),
            CanonicalColumn::Category => self.category.clone(),
            CanonicalColumn::School => self.school.clone(),
            CanonicalColumn::Grade => Value::from(self.grade),
            CanonicalColumn::StudentName => self.student_name.clone(),
        }
    }

    /// Output row in canonical column order.
    pub fn to_values(&self) -> Vec<Value> {
        CanonicalColumn::ALL.iter().map(|column| self.value(*column)).collect()
    }
}

/// The pipeline's final table: canonical records under the document's labels.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalTable {
    headers: Vec<String>,
    records: Vec<CanonicalRecord>,
}

impl CanonicalTable {
    pub fn new(labels: &Labels, records: Vec<CanonicalRecord>) -> Self {
        let headers = labels.headers().into_iter().map(str::to_owned).collect();
        CanonicalTable { headers, records }
    }

    pub fn headers(&self) -> Vec<&str> {
        self.headers.iter().map(String::as_str).collect()
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut [CanonicalRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Output rows in canonical column order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        self.records.iter().map(CanonicalRecord::to_values)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(title: &str) -> CanonicalRecord {
        CanonicalRecord {
            year: 2023,
            month: 3,
            date: EntryDate::Missing,
            day_of_month: 14,
            sequence_number: 1,
            code: Value::Empty,
            title: title.to_owned(),
            level: -1,
            author: Value::Empty,
            series: Value::Empty,
            category: Value::Empty,
            school: Value::Empty,
            grade: 0,
            student_name: Value::Empty,
        }
    }

    #[test]
    fn rows_follow_header_order() {
        let mut record = record("Zoo");
        record.date = EntryDate::Composed(NaiveDate::from_ymd_opt(2023, 3, 14).unwrap());
        record.student_name = Value::text("Kim");
        let table = CanonicalTable::new(&Labels::default(), vec![record]);
        let rows: Vec<Vec<Value>> = table.rows().collect();
        assert_eq!(table.headers().len(), rows[0].len());
        assert_eq!(rows[0][0], Value::Number(2023.0));
        assert_eq!(rows[0][3].to_string(), "2023-03-14");
        assert_eq!(rows[0][6], Value::text("Zoo"));
        assert_eq!(rows[0][7], Value::Number(-1.0));
        assert_eq!(rows[0][13], Value::text("Kim"));
    }

    #[test]
    fn unset_dates_are_empty_cells() {
        assert_eq!(EntryDate::NotADate.to_value(), Value::Empty);
        assert_eq!(EntryDate::Missing.to_value(), Value::Empty);
        assert_eq!(EntryDate::Recorded(Value::text("3/14")).to_value(), Value::text("3/14"));
    }
}
