//! Locates the student metadata and the header row inside an unstructured sheet.
use crate::options::Labels;
use crate::spreadsheet::RawSheet;
use crate::spreadsheet::Value;
use regex::Regex;
use std::sync::LazyLock;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("Hardcode regex pattern"));

/// Metadata fields recognised next to a label cell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MetadataField {
    School,
    Grade,
    StudentName,
}

impl MetadataField {
    /// Field introduced by a trimmed cell text, if any.
    pub fn from_label(text: &str, labels: &Labels) -> Option<Self> {
        if text == labels.school {
            Some(Self::School)
        } else if text == labels.grade {
            Some(Self::Grade)
        } else if text == labels.student_name {
            Some(Self::StudentName)
        } else {
            None
        }
    }
}

/// School, grade and student name found in a sheet's top-left region.
/// Fields without a label stay unset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StudentMetadata {
    pub school: Option<Value>,
    pub grade: Option<Value>,
    pub student_name: Option<Value>,
}

impl StudentMetadata {
    /// Stores the value found next to a label; later labels overwrite earlier ones,
    /// including with an unset value.
    fn assign(&mut self, field: MetadataField, value: Option<Value>) {
        match field {
            MetadataField::School => self.school = value,
            MetadataField::Grade => self.grade = value.map(clean_grade),
            MetadataField::StudentName => self.student_name = value,
        }
    }
}

/// First run of ASCII digits in a text.
pub(crate) fn first_digits(text: &str) -> Option<&str> {
    DIGITS.find(text).map(|found| found.as_str())
}

/// Reduces a decorated grade ("3rd grade", "3학년") to its digits.
/// Values without digits pass through unchanged.
pub fn clean_grade(value: Value) -> Value {
    match first_digits(&value.to_string()) {
        Some(digits) => Value::Text(digits.to_owned()),
        None => value,
    }
}

/// Scans the top-left `window`×`window` region row by row for metadata labels.
pub fn scan_metadata(sheet: &RawSheet, labels: &Labels, window: usize) -> StudentMetadata {
    let mut metadata = StudentMetadata::default();
    let rows = sheet.row_count().min(window);
    let cols = sheet.col_count().min(window);
    for row in 0..rows {
        for col in 0..cols {
            let Some(text) = sheet.get(row, col).map(Value::to_string) else {
                continue;
            };
            if let Some(field) = MetadataField::from_label(text.trim(), labels) {
                let value = sheet
                    .get(row, col + 1)
                    .filter(|value| !value.is_blank())
                    .cloned();
                metadata.assign(field, value);
            }
        }
    }
    metadata
}

/// Index of the first row holding both the year and the month marker as whole cell values.
pub fn find_header_row(sheet: &RawSheet, labels: &Labels) -> Option<usize> {
    if sheet.is_empty() {
        return None;
    }
    sheet.rows().position(|row| {
        let texts: Vec<String> = row.iter().map(Value::to_string).collect();
        texts.iter().any(|text| *text == labels.year) && texts.iter().any(|text| *text == labels.month)
    })
}

/// Header row index and metadata of one sheet.
pub fn scan(sheet: &RawSheet, labels: &Labels, window: usize) -> (Option<usize>, StudentMetadata) {
    (find_header_row(sheet, labels), scan_metadata(sheet, labels, window))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> RawSheet {
        RawSheet::from_text_rows("sheet", rows)
    }

    #[test]
    fn finds_header_row_at_first_match() {
        let sheet = sheet(&[
            &["독서 기록장"],
            &[""],
            &["학교", "Lincoln Elementary"],
            &["년도", "월별"],
            &["년 월"],
            &["년", "월", "날짜", "책제목"],
            &["년", "월"],
        ]);
        assert_eq!(find_header_row(&sheet, &Labels::default()), Some(5));
    }

    #[test]
    fn header_markers_must_be_separate_cells() {
        let sheet = sheet(&[&["년", "날짜"], &["월"], &["년월"]]);
        assert_eq!(find_header_row(&sheet, &Labels::default()), None);
    }

    #[test]
    fn header_markers_are_not_trimmed() {
        let sheet = sheet(&[&["년 ", "월"]]);
        assert_eq!(find_header_row(&sheet, &Labels::default()), None);
    }

    #[test]
    fn empty_sheet_has_no_header() {
        let sheet = RawSheet::new("empty", Vec::new());
        assert_eq!(find_header_row(&sheet, &Labels::default()), None);
    }

    #[test]
    fn extracts_metadata_next_to_labels() {
        let sheet = sheet(&[
            &[""],
            &[""],
            &["", "학교", "Lincoln Elementary"],
            &["", " 이름 ", "Kim Minji", "학년", "3rd grade"],
        ]);
        let metadata = scan_metadata(&sheet, &Labels::default(), 10);
        assert_eq!(metadata.school, Some(Value::text("Lincoln Elementary")));
        assert_eq!(metadata.student_name, Some(Value::text("Kim Minji")));
        assert_eq!(metadata.grade, Some(Value::text("3")));
    }

    #[test]
    fn later_labels_win() {
        let sheet = sheet(&[
            &["학교", "First School"],
            &["", "", "학교", "Second School"],
            &["이름", "Park"],
            &["이름", ""],
        ]);
        let metadata = scan_metadata(&sheet, &Labels::default(), 10);
        assert_eq!(metadata.school, Some(Value::text("Second School")));
        assert_eq!(metadata.student_name, None);
    }

    #[test]
    fn labels_outside_the_window_are_ignored() {
        let mut rows: Vec<Vec<Value>> = vec![vec![Value::Empty; 12]; 12];
        rows[10][0] = Value::text("학교");
        rows[10][1] = Value::text("Hidden");
        rows[0][9] = Value::text("이름");
        rows[0][10] = Value::text("Edge");
        let sheet = RawSheet::new("wide", rows);
        let metadata = scan_metadata(&sheet, &Labels::default(), 10);
        assert_eq!(metadata.school, None);
        assert_eq!(metadata.student_name, Some(Value::text("Edge")));
    }

    #[test]
    fn grade_without_digits_passes_through() {
        assert_eq!(clean_grade(Value::text("N/A")), Value::text("N/A"));
        assert_eq!(clean_grade(Value::text("3rd grade")), Value::text("3"));
        assert_eq!(clean_grade(Value::Number(4.0)), Value::text("4"));
        assert_eq!(clean_grade(Value::text("12학년 2반")), Value::text("12"));
    }

    #[test]
    fn scan_reports_header_and_metadata() {
        let sheet = sheet(&[&["학년", "2"], &["년", "월"]]);
        let (header, metadata) = scan(&sheet, &Labels::default(), 10);
        assert_eq!(header, Some(1));
        assert_eq!(metadata.grade, Some(Value::text("2")));
    }
}
