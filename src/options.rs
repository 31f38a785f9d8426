use crate::error::ReadingLogError;
use glob::Pattern;
use serde::Serialize;

/// The fourteen columns of the canonical table, in output order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CanonicalColumn {
    Year,
    Month,
    DayOfMonth,
    Date,
    SequenceNumber,
    Code,
    Title,
    Level,
    Author,
    Series,
    Category,
    School,
    Grade,
    StudentName,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 14] = [
        Self::Year,
        Self::Month,
        Self::DayOfMonth,
        Self::Date,
        Self::SequenceNumber,
        Self::Code,
        Self::Title,
        Self::Level,
        Self::Author,
        Self::Series,
        Self::Category,
        Self::School,
        Self::Grade,
        Self::StudentName,
    ];
}

/// Vocabulary of the source documents.
///
/// The metadata labels double as the labels of the injected constant
/// columns, and the year/month labels double as the header row markers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Labels {
    pub school: String,
    pub grade: String,
    pub student_name: String,
    pub sheet_name: String,
    pub year: String,
    pub month: String,
    pub day_of_month: String,
    pub date: String,
    pub sequence_number: String,
    pub code: String,
    pub title: String,
    pub level: String,
    pub author: String,
    pub series: String,
    pub category: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            school: "학교".to_owned(),
            grade: "학년".to_owned(),
            student_name: "이름".to_owned(),
            sheet_name: "시트명".to_owned(),
            year: "년".to_owned(),
            month: "월".to_owned(),
            day_of_month: "날짜".to_owned(),
            date: "Date".to_owned(),
            sequence_number: "순번".to_owned(),
            code: "코드번호".to_owned(),
            title: "책제목".to_owned(),
            level: "레벨".to_owned(),
            author: "저자".to_owned(),
            series: "시리즈".to_owned(),
            category: "구분".to_owned(),
        }
    }
}

impl Labels {
    /// Source label of a canonical column.
    pub fn label(&self, column: CanonicalColumn) -> &str {
        match column {
            CanonicalColumn::Year => &self.year,
            CanonicalColumn::Month => &self.month,
            CanonicalColumn::DayOfMonth => &self.day_of_month,
            CanonicalColumn::Date => &self.date,
            CanonicalColumn::SequenceNumber => &self.sequence_number,
            CanonicalColumn::Code => &self.code,
            CanonicalColumn::Title => &self.title,
            CanonicalColumn::Level => &self.level,
            CanonicalColumn::Author => &self.author,
            CanonicalColumn::Series => &self.series,
            CanonicalColumn::Category => &self.category,
            CanonicalColumn::School => &self.school,
            CanonicalColumn::Grade => &self.grade,
            CanonicalColumn::StudentName => &self.student_name,
        }
    }

    /// Output header row of the canonical table.
    pub fn headers(&self) -> Vec<&str> {
        CanonicalColumn::ALL.iter().map(|column| self.label(*column)).collect()
    }
}

/// What the cleaner does when no sheet produced one of the canonical columns.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub enum MissingColumnPolicy {
    /// Read the column as unset in every row
    #[default]
    NullFill,
    /// Stop with `PipelineError::MissingColumn`
    Fail,
}

/// Options controlling one pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// Source vocabulary
    pub labels: Labels,
    /// Sheet name patterns; `None` processes every sheet
    pub sheet_name_patterns: Option<Vec<Pattern>>,
    /// Handling of structurally missing canonical columns
    pub missing_columns: MissingColumnPolicy,
    /// Side of the square region scanned for metadata labels
    pub metadata_window: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            labels: Labels::default(),
            sheet_name_patterns: None,
            missing_columns: MissingColumnPolicy::default(),
            metadata_window: 10,
        }
    }
}

impl PipelineOptions {
    /// Restricts processing to sheets matching any of the glob patterns.
    /// An empty list keeps every sheet.
    pub fn with_sheet_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, ReadingLogError> {
        self.sheet_name_patterns = if patterns.is_empty() {
            None
        } else {
            Some(
                patterns
                    .iter()
                    .map(|pattern| Pattern::new(pattern.as_ref()))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        };
        Ok(self)
    }

    /// Checks if a sheet name matches the configured patterns.
    /// Returns true if no patterns are specified or if the name matches any pattern.
    pub fn accept(&self, sheet_name: &str) -> bool {
        match &self.sheet_name_patterns {
            Some(patterns) => patterns.iter().any(|pattern| pattern.matches(sheet_name)),
            None => true,
        }
    }
}
