//! Per-student reading progress derived from the canonical table.
use crate::pipeline::CanonicalRecord;
use crate::pipeline::CanonicalTable;
use std::fmt::Display;

/// Reading progress of one student.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StudentSummary {
    pub student_name: String,
    pub records: usize,
    /// Level of the lowest-numbered entry with a known level
    pub first_level: Option<i64>,
    /// Level of the highest-numbered entry with a known level
    pub last_level: Option<i64>,
    pub max_level: Option<i64>,
    /// Entry count per category, in first-seen order; blank categories are not counted
    pub categories: Vec<(String, usize)>,
}

impl StudentSummary {
    /// Folds one student's records, ordered by sequence number like the
    /// progress chart; entries sharing a number keep their table order.
    fn from_records(student_name: String, mut records: Vec<&CanonicalRecord>) -> Self {
        records.sort_by_key(|record| record.sequence_number);
        let mut summary = StudentSummary {
            student_name,
            ..Default::default()
        };
        for record in records {
            summary.add(record);
        }
        summary
    }

    fn add(&mut self, record: &CanonicalRecord) {
        self.records += 1;
        if record.level >= 0 {
            self.first_level.get_or_insert(record.level);
            self.last_level = Some(record.level);
            self.max_level = Some(self.max_level.map_or(record.level, |max| max.max(record.level)));
        }
        if !record.category.is_blank() {
            let category = record.category.to_string();
            match self.categories.iter_mut().find(|(name, _)| *name == category) {
                Some((_, count)) => *count += 1,
                None => self.categories.push((category, 1)),
            }
        }
    }
}

impl Display for StudentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = |level: Option<i64>| level.map_or_else(|| "-".to_owned(), |level| level.to_string());
        write!(
            f,
            "{}: {} books, level {} -> {} (max {})",
            self.student_name,
            self.records,
            level(self.first_level),
            level(self.last_level),
            level(self.max_level)
        )?;
        for (category, count) in &self.categories {
            write!(f, ", {category} {count}")?;
        }
        Ok(())
    }
}

/// Summaries keyed by student name, in order of first appearance.
pub fn summarize(table: &CanonicalTable) -> Vec<StudentSummary> {
    let mut students: Vec<(String, Vec<&CanonicalRecord>)> = Vec::new();
    for record in table.records() {
        let name = record.student_name.to_string();
        match students.iter_mut().find(|(student, _)| *student == name) {
            Some((_, records)) => records.push(record),
            None => students.push((name, vec![record])),
        }
    }
    students
        .into_iter()
        .map(|(name, records)| StudentSummary::from_records(name, records))
        .collect()
}
