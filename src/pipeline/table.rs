//! Loosely typed, label-indexed tables that flow between the pipeline stages.
use crate::spreadsheet::Value;

/// The data rows of one sheet under its own header labels.
///
/// Labels are kept verbatim: they may repeat or be blank. Lookups by label
/// resolve to the first column carrying it.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetTable {
    sheet_name: String,
    labels: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl SheetTable {
    /// Builds a table; every row is padded or cut to the label count.
    pub fn new(sheet_name: &str, labels: Vec<String>, mut rows: Vec<Vec<Value>>) -> Self {
        for row in rows.iter_mut() {
            row.resize(labels.len(), Value::Empty);
        }
        SheetTable {
            sheet_name: sheet_name.to_owned(),
            labels,
            rows,
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column whose label satisfies `matches`.
    pub fn position<F>(&self, matches: F) -> Option<usize>
    where
        F: Fn(&str) -> bool,
    {
        self.labels.iter().position(|label| matches(label))
    }

    /// Value of the first column labelled `label` in row `row`.
    pub fn get(&self, row: usize, label: &str) -> Option<&Value> {
        let col = self.position(|candidate| candidate == label)?;
        self.rows.get(row).and_then(|values| values.get(col))
    }

    /// Sets a column to the same value in every row.
    ///
    /// Columns already carrying `label` are removed first, so the constant
    /// column replaces them and ends up last.
    pub fn set_constant(&mut self, label: &str, value: Value) {
        let kept: Vec<bool> = self.labels.iter().map(|candidate| candidate != label).collect();
        if kept.iter().any(|keep| !keep) {
            self.labels = self.labels
                .iter()
                .zip(&kept)
                .filter(|(_, keep)| **keep)
                .map(|(candidate, _)| candidate.to_owned())
                .collect();
            for row in self.rows.iter_mut() {
                let mut flags = kept.iter();
                row.retain(|_| *flags.next().unwrap_or(&true));
            }
        }
        self.labels.push(label.to_owned());
        for row in self.rows.iter_mut() {
            row.push(value.clone());
        }
    }
}

/// All sheet tables of one document, in document order.
///
/// Each sheet keeps its own labels; no alignment happens until the cleaner
/// projects the rows onto the canonical columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CombinedTable {
    sheets: Vec<SheetTable>,
}

/// One row of a [`CombinedTable`] together with the labels of its sheet.
#[derive(Copy, Clone, Debug)]
pub struct RecordRef<'a> {
    pub sheet: &'a SheetTable,
    pub values: &'a [Value],
}

impl<'a> RecordRef<'a> {
    /// Value at a column index of the originating sheet.
    pub fn at(&self, col: usize) -> Option<&'a Value> {
        self.values.get(col)
    }
}

impl CombinedTable {
    pub(crate) fn from_sheets(sheets: Vec<SheetTable>) -> Self {
        CombinedTable { sheets }
    }

    pub fn sheets(&self) -> &[SheetTable] {
        &self.sheets
    }

    /// Total number of rows across all sheets.
    pub fn len(&self) -> usize {
        self.sheets.iter().map(SheetTable::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows in sheet-major order.
    pub fn records(&self) -> impl Iterator<Item = RecordRef<'_>> {
        self.sheets.iter().flat_map(|sheet| {
            sheet.rows.iter().map(move |values| RecordRef {
                sheet,
                values: values.as_slice(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SheetTable {
        SheetTable::new(
            "s",
            vec!["년".to_owned(), "".to_owned(), "년".to_owned(), "이름".to_owned()],
            vec![
                vec![Value::Number(2023.0), Value::text("x"), Value::Number(1.0), Value::text("Kim")],
                vec![Value::Number(2024.0)],
            ],
        )
    }

    #[test]
    fn tolerates_blank_and_repeated_labels() {
        let table = table();
        assert_eq!(table.labels().len(), 4);
        assert_eq!(table.get(0, "년"), Some(&Value::Number(2023.0)));
        assert_eq!(table.get(1, "이름"), Some(&Value::Empty));
        assert_eq!(table.get(0, "missing"), None);
    }

    #[test]
    fn constant_columns_replace_same_labels() {
        let mut table = table();
        table.set_constant("이름", Value::text("Lee"));
        table.set_constant("시트명", Value::text("s"));
        assert_eq!(table.labels(), &["년", "", "년", "이름", "시트명"]);
        assert_eq!(table.rows()[0].len(), 5);
        assert_eq!(table.get(0, "이름"), Some(&Value::text("Lee")));
        assert_eq!(table.get(1, "시트명"), Some(&Value::text("s")));
    }

    #[test]
    fn records_are_sheet_major() {
        let first = SheetTable::new("a", vec!["x".to_owned()], vec![vec![Value::Number(1.0)], vec![Value::Number(2.0)]]);
        let second = SheetTable::new("b", vec!["y".to_owned(), "x".to_owned()], vec![vec![Value::Empty, Value::Number(3.0)]]);
        let combined = CombinedTable::from_sheets(vec![first, second]);
        let values: Vec<(String, Option<Value>)> = combined
            .records()
            .map(|record| {
                let col = record.sheet.position(|label| label == "x");
                (record.sheet.sheet_name().to_owned(), col.and_then(|col| record.at(col)).cloned())
            })
            .collect();
        assert_eq!(combined.len(), 3);
        assert_eq!(
            values,
            vec![
                ("a".to_owned(), Some(Value::Number(1.0))),
                ("a".to_owned(), Some(Value::Number(2.0))),
                ("b".to_owned(), Some(Value::Number(3.0))),
            ]
        );
    }
}
