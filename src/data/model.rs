use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;

/// Label used for missing cells wherever values are treated as categories.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Layout used when a timestamp is written back out or shown in the table.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static NULL_CELL: CellValue = CellValue::Null;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes a CSV reader infers.
/// Used as a `BTreeSet` key downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Timestamp(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Timestamp(t) => t.hash(state),
            CellValue::Null => {}
        }
    }
}

impl CellValue {
    /// Text written to a flat file for this cell. Missing cells become an
    /// empty field; floats keep a decimal point so they re-load as floats.
    pub fn to_field(&self) -> String {
        match self {
            CellValue::String(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(v) => format!("{v:?}"),
            CellValue::Bool(true) => "True".to_string(),
            CellValue::Bool(false) => "False".to_string(),
            CellValue::Timestamp(t) => t.format(TIMESTAMP_FORMAT).to_string(),
            CellValue::Null => String::new(),
        }
    }

    /// Label used for categorical filtering and counting.
    pub fn category_label(&self) -> String {
        match self {
            CellValue::Null => UNKNOWN_LABEL.to_string(),
            other => other.to_field(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// One spacecraft row. Cells are aligned with [`Dataset::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cells: Vec<CellValue>,
}

impl Record {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    pub fn get(&self, col_idx: usize) -> &CellValue {
        self.cells.get(col_idx).unwrap_or(&NULL_CELL)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table. Column order follows the source header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
    column_index: HashMap<String, usize>,
}

impl Dataset {
    /// Build a dataset, padding short records with nulls so every record has
    /// exactly one cell per column.
    pub fn new(columns: Vec<String>, mut records: Vec<Record>) -> Self {
        for record in &mut records {
            record.cells.resize(columns.len(), CellValue::Null);
        }
        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Dataset {
            columns,
            records,
            column_index,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn column_position(&self, column: &str) -> Option<usize> {
        self.column_index.get(column).copied()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index.contains_key(column)
    }

    /// Cell of record `row` in `column`, `None` if the column does not exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col_idx = self.column_position(column)?;
        self.records.get(row).map(|r| r.get(col_idx))
    }

    /// Sorted set of category labels observed in a column (missing → `Unknown`).
    pub fn category_labels(&self, column: &str) -> Option<BTreeSet<String>> {
        let col_idx = self.column_position(column)?;
        Some(
            self.records
                .iter()
                .map(|r| r.get(col_idx).category_label())
                .collect(),
        )
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    #[test]
    fn field_text_keeps_float_marker() {
        assert_eq!(CellValue::Float(1.0).to_field(), "1.0");
        assert_eq!(CellValue::Float(0.25).to_field(), "0.25");
        assert_eq!(CellValue::Integer(42).to_field(), "42");
        assert_eq!(CellValue::Bool(true).to_field(), "True");
        assert_eq!(CellValue::Null.to_field(), "");
    }

    #[test]
    fn timestamp_field_uses_fixed_layout() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(6, 7, 8))
            .unwrap();
        assert_eq!(CellValue::Timestamp(ts).to_field(), "2024-03-05 06:07:08");
    }

    #[test]
    fn missing_cells_are_labelled_unknown() {
        assert_eq!(CellValue::Null.category_label(), UNKNOWN_LABEL);
        assert_eq!(text("Flyby").category_label(), "Flyby");
    }

    #[test]
    fn short_records_are_padded() {
        let ds = Dataset::new(
            vec!["Name".into(), "Operator".into()],
            vec![Record::new(vec![text("Sat-A")])],
        );
        assert_eq!(ds.value(0, "Operator"), Some(&CellValue::Null));
        assert_eq!(ds.value(0, "Missing"), None);
    }

    #[test]
    fn category_labels_include_unknown() {
        let ds = Dataset::new(
            vec!["Mission_Type".into()],
            vec![
                Record::new(vec![text("Flyby")]),
                Record::new(vec![CellValue::Null]),
                Record::new(vec![text("Flyby")]),
            ],
        );
        let labels = ds.category_labels("Mission_Type").unwrap();
        assert_eq!(
            labels.into_iter().collect::<Vec<_>>(),
            vec!["Flyby".to_string(), "Unknown".to_string()]
        );
        assert!(ds.category_labels("Operator").is_none());
    }

    #[test]
    fn ordering_groups_by_kind() {
        let mut values = vec![text("b"), CellValue::Integer(3), CellValue::Null, text("a")];
        values.sort();
        assert_eq!(
            values,
            vec![CellValue::Null, CellValue::Integer(3), text("a"), text("b")]
        );
    }
}
