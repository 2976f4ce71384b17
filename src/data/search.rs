use super::model::Dataset;

/// Per-record lowercase haystack built from the selected text columns.
///
/// Lives beside the dataset rather than inside it, so it can never end up in
/// an export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchIndex {
    haystacks: Vec<String>,
}

impl SearchIndex {
    /// Join the selected columns of every record with a single space. Missing
    /// cells contribute an empty string; columns not in the dataset are ignored.
    pub fn build(dataset: &Dataset, columns: &[String]) -> Self {
        let positions: Vec<usize> = columns
            .iter()
            .filter_map(|c| dataset.column_position(c))
            .collect();

        let haystacks = dataset
            .records()
            .iter()
            .map(|record| {
                positions
                    .iter()
                    .map(|&i| record.get(i).to_field())
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase()
            })
            .collect();

        SearchIndex { haystacks }
    }

    /// Searchable string of record `row`; empty when out of range.
    pub fn haystack(&self, row: usize) -> &str {
        self.haystacks.get(row).map(String::as_str).unwrap_or("")
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.haystacks.len()
    }
}

/// Normalize a user query: surrounding whitespace dropped, lowercased.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Literal, case-insensitive substring test. `needle` must already be
/// normalized with [`normalize_query`]; an empty needle matches everything.
pub fn matches(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Record};

    fn dataset() -> Dataset {
        Dataset::new(
            vec!["Name".into(), "Operator".into(), "Notes".into()],
            vec![
                Record::new(vec![
                    CellValue::String("Sat-A".into()),
                    CellValue::String("NASA".into()),
                    CellValue::Null,
                ]),
                Record::new(vec![
                    CellValue::String("Sat-B".into()),
                    CellValue::Null,
                    CellValue::String("Deep Space".into()),
                ]),
            ],
        )
    }

    #[test]
    fn joins_selected_columns_lowercase() {
        let idx = SearchIndex::build(&dataset(), &["Name".into(), "Operator".into()]);
        assert_eq!(idx.haystack(0), "sat-a nasa");
        assert_eq!(idx.haystack(1), "sat-b ");
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let idx = SearchIndex::build(&dataset(), &["Notes".into(), "COSPAR".into()]);
        assert_eq!(idx.haystack(0), "");
        assert_eq!(idx.haystack(1), "deep space");
    }

    #[test]
    fn no_columns_means_empty_haystacks() {
        let idx = SearchIndex::build(&dataset(), &[]);
        assert_eq!(idx.len(), 2);
        assert!(!matches(idx.haystack(0), &normalize_query("sat")));
        assert!(matches(idx.haystack(0), &normalize_query("   ")));
    }

    #[test]
    fn query_is_literal_and_case_insensitive() {
        let idx = SearchIndex::build(&dataset(), &["Name".into()]);
        assert!(matches(idx.haystack(0), &normalize_query("  SAT-A ")));
        assert!(!matches(idx.haystack(0), &normalize_query("sat.a")));
    }
}
