use std::collections::HashMap;

use super::model::Dataset;

/// One bar of a chart: a category label and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Frequency counts of one column over the filtered view, most frequent
/// first. Ties keep the order in which labels were first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub column: String,
    pub counts: Vec<ValueCount>,
}

impl Aggregate {
    /// Sum of all counts; equals the size of the view it was computed over.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[cfg(test)]
    pub fn count_of(&self, value: &str) -> Option<usize> {
        self.counts.iter().find(|c| c.value == value).map(|c| c.count)
    }
}

/// Count category labels of `column` over the records in `view`. Missing
/// cells are counted under `Unknown`. `None` when the column does not exist.
pub fn value_counts(dataset: &Dataset, view: &[usize], column: &str) -> Option<Aggregate> {
    let col_idx = dataset.column_position(column)?;

    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();
    for record in view.iter().filter_map(|&row| dataset.records().get(row)) {
        let label = record.get(col_idx).category_label();
        match slots.get(&label) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                slots.insert(label.clone(), counts.len());
                counts.push(ValueCount {
                    value: label,
                    count: 1,
                });
            }
        }
    }
    // Stable, so equal counts stay in first-seen order.
    counts.sort_by(|a, b| b.count.cmp(&a.count));

    Some(Aggregate {
        column: column.to_string(),
        counts,
    })
}

/// Number of distinct non-missing values of `column` in `view`, `None` when
/// the column does not exist.
pub fn distinct_count(dataset: &Dataset, view: &[usize], column: &str) -> Option<usize> {
    let col_idx = dataset.column_position(column)?;
    let distinct: std::collections::HashSet<_> = view
        .iter()
        .filter_map(|&row| dataset.records().get(row))
        .map(|r| r.get(col_idx))
        .filter(|v| !v.is_null())
        .collect();
    Some(distinct.len())
}
