use std::collections::{BTreeMap, BTreeSet};

use super::model::Dataset;
use super::search::{SearchIndex, matches, normalize_query};

// ---------------------------------------------------------------------------
// Filter state: free-text query plus allowed labels per categorical column
// ---------------------------------------------------------------------------

/// Everything the user has chosen to narrow the table down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    /// Raw text typed in the search box.
    pub query: String,
    /// Columns concatenated into the searchable string, in display order.
    pub search_columns: Vec<String>,
    /// Per-column allowed category labels. A column not listed here is not
    /// filtered; an empty set hides every record.
    pub categories: BTreeMap<String, BTreeSet<String>>,
}

impl FilterState {
    /// Defaults for a freshly loaded dataset: no query, the default search
    /// columns that exist, and every observed label of every categorical
    /// column selected.
    pub fn initial(
        dataset: &Dataset,
        default_search_columns: &[String],
        categorical_columns: &[String],
    ) -> Self {
        let search_columns = default_search_columns
            .iter()
            .filter(|c| dataset.has_column(c))
            .cloned()
            .collect();

        let categories = categorical_columns
            .iter()
            .filter_map(|col| {
                dataset
                    .category_labels(col)
                    .map(|labels| (col.clone(), labels))
            })
            .collect();

        FilterState {
            query: String::new(),
            search_columns,
            categories,
        }
    }
}

/// Return indices of records that pass the text predicate and every
/// categorical predicate, in dataset order.
///
/// A record passes a categorical predicate when:
/// * The column is not in the dataset → passes (no constraint)
/// * The allowed set for that column is empty → fails
/// * The record's label (missing → `Unknown`) is in the allowed set → passes
pub fn filtered_indices(dataset: &Dataset, index: &SearchIndex, state: &FilterState) -> Vec<usize> {
    let needle = normalize_query(&state.query);

    // Resolve active predicates once; all-selected columns are dropped since
    // they accept every record.
    let mut predicates: Vec<(usize, &BTreeSet<String>)> = Vec::new();
    for (col, allowed) in &state.categories {
        let Some(col_idx) = dataset.column_position(col) else {
            continue;
        };
        if let Some(all_labels) = dataset.category_labels(col) {
            if !allowed.is_empty() && all_labels.is_subset(allowed) {
                continue;
            }
        }
        predicates.push((col_idx, allowed));
    }

    let view: Vec<usize> = dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(row, record)| {
            matches(index.haystack(*row), &needle)
                && predicates
                    .iter()
                    .all(|(col_idx, allowed)| allowed.contains(&record.get(*col_idx).category_label()))
        })
        .map(|(i, _)| i)
        .collect();

    log::debug!(
        "filter: {} of {} records pass ({} active column predicates)",
        view.len(),
        dataset.len(),
        predicates.len()
    );
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Record};

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn two_sats() -> Dataset {
        Dataset::new(
            cols(&["Name", "Operator", "Mission_Type"]),
            vec![
                Record::new(vec![text("Sat-A"), text("X"), text("Flyby")]),
                Record::new(vec![text("Sat-B"), text("Y"), text("Imaging")]),
            ],
        )
    }

    fn fleet() -> Dataset {
        Dataset::new(
            cols(&["Name", "Operator", "Mission_Type", "Current_Location"]),
            vec![
                Record::new(vec![text("Alpha"), text("ESA"), text("Flyby"), text("Mars")]),
                Record::new(vec![text("Beta"), text("NASA"), CellValue::Null, text("L2")]),
                Record::new(vec![text("Gamma"), text("NASA"), text("Imaging"), text("Mars")]),
                Record::new(vec![text("Delta"), CellValue::Null, text("Flyby"), CellValue::Null]),
                Record::new(vec![text("Epsilon"), text("JAXA"), text("Imaging"), text("L2")]),
            ],
        )
    }

    fn state_for(ds: &Dataset) -> FilterState {
        FilterState::initial(
            ds,
            &cols(&["Name", "Operator", "Notes"]),
            &cols(&["Mission_Type", "Operator", "Current_Location", "Earth_TLE_Available"]),
        )
    }

    fn apply(ds: &Dataset, state: &FilterState) -> Vec<usize> {
        let index = SearchIndex::build(ds, &state.search_columns);
        filtered_indices(ds, &index, state)
    }

    #[test]
    fn initial_state_skips_absent_columns() {
        let state = state_for(&fleet());
        assert_eq!(state.search_columns, cols(&["Name", "Operator"]));
        assert!(state.categories.contains_key("Mission_Type"));
        assert!(!state.categories.contains_key("Earth_TLE_Available"));
        assert!(state.categories["Mission_Type"].contains("Unknown"));
    }

    #[test]
    fn name_query_finds_single_record() {
        let ds = two_sats();
        let mut state = state_for(&ds);
        state.search_columns = cols(&["Name"]);
        state.query = "sat-a".into();
        assert_eq!(apply(&ds, &state), vec![0]);
    }

    #[test]
    fn category_filter_keeps_allowed_only() {
        let ds = two_sats();
        let mut state = state_for(&ds);
        state
            .categories
            .insert("Mission_Type".into(), BTreeSet::from(["Imaging".to_string()]));
        assert_eq!(apply(&ds, &state), vec![1]);
    }

    #[test]
    fn empty_allowed_set_hides_everything() {
        let ds = two_sats();
        let mut state = state_for(&ds);
        state.categories.insert("Mission_Type".into(), BTreeSet::new());
        assert!(apply(&ds, &state).is_empty());
    }

    #[test]
    fn empty_query_accepts_all_regardless_of_search_columns() {
        let ds = fleet();
        for search in [cols(&[]), cols(&["Name"]), cols(&["Operator", "Current_Location"])] {
            let mut state = state_for(&ds);
            state.search_columns = search;
            state.query = "   ".into();
            assert_eq!(apply(&ds, &state), vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn no_search_columns_matches_nothing_for_nonempty_query() {
        let ds = fleet();
        let mut state = state_for(&ds);
        state.search_columns.clear();
        state.query = "a".into();
        assert!(apply(&ds, &state).is_empty());
    }

    #[test]
    fn missing_values_match_unknown_label() {
        let ds = fleet();
        let mut state = state_for(&ds);
        state
            .categories
            .insert("Mission_Type".into(), BTreeSet::from(["Unknown".to_string()]));
        assert_eq!(apply(&ds, &state), vec![1]);
    }

    #[test]
    fn absent_columns_contribute_no_predicate() {
        let ds = fleet();
        let mut state = state_for(&ds);
        state.categories.insert("Earth_TLE_Available".into(), BTreeSet::new());
        assert_eq!(apply(&ds, &state).len(), ds.len());
    }

    #[test]
    fn predicates_combine_with_and() {
        let ds = fleet();
        let mut state = state_for(&ds);
        state.query = "a".into();
        state
            .categories
            .insert("Operator".into(), BTreeSet::from(["NASA".to_string()]));
        state
            .categories
            .insert("Current_Location".into(), BTreeSet::from(["Mars".to_string()]));
        assert_eq!(apply(&ds, &state), vec![2]);
    }

    /// View is an ordered subset, every kept record passes every predicate,
    /// every dropped record fails at least one, and filtering is idempotent.
    #[test]
    fn view_partitions_dataset() {
        let ds = fleet();
        let search_columns = cols(&["Name", "Operator"]);
        let index = SearchIndex::build(&ds, &search_columns);
        let queries = ["", "a", "nasa", "zzz"];
        let allowed_sets: [&[&str]; 4] = [&["Flyby"], &["Flyby", "Unknown"], &[], &["Imaging"]];

        for query in queries {
            for allowed in allowed_sets {
                let mut state = state_for(&ds);
                state.search_columns = search_columns.clone();
                state.query = query.to_string();
                state.categories.insert(
                    "Mission_Type".into(),
                    allowed.iter().map(|s| s.to_string()).collect(),
                );

                let view = filtered_indices(&ds, &index, &state);
                assert!(view.windows(2).all(|w| w[0] < w[1]));
                assert_eq!(view, filtered_indices(&ds, &index, &state));

                let needle = normalize_query(query);
                for row in 0..ds.len() {
                    let label = ds.value(row, "Mission_Type").unwrap().category_label();
                    let passes = matches(index.haystack(row), &needle)
                        && allowed.contains(&label.as_str());
                    assert_eq!(view.contains(&row), passes, "row {row} query {query:?}");
                }
            }
        }
    }

    #[test]
    fn all_selected_column_is_vacuous() {
        let ds = fleet();
        let state = state_for(&ds);
        assert_eq!(apply(&ds, &state), vec![0, 1, 2, 3, 4]);
    }
}
