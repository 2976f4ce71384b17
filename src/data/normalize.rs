use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::model::{CellValue, Dataset};

/// Which columns get which clean-up after a load. Each step is skipped when
/// its column is not in the dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeRules {
    pub timestamp_columns: Vec<String>,
    pub boolean_text_columns: Vec<String>,
    pub free_text_columns: Vec<String>,
}

const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%b %d, %Y", "%m/%d/%Y"];

/// Apply all rules to `dataset` in place.
pub fn normalize(dataset: &mut Dataset, rules: &NormalizeRules) {
    for col in &rules.timestamp_columns {
        map_column(dataset, col, coerce_timestamp);
    }
    for col in &rules.boolean_text_columns {
        map_column(dataset, col, stringify);
    }
    for col in &rules.free_text_columns {
        map_column(dataset, col, stringify);
    }
}

fn map_column(dataset: &mut Dataset, column: &str, f: fn(&CellValue) -> CellValue) {
    let Some(col_idx) = dataset.column_position(column) else {
        return;
    };
    log::debug!("normalizing column {column}");
    for record in dataset.records_mut() {
        if let Some(cell) = record.cells.get_mut(col_idx) {
            *cell = f(cell);
        }
    }
}

/// Missing cells stay missing; anything else becomes its field text.
fn stringify(value: &CellValue) -> CellValue {
    match value {
        CellValue::Null | CellValue::String(_) => value.clone(),
        other => CellValue::String(other.to_field()),
    }
}

fn coerce_timestamp(value: &CellValue) -> CellValue {
    match value {
        CellValue::Timestamp(_) => value.clone(),
        CellValue::String(s) => parse_timestamp(s)
            .map(CellValue::Timestamp)
            .unwrap_or(CellValue::Null),
        _ => CellValue::Null,
    }
}

/// Parse a date or date-time in any of the accepted layouts. A trailing `Z`
/// or ` UTC` is accepted; offsets are converted to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    let s = s
        .strip_suffix(" UTC")
        .or_else(|| s.strip_suffix('Z'))
        .unwrap_or(s);
    DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
        .or_else(|| {
            DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(s, layout).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
