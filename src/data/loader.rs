use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type,
};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use serde_json::Value as JsonValue;

use super::error::{DataError, DataResult};
use super::model::{CellValue, Dataset, Record};
use super::normalize::{NormalizeRules, normalize};

// ---------------------------------------------------------------------------
// File formats
// ---------------------------------------------------------------------------

/// Flat tabular formats understood by the loader and the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    #[default]
    Csv,
    Json,
    Parquet,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> DataResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| DataError::UnsupportedFormat(ext.to_string()))
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Parquet => "parquet",
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset from a file. Dispatch by extension, then normalize.
///
/// Supported formats:
/// * `.csv`     – header row of column names (the usual case)
/// * `.json`    – `[{ "Name": "...", "Operator": "...", ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_file(path: &Path, rules: &NormalizeRules) -> DataResult<Dataset> {
    let format = FileFormat::from_path(path)?;
    let mut dataset = match format {
        FileFormat::Csv => read_csv(std::fs::File::open(path)?, &rules.free_text_columns)?,
        FileFormat::Json => read_json(std::fs::File::open(path)?)?,
        FileFormat::Parquet => read_parquet(std::fs::File::open(path)?)?,
    };
    normalize(&mut dataset, rules);
    Ok(dataset)
}

/// Load an uploaded byte stream. The format comes from the upload's file name;
/// unknown names are read as CSV.
pub fn load_bytes(name: &str, bytes: &[u8], rules: &NormalizeRules) -> DataResult<Dataset> {
    let format = FileFormat::from_path(Path::new(name)).unwrap_or_default();
    let mut dataset = match format {
        FileFormat::Csv => read_csv(Cursor::new(bytes), &rules.free_text_columns)?,
        FileFormat::Json => read_json(Cursor::new(bytes))?,
        FileFormat::Parquet => read_parquet(bytes::Bytes::copy_from_slice(bytes))?,
    };
    normalize(&mut dataset, rules);
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Markers that read as a missing value.
const NA_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "<NA>", "#N/A",
];

/// Header row with column names, one record per line. Rows with a different
/// number of fields than the header are rejected by the reader.
///
/// Types are decided per column: a column is numeric or boolean only when
/// every non-missing cell parses as such, otherwise its cells keep their text
/// as written. Columns in `text_columns` always keep their text.
fn read_csv<R: Read>(source: R, text_columns: &[String]) -> DataResult<Dataset> {
    let mut reader = csv::Reader::from_reader(source);
    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        rows.push(result?);
    }

    let kinds: Vec<ColumnKind> = columns
        .iter()
        .enumerate()
        .map(|(col_idx, name)| {
            if text_columns.contains(name) {
                ColumnKind::Text
            } else {
                ColumnKind::infer(rows.iter().filter_map(|row| row.get(col_idx)))
            }
        })
        .collect();

    let records = rows
        .iter()
        .map(|row| {
            Record::new(
                row.iter()
                    .zip(&kinds)
                    .map(|(field, kind)| kind.parse(field))
                    .collect(),
            )
        })
        .collect();

    Ok(Dataset::new(columns, records))
}

fn is_na(s: &str) -> bool {
    NA_MARKERS.contains(&s)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Storage type of a CSV column, narrowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    fn infer<'a>(fields: impl Iterator<Item = &'a str>) -> Self {
        let (mut ints, mut floats, mut bools) = (true, true, true);
        let mut seen = false;
        for field in fields.filter(|f| !is_na(f)) {
            seen = true;
            ints &= field.parse::<i64>().is_ok();
            floats &= field.parse::<f64>().is_ok();
            bools &= parse_bool(field).is_some();
            if !(ints || floats || bools) {
                return Self::Text;
            }
        }
        match (seen, ints, floats, bools) {
            (false, ..) => Self::Text,
            (_, true, ..) => Self::Integer,
            (_, _, true, _) => Self::Float,
            (_, _, _, true) => Self::Bool,
            _ => Self::Text,
        }
    }

    fn parse(self, field: &str) -> CellValue {
        if is_na(field) {
            return CellValue::Null;
        }
        let parsed = match self {
            Self::Integer => field.parse().ok().map(CellValue::Integer),
            Self::Float => field.parse().ok().map(CellValue::Float),
            Self::Bool => parse_bool(field).map(CellValue::Bool),
            Self::Text => None,
        };
        parsed.unwrap_or_else(|| CellValue::String(field.to_string()))
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, as written by the exporter):
///
/// ```json
/// [
///   { "Name": "Sat-A", "Operator": "X", "Mission_Type": "Flyby" },
///   ...
/// ]
/// ```
///
/// Keys missing from a row read as missing values; the column order is the
/// order in which keys are first seen.
fn read_json<R: Read>(source: R) -> DataResult<Dataset> {
    let root: JsonValue = serde_json::from_reader(source)?;

    let rows = root.as_array().ok_or_else(|| DataError::Malformed {
        row: 0,
        reason: "expected a top-level JSON array".to_string(),
    })?;

    let mut columns: Vec<String> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let obj = row.as_object().ok_or_else(|| DataError::Malformed {
            row: i,
            reason: "not a JSON object".to_string(),
        })?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let records = rows
        .iter()
        .filter_map(|row| row.as_object())
        .map(|obj| {
            Record::new(
                columns
                    .iter()
                    .map(|col| obj.get(col).map(json_to_cell).unwrap_or(CellValue::Null))
                    .collect(),
            )
        })
        .collect();

    Ok(Dataset::new(columns, records))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat scalar columns. Works with files written by
/// Pandas (`df.to_parquet()`), Polars, and the exporter. Column types other
/// than strings, integers, floats and booleans are read as their display text.
fn read_parquet<T: ChunkReader + 'static>(source: T) -> DataResult<Dataset> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(source)?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;
    let options = FormatOptions::default();

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let formatters = batch
            .columns()
            .iter()
            .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
            .collect::<Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .zip(&formatters)
                .map(|(col, fmt)| extract_cell(col, row, fmt))
                .collect();
            records.push(Record::new(cells));
        }
    }

    Ok(Dataset::new(columns, records))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize, fallback: &ArrayFormatter<'_>) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        _ => CellValue::String(fallback.value(row).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> NormalizeRules {
        NormalizeRules {
            timestamp_columns: vec!["Launch_Date_UTC".into()],
            boolean_text_columns: vec!["Earth_TLE_Available".into()],
            free_text_columns: vec!["Name".into(), "Operator".into(), "Notes".into()],
        }
    }

    const SAMPLE: &str = "\
Name,NORAD_ID,Operator,Mission_Type,Earth_TLE_Available,Launch_Date_UTC,Range_AU
Sat-A,25544,X,Flyby,True,2020-01-02,1.5
Sat-B,,Y,Imaging,False,unknown,NaN
";

    #[test]
    fn csv_cells_are_typed_and_normalized() {
        let ds = load_bytes("upload.csv", SAMPLE.as_bytes(), &rules()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns()[0], "Name");
        assert_eq!(ds.value(0, "NORAD_ID"), Some(&CellValue::Integer(25544)));
        assert_eq!(ds.value(1, "NORAD_ID"), Some(&CellValue::Null));
        assert_eq!(ds.value(0, "Range_AU"), Some(&CellValue::Float(1.5)));
        assert_eq!(ds.value(1, "Range_AU"), Some(&CellValue::Null));
        assert_eq!(
            ds.value(0, "Earth_TLE_Available"),
            Some(&CellValue::String("True".into()))
        );
        assert!(matches!(ds.value(0, "Launch_Date_UTC"), Some(CellValue::Timestamp(_))));
        assert_eq!(ds.value(1, "Launch_Date_UTC"), Some(&CellValue::Null));
    }

    #[test]
    fn free_text_keeps_numeric_looking_values_as_written() {
        let csv = "Name,Operator,Notes\n007,1.50,Infinity\nSat-B,Y,1e3\n";
        let ds = load_bytes("upload.csv", csv.as_bytes(), &rules()).unwrap();
        assert_eq!(ds.value(0, "Name"), Some(&CellValue::String("007".into())));
        assert_eq!(ds.value(0, "Operator"), Some(&CellValue::String("1.50".into())));
        assert_eq!(ds.value(0, "Notes"), Some(&CellValue::String("Infinity".into())));
        assert_eq!(ds.value(1, "Notes"), Some(&CellValue::String("1e3".into())));
    }

    #[test]
    fn mixed_columns_stay_text() {
        let csv = "Code,Count\n01,3\nA7,\n";
        let ds = load_bytes("upload.csv", csv.as_bytes(), &NormalizeRules::default()).unwrap();
        assert_eq!(ds.value(0, "Code"), Some(&CellValue::String("01".into())));
        assert_eq!(ds.value(1, "Code"), Some(&CellValue::String("A7".into())));
        assert_eq!(ds.value(0, "Count"), Some(&CellValue::Integer(3)));
        assert_eq!(ds.value(1, "Count"), Some(&CellValue::Null));
    }

    #[test]
    fn integer_columns_widen_to_float() {
        let csv = "Range_AU\n2\n1.25\n";
        let ds = load_bytes("upload.csv", csv.as_bytes(), &NormalizeRules::default()).unwrap();
        assert_eq!(ds.value(0, "Range_AU"), Some(&CellValue::Float(2.0)));
        assert_eq!(ds.value(1, "Range_AU"), Some(&CellValue::Float(1.25)));
    }

    #[test]
    fn ragged_csv_is_rejected() {
        let bad = "Name,Operator\nSat-A,X\nSat-B,Y,extra\n";
        let err = load_bytes("bad.csv", bad.as_bytes(), &rules()).unwrap_err();
        assert!(matches!(err, DataError::Csv(_)));
    }

    #[test]
    fn unknown_upload_names_read_as_csv() {
        let ds = load_bytes("clipboard", b"Name\nSat-A\n", &rules()).unwrap();
        assert_eq!(ds.value(0, "Name"), Some(&CellValue::String("Sat-A".into())));
    }

    #[test]
    fn unsupported_extension_fails() {
        let err = load_file(Path::new("observers.xlsx"), &rules()).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("absent.csv"), &rules()).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }

    #[test]
    fn json_rows_union_their_keys() {
        let json = r#"[
            {"Name": "Sat-A", "Operator": "X"},
            {"Name": "Sat-B", "Mission_Type": "Imaging", "Active": true}
        ]"#;
        let ds = load_bytes("set.json", json.as_bytes(), &rules()).unwrap();
        assert_eq!(ds.columns(), ["Name", "Operator", "Mission_Type", "Active"]);
        assert_eq!(ds.value(0, "Mission_Type"), Some(&CellValue::Null));
        assert_eq!(ds.value(1, "Active"), Some(&CellValue::Bool(true)));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        let err = load_bytes("set.json", b"[1, 2]", &rules()).unwrap_err();
        assert!(matches!(err, DataError::Malformed { row: 0, .. }));
        let err = load_bytes("set.json", b"{\"Name\": 1}", &rules()).unwrap_err();
        assert!(matches!(err, DataError::Malformed { .. }));
    }

    #[test]
    fn garbage_parquet_is_rejected() {
        let err = load_bytes("set.parquet", b"not parquet", &rules()).unwrap_err();
        assert!(matches!(err, DataError::Parquet(_)));
    }
}
