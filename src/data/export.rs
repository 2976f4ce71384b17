use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Number, Value as JsonValue};

use super::error::DataResult;
use super::loader::FileFormat;
use super::model::{CellValue, Dataset, Record};

/// Write the records of `view` to `path` in `format`. Columns keep the
/// dataset's order.
pub fn export_file(path: &Path, dataset: &Dataset, view: &[usize], format: FileFormat) -> DataResult<()> {
    let file = std::fs::File::create(path)?;
    write_view(file, dataset, view, format)?;
    log::info!("exported {} records to {}", view.len(), path.display());
    Ok(())
}

/// Serialize the records of `view` into memory.
#[cfg(test)]
pub fn export_bytes(dataset: &Dataset, view: &[usize], format: FileFormat) -> DataResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_view(&mut buf, dataset, view, format)?;
    Ok(buf)
}

fn write_view<W: Write + Send>(out: W, dataset: &Dataset, view: &[usize], format: FileFormat) -> DataResult<()> {
    let rows: Vec<&Record> = view
        .iter()
        .filter_map(|&row| dataset.records().get(row))
        .collect();
    match format {
        FileFormat::Csv => write_csv(out, dataset.columns(), &rows),
        FileFormat::Json => write_json(out, dataset.columns(), &rows),
        FileFormat::Parquet => write_parquet(out, dataset.columns(), &rows),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn write_csv<W: Write>(out: W, columns: &[String], rows: &[&Record]) -> DataResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(columns)?;
    for record in rows {
        writer.write_record(record.cells.iter().map(CellValue::to_field))?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON (records-oriented)
// ---------------------------------------------------------------------------

fn write_json<W: Write>(out: W, columns: &[String], rows: &[&Record]) -> DataResult<()> {
    let records: Vec<JsonValue> = rows
        .iter()
        .map(|record| {
            let obj: Map<String, JsonValue> = columns
                .iter()
                .zip(&record.cells)
                .map(|(col, cell)| (col.clone(), cell_to_json(cell)))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();
    serde_json::to_writer_pretty(out, &records)?;
    Ok(())
}

fn cell_to_json(cell: &CellValue) -> JsonValue {
    match cell {
        CellValue::String(s) => JsonValue::String(s.clone()),
        CellValue::Integer(i) => JsonValue::Number((*i).into()),
        // JSON has no infinities; write those as their field text.
        CellValue::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(cell.to_field())),
        CellValue::Bool(b) => JsonValue::Bool(*b),
        CellValue::Timestamp(_) => JsonValue::String(cell.to_field()),
        CellValue::Null => JsonValue::Null,
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Arrow type for a column: the narrowest of Int64 / Float64 / Boolean that
/// fits every non-missing cell, else Utf8.
fn column_type<'a>(cells: impl Iterator<Item = &'a CellValue>) -> DataType {
    let mut kind: Option<DataType> = None;
    for cell in cells {
        let cell_kind = match cell {
            CellValue::Null => continue,
            CellValue::Integer(_) => DataType::Int64,
            CellValue::Float(_) => DataType::Float64,
            CellValue::Bool(_) => DataType::Boolean,
            CellValue::String(_) | CellValue::Timestamp(_) => return DataType::Utf8,
        };
        kind = match (kind, cell_kind) {
            (None, k) => Some(k),
            (Some(a), b) if a == b => Some(a),
            (Some(DataType::Int64), DataType::Float64) | (Some(DataType::Float64), DataType::Int64) => {
                Some(DataType::Float64)
            }
            _ => return DataType::Utf8,
        };
    }
    kind.unwrap_or(DataType::Utf8)
}

fn build_array(data_type: &DataType, rows: &[&Record], col_idx: usize) -> ArrayRef {
    let cells = rows.iter().map(|r| r.get(col_idx));
    match data_type {
        DataType::Int64 => Arc::new(Int64Array::from(
            cells
                .map(|c| match c {
                    CellValue::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            cells
                .map(|c| match c {
                    CellValue::Float(f) => Some(*f),
                    CellValue::Integer(i) => Some(*i as f64),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Boolean => Arc::new(BooleanArray::from(
            cells
                .map(|c| match c {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            cells
                .map(|c| (!c.is_null()).then(|| c.to_field()))
                .collect::<Vec<_>>(),
        )),
    }
}

fn write_parquet<W: Write + Send>(out: W, columns: &[String], rows: &[&Record]) -> DataResult<()> {
    let types: Vec<DataType> = (0..columns.len())
        .map(|i| column_type(rows.iter().map(|r| r.get(i))))
        .collect();

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .zip(&types)
            .map(|(name, dt)| Field::new(name, dt.clone(), true))
            .collect::<Vec<_>>(),
    ));

    let mut writer = ArrowWriter::try_new(out, schema.clone(), None)?;
    if !columns.is_empty() && !rows.is_empty() {
        let arrays: Vec<ArrayRef> = types
            .iter()
            .enumerate()
            .map(|(i, dt)| build_array(dt, rows, i))
            .collect();
        let batch = RecordBatch::try_new(schema, arrays)?;
        writer.write(&batch)?;
    }
    writer.close()?;
    Ok(())
}
