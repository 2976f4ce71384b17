use thiserror::Error;

/// Failures of the data layer. Any of these aborts the whole load or export;
/// a dataset is never partially kept.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("row {row}: {reason}")]
    Malformed { row: usize, reason: String },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}

pub type DataResult<T> = Result<T, DataError>;
