use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConversionError>;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unknown sensor '{sensor_name}'")]
    UnknownSensor { sensor_name: String },

    #[error("Sensor {sensor} is recognised but has no profile defined yet")]
    UnsupportedSensor { sensor: String },

    #[error("Sensor {sensor}: the following L0 raw fields are missing: {}", .fields.join(", "))]
    MissingRawField { sensor: String, fields: Vec<String> },

    #[error("Field {field}, row {row}: cannot parse '{token}' as {dtype}")]
    InvalidRawValue {
        field: String,
        row: usize,
        token: String,
        dtype: String,
    },

    #[error(
        "Field {field}: cannot reshape {n_observations} observations into {shape:?}{}: {cause}",
        .row.map(|r| format!(" (first malformed row: {})", r)).unwrap_or_default()
    )]
    ShapeMismatch {
        field: String,
        shape: Vec<usize>,
        n_observations: usize,
        row: Option<usize>,
        cause: String,
    },

    #[error("Variable {variable}: dimension {dimension} has length {found}, coordinate has {expected}")]
    CoordinateMismatch {
        variable: String,
        dimension: String,
        expected: usize,
        found: usize,
    },

    #[error("Sensor {sensor}: dataset violates L1 standards: {}", .violations.join("; "))]
    StandardsViolation {
        sensor: String,
        violations: Vec<String>,
    },

    #[error("Failed to write {}: {source}", .destination.display())]
    DestinationWrite {
        destination: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Zarr error: {0}")]
    Zarr(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ConversionError {
    pub fn destination<E>(destination: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        ConversionError::DestinationWrite {
            destination: destination.into(),
            source: source.into(),
        }
    }
}
