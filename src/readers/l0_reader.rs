use arrow::array::{Array, ArrayRef, Float64Array, StringArray, TimestampSecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ConversionError, Result};
use crate::models::{RawField, RawObservationBatch, SensorProfile};
use crate::utils::constants::{CSV_EXTENSION, L0_TIME_COLUMN, L0_TIME_FORMATS, PARQUET_EXTENSION};

/// Reads L0 tables (Parquet or CSV) into observation batches.
///
/// Raw spectrum columns are kept as strings, other numeric columns become
/// scalar series and remaining text columns are dropped.
pub struct L0Reader {
    raw_fields: BTreeSet<String>,
}

impl L0Reader {
    pub fn new() -> Self {
        Self {
            raw_fields: [RawField::FieldN, RawField::FieldV, RawField::RawData]
                .iter()
                .map(|f| f.name().to_string())
                .collect(),
        }
    }

    pub fn for_profile(profile: &SensorProfile) -> Self {
        Self {
            raw_fields: profile
                .raw_field_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_l0_file(path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(PARQUET_EXTENSION) || e.eq_ignore_ascii_case(CSV_EXTENSION))
    }

    pub fn read(&self, path: &Path) -> Result<RawObservationBatch> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some(PARQUET_EXTENSION) => self.read_parquet(path),
            Some(CSV_EXTENSION) => self.read_csv(path),
            _ => Err(ConversionError::InvalidFormat(format!(
                "unsupported L0 file {}, expected .parquet or .csv",
                path.display()
            ))),
        }
    }

    /// Read an L0 Apache Parquet table.
    pub fn read_parquet(&self, path: &Path) -> Result<RawObservationBatch> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut time = Vec::new();
        let mut raw_columns: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut scalar_columns: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();

        for batch in reader {
            let batch = batch?;
            let schema = batch.schema();

            for (field, column) in schema.fields().iter().zip(batch.columns()) {
                let name = field.name();
                if name == L0_TIME_COLUMN {
                    time.extend(timestamps(column)?);
                } else if self.raw_fields.contains(name) {
                    raw_columns
                        .entry(name.clone())
                        .or_default()
                        .extend(strings(column)?);
                } else if field.data_type().is_numeric() {
                    scalar_columns
                        .entry(name.clone())
                        .or_default()
                        .extend(floats(column)?);
                } else {
                    debug!(column = %name, data_type = %field.data_type(), "ignoring L0 column");
                }
            }
        }

        info!(path = %path.display(), rows = time.len(), "read L0 parquet");
        RawObservationBatch::new(time, raw_columns, scalar_columns)
    }

    /// Read an L0 CSV table with a header row. Raw spectra must be quoted.
    pub fn read_csv(&self, path: &Path) -> Result<RawObservationBatch> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        let headers = reader.headers()?.clone();

        let time_index = headers
            .iter()
            .position(|h| h == L0_TIME_COLUMN)
            .ok_or_else(|| {
                ConversionError::InvalidFormat(format!("{} has no '{}' column", path.display(), L0_TIME_COLUMN))
            })?;

        let mut time = Vec::new();
        let mut text_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            time.push(parse_time(record.get(time_index).unwrap_or_default())?);
            for (i, value) in record.iter().enumerate().take(headers.len()) {
                text_columns[i].push(value.to_string());
            }
        }

        let mut raw_columns = BTreeMap::new();
        let mut scalar_columns = BTreeMap::new();
        for (i, (name, values)) in headers.iter().zip(text_columns).enumerate() {
            if i == time_index {
                continue;
            }
            if self.raw_fields.contains(name) {
                raw_columns.insert(name.to_string(), values);
            } else if let Some(numbers) = numeric_column(&values) {
                scalar_columns.insert(name.to_string(), numbers);
            } else {
                debug!(column = %name, "ignoring non numeric L0 column");
            }
        }

        info!(path = %path.display(), rows = time.len(), "read L0 csv");
        RawObservationBatch::new(time, raw_columns, scalar_columns)
    }
}

impl Default for L0Reader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an L0 timestamp: one of the accepted formats or epoch seconds.
pub fn parse_time(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    for format in L0_TIME_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(t);
        }
    }

    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.naive_utc())
        .ok_or_else(|| ConversionError::InvalidFormat(format!("invalid L0 time '{}'", value)))
}

fn timestamps(column: &ArrayRef) -> Result<Vec<NaiveDateTime>> {
    let seconds = cast(column, &DataType::Timestamp(TimeUnit::Second, None))?;
    let seconds = seconds
        .as_any()
        .downcast_ref::<TimestampSecondArray>()
        .ok_or_else(|| ConversionError::InvalidFormat("time column is not a timestamp".to_string()))?;

    (0..seconds.len())
        .map(|i| {
            if seconds.is_null(i) {
                return Err(ConversionError::InvalidFormat(format!("missing time at row {}", i)));
            }
            DateTime::from_timestamp(seconds.value(i), 0)
                .map(|t| t.naive_utc())
                .ok_or_else(|| ConversionError::InvalidFormat(format!("time out of range at row {}", i)))
        })
        .collect()
}

fn strings(column: &ArrayRef) -> Result<Vec<String>> {
    let text = cast(column, &DataType::Utf8)?;
    let text = text
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| ConversionError::InvalidFormat("raw column is not text".to_string()))?;

    Ok((0..text.len())
        .map(|i| if text.is_null(i) { String::new() } else { text.value(i).to_string() })
        .collect())
}

fn floats(column: &ArrayRef) -> Result<Vec<Option<f64>>> {
    let values = cast(column, &DataType::Float64)?;
    let values = values
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| ConversionError::InvalidFormat("column is not numeric".to_string()))?;
    Ok(values.iter().collect())
}

/// `Some` when every non-empty cell is a number.
fn numeric_column(values: &[String]) -> Option<Vec<Option<f64>>> {
    values
        .iter()
        .map(|v| {
            if v.is_empty() || v.eq_ignore_ascii_case("nan") {
                Some(None)
            } else {
                v.parse::<f64>().ok().map(Some)
            }
        })
        .collect()
}
