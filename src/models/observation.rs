use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use crate::error::{ConversionError, Result};

/// L0 observations of one station as read from a tabular file.
///
/// Columns are stored column-wise; every column has one entry per timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawObservationBatch {
    time: Vec<NaiveDateTime>,
    raw_columns: BTreeMap<String, Vec<String>>,
    scalar_columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl RawObservationBatch {
    pub fn new(
        time: Vec<NaiveDateTime>,
        raw_columns: BTreeMap<String, Vec<String>>,
        scalar_columns: BTreeMap<String, Vec<Option<f64>>>,
    ) -> Result<Self> {
        let n_rows = time.len();

        for (name, column) in &raw_columns {
            check_column_length(name, column.len(), n_rows)?;
        }
        for (name, column) in &scalar_columns {
            check_column_length(name, column.len(), n_rows)?;
        }

        Ok(Self {
            time,
            raw_columns,
            scalar_columns,
        })
    }

    pub fn builder(time: Vec<NaiveDateTime>) -> RawObservationBatchBuilder {
        RawObservationBatchBuilder {
            time,
            raw_columns: BTreeMap::new(),
            scalar_columns: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[NaiveDateTime] {
        &self.time
    }

    /// Seconds since the Unix epoch, as stored in the `time` coordinate.
    pub fn time_as_epoch_seconds(&self) -> Vec<i64> {
        self.time.iter().map(|t| t.and_utc().timestamp()).collect()
    }

    pub fn raw_column(&self, name: &str) -> Option<&[String]> {
        self.raw_columns.get(name).map(|c| c.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.raw_columns.contains_key(name) || self.scalar_columns.contains_key(name)
    }

    pub fn scalar_columns(&self) -> &BTreeMap<String, Vec<Option<f64>>> {
        &self.scalar_columns
    }
}

fn check_column_length(name: &str, len: usize, n_rows: usize) -> Result<()> {
    if len != n_rows {
        return Err(ConversionError::InvalidFormat(format!(
            "column '{}' has {} rows, expected {}",
            name, len, n_rows
        )));
    }
    Ok(())
}

pub struct RawObservationBatchBuilder {
    time: Vec<NaiveDateTime>,
    raw_columns: BTreeMap<String, Vec<String>>,
    scalar_columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl RawObservationBatchBuilder {
    pub fn raw_column(mut self, name: &str, values: Vec<String>) -> Self {
        self.raw_columns.insert(name.to_string(), values);
        self
    }

    pub fn scalar_column(mut self, name: &str, values: Vec<Option<f64>>) -> Self {
        self.scalar_columns.insert(name.to_string(), values);
        self
    }

    pub fn build(self) -> Result<RawObservationBatch> {
        RawObservationBatch::new(self.time, self.raw_columns, self.scalar_columns)
    }
}
