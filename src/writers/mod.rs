pub mod chunking;
pub mod encoding_planner;
pub mod parquet_writer;
pub mod zarr_writer;

pub use chunking::{realign, AlignedVariable};
pub use encoding_planner::{Codec, EncodingPlanner, EncodingProfile, FillValuePolicy, VariableEncoding};
pub use parquet_writer::{ParquetFileInfo, ParquetLayout, ParquetWriter};
pub use zarr_writer::{ZarrArrayInfo, ZarrStoreInfo, ZarrWriter};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{ConversionError, Result};
use crate::models::GriddedDataset;
use crate::utils::constants::{PARQUET_EXTENSION, ZARR_EXTENSION};

/// On-disk format of an L1 product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Zarr V3 directory store
    #[default]
    Zarr,
    /// Single Parquet file
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Zarr => ZARR_EXTENSION,
            OutputFormat::Parquet => PARQUET_EXTENSION,
        }
    }

    /// Guess the format of an existing product from its path.
    pub fn detect(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Ok(OutputFormat::Zarr);
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(PARQUET_EXTENSION) => Ok(OutputFormat::Parquet),
            Some(ext) if ext.eq_ignore_ascii_case(ZARR_EXTENSION) => Ok(OutputFormat::Zarr),
            _ => Err(ConversionError::InvalidFormat(format!(
                "cannot tell the L1 format of {}",
                path.display()
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What a write produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteReport {
    pub destination: PathBuf,
    pub format: OutputFormat,
    pub n_time: usize,
    /// Chunk shape of every written variable.
    pub chunks: BTreeMap<String, Vec<usize>>,
}

/// Persists validated datasets.
pub struct L1Writer;

impl L1Writer {
    /// Cast every variable to its planned encoding and write it in `format`.
    pub fn write(
        dataset: &GriddedDataset,
        encoding: &EncodingProfile,
        destination: &Path,
        format: OutputFormat,
    ) -> Result<WriteReport> {
        if encoding.sensor != dataset.sensor() {
            return Err(ConversionError::Settings(format!(
                "encoding is for {} but the dataset is {}",
                encoding.sensor,
                dataset.sensor()
            )));
        }

        let variables = realign(dataset, encoding)?;
        let global_attrs: Map<String, Value> = dataset
            .attrs()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        match format {
            OutputFormat::Zarr => ZarrWriter::write(&variables, &global_attrs, destination)?,
            OutputFormat::Parquet => ParquetWriter::from_encoding(encoding).write_dataset(
                dataset.sensor(),
                &variables,
                &global_attrs,
                destination,
            )?,
        }

        info!(
            destination = %destination.display(),
            format = %format,
            "L1 product written"
        );

        Ok(WriteReport {
            destination: destination.to_path_buf(),
            format,
            n_time: dataset.n_time(),
            chunks: variables
                .into_iter()
                .map(|v| (v.name, v.encoding.chunks))
                .collect(),
        })
    }
}
