use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{ConversionError, Result};
use crate::models::{
    ArrayData, Dtype, ExecutionMode, FieldArray, GriddedDataset, RawField, RawObservationBatch,
    SensorName, SensorProfile, StationAttrs,
};
use crate::processors::dataset_assembler::DatasetAssembler;
use crate::processors::matrix_reshaper::MatrixReshaper;
use crate::processors::raw_field_parser::{
    check_raw_fields_available, FlagValueHandler, KeepFlagValues, RawFieldParser,
};
use crate::processors::standards_validator::StandardsValidator;
use crate::standards::SensorSchemaRegistry;
use crate::utils::constants::DEFAULT_COMPRESSION_LEVEL;
use crate::utils::logging::BatchContext;
use crate::utils::progress::ProgressReporter;
use crate::writers::{EncodingPlanner, L1Writer, OutputFormat};

/// One L0 batch and where its L1 product goes.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub batch_id: String,
    pub batch: Arc<RawObservationBatch>,
    pub attrs: StationAttrs,
    pub destination: PathBuf,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionSummary {
    pub batch_id: String,
    pub sensor: SensorName,
    pub n_time: usize,
    pub destination: PathBuf,
    pub format: OutputFormat,
    pub chunks: BTreeMap<String, Vec<usize>>,
}

impl ConversionSummary {
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Batch {} ({}): {} time steps -> {} [{}]\n",
            self.batch_id,
            self.sensor,
            self.n_time,
            self.destination.display(),
            self.format
        );
        for (name, chunks) in &self.chunks {
            summary.push_str(&format!("  {:<22} chunks {:?}\n", name, chunks));
        }
        summary
    }
}

/// Converts L0 observation batches into L1 products.
pub struct L1Processor {
    mode: ExecutionMode,
    max_workers: usize,
    compression_level: i32,
    flag_handler: Arc<dyn FlagValueHandler>,
}

impl Default for L1Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl L1Processor {
    pub fn new() -> Self {
        Self {
            mode: ExecutionMode::Eager,
            max_workers: num_cpus::get(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            flag_handler: Arc::new(KeepFlagValues),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_compression_level(mut self, compression_level: i32) -> Self {
        self.compression_level = compression_level;
        self
    }

    pub fn with_flag_handler(mut self, flag_handler: impl FlagValueHandler + 'static) -> Self {
        self.flag_handler = Arc::new(flag_handler);
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Build and validate the L1 dataset of `batch`.
    ///
    /// The sensor is resolved and the raw columns checked before any parsing.
    pub fn create_dataset(
        &self,
        batch: Arc<RawObservationBatch>,
        attrs: &StationAttrs,
        ctx: &BatchContext,
    ) -> Result<GriddedDataset> {
        let profile = SensorSchemaRegistry::lookup(&attrs.sensor_name)?;
        self.build_dataset(batch, attrs, &profile, ctx)
    }

    fn build_dataset(
        &self,
        batch: Arc<RawObservationBatch>,
        attrs: &StationAttrs,
        profile: &SensorProfile,
        ctx: &BatchContext,
    ) -> Result<GriddedDataset> {
        ctx.in_scope(|| {
            check_raw_fields_available(&batch, profile)?;
            info!(rows = batch.len(), mode = ?self.mode, "converting L0 batch");

            let n_observations = batch.len();
            let mut fields = BTreeMap::new();
            for spec in &profile.raw_fields {
                let field = spec.field;
                let trailing = profile.trailing_shape(field);
                let mut shape = vec![n_observations];
                shape.extend(&trailing);

                let array = self.raw_field_array(
                    Arc::clone(&batch),
                    profile.sensor,
                    field,
                    spec.n_bins,
                    spec.dtype,
                    trailing,
                    shape,
                );
                fields.insert(field, self.mode.realize(array)?);
            }

            let mut scalars = BTreeMap::new();
            for name in batch.scalar_columns().keys() {
                let array = scalar_array(Arc::clone(&batch), name.clone(), n_observations);
                scalars.insert(name.clone(), self.mode.realize(array)?);
            }

            let dataset = DatasetAssembler::assemble(
                fields,
                scalars,
                batch.time_as_epoch_seconds(),
                profile,
                attrs,
                ctx,
            )?;
            StandardsValidator::validate(&dataset, profile, ctx)?;
            Ok(dataset)
        })
    }

    /// Pending parse + reshape of one raw column.
    fn raw_field_array(
        &self,
        batch: Arc<RawObservationBatch>,
        sensor: SensorName,
        field: RawField,
        n_bins: usize,
        dtype: Dtype,
        trailing: Vec<usize>,
        shape: Vec<usize>,
    ) -> FieldArray {
        let flag_handler = Arc::clone(&self.flag_handler);
        FieldArray::pending(shape, dtype, move || {
            let column = batch
                .raw_column(field.name())
                .ok_or_else(|| ConversionError::MissingRawField {
                    sensor: sensor.to_string(),
                    fields: vec![field.name().to_string()],
                })?;
            let parsed = RawFieldParser::with_flag_handler(Arc::clone(&flag_handler))
                .parse(column, field, n_bins, dtype)?;
            MatrixReshaper::reshape(parsed, &trailing, batch.len())
        })
    }

    /// Convert one job end to end: dataset, encoding, write.
    pub fn convert_batch(&self, job: &ConversionJob) -> Result<ConversionSummary> {
        let sensor: SensorName = job.attrs.sensor_name.parse()?;
        let ctx = BatchContext::new(&job.batch_id, sensor);
        let profile = sensor.profile()?;

        let dataset = self.build_dataset(Arc::clone(&job.batch), &job.attrs, &profile, &ctx)?;
        let encoding = EncodingPlanner::new(self.compression_level)?.plan_encoding(&profile);
        let report = ctx.in_scope(|| L1Writer::write(&dataset, &encoding, &job.destination, job.format))?;

        Ok(ConversionSummary {
            batch_id: job.batch_id.clone(),
            sensor,
            n_time: report.n_time,
            destination: report.destination,
            format: report.format,
            chunks: report.chunks,
        })
    }

    /// Convert independent jobs on a pool of `max_workers` threads. A failed
    /// job only affects its own entry of the result.
    pub fn convert_all(
        &self,
        jobs: &[ConversionJob],
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<Result<ConversionSummary>>> {
        if let Some(p) = progress {
            p.set_message(&format!("Converting {} batches...", jobs.len()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ConversionError::Settings(e.to_string()))?;

        let results: Vec<Result<ConversionSummary>> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let result = self.convert_batch(job);
                    if let Err(ref e) = result {
                        error!(batch = %job.batch_id, error = %e, "batch conversion failed");
                    }
                    if let Some(p) = progress {
                        p.increment(1);
                    }
                    result
                })
                .collect()
        });

        let failed = results.iter().filter(|r| r.is_err()).count();
        if let Some(p) = progress {
            p.finish_with_message(&format!(
                "Converted {} of {} batches",
                jobs.len() - failed,
                jobs.len()
            ));
        }

        Ok(results)
    }
}

/// Scalar L0 series as a float64 `(time)` variable, missing values as NaN.
fn scalar_array(batch: Arc<RawObservationBatch>, name: String, n_observations: usize) -> FieldArray {
    FieldArray::pending(vec![n_observations], Dtype::Float64, move || {
        let values: Vec<f64> = batch
            .scalar_columns()
            .get(&name)
            .map(|column| column.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .unwrap_or_else(|| vec![f64::NAN; n_observations]);
        Ok(ArrayData::from_f64_values(Dtype::Float64, &values))
    })
}
