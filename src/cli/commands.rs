use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use crate::cli::args::{Cli, Commands};
use crate::error::{ConversionError, Result};
use crate::models::{SensorName, StationAttrs};
use crate::processors::{ConversionJob, ConversionSummary, L1Processor};
use crate::readers::L0Reader;
use crate::standards::SensorSchemaRegistry;
use crate::utils::constants::DEFAULT_COMPRESSION_LEVEL;
use crate::utils::filename::{default_l1_filename, l1_path_for_l0};
use crate::utils::progress::ProgressReporter;
use crate::writers::{OutputFormat, ParquetWriter, ZarrWriter};

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert {
            input,
            station,
            output,
            format,
            mode,
            compression_level,
            batch_id,
        } => {
            let attrs = StationAttrs::from_file(&station)?;
            let output = output.unwrap_or_else(|| default_l1_filename(&attrs, format));
            let batch_id = batch_id.unwrap_or_else(|| file_stem(&input));
            let reader = L0Reader::for_profile(&SensorSchemaRegistry::lookup(&attrs.sensor_name)?);

            println!("Converting L0 file: {}", input.display());
            println!("Sensor: {}", attrs.sensor_name);
            println!("Output ({}): {}", format, output.display());

            let progress = ProgressReporter::new_spinner("Converting L0 batch...", cli.quiet);

            let summary = tokio::task::spawn_blocking(move || -> Result<ConversionSummary> {
                let batch = reader.read(&input)?;
                if let Some(parent) = output.parent() {
                    std::fs::create_dir_all(parent)?;
                }

                let job = ConversionJob {
                    batch_id,
                    batch: Arc::new(batch),
                    attrs,
                    destination: output,
                    format,
                };
                L1Processor::new()
                    .with_mode(mode.into())
                    .with_compression_level(compression_level)
                    .convert_batch(&job)
            })
            .await??;

            progress.finish_with_message(&format!("Converted {} time steps", summary.n_time));
            println!("\n{}", summary.summary());
        }

        Commands::ConvertDir {
            input_dir,
            station,
            output_dir,
            format,
            mode,
            compression_level,
            max_workers,
        } => {
            let attrs = StationAttrs::from_file(&station)?;
            let reader = L0Reader::for_profile(&SensorSchemaRegistry::lookup(&attrs.sensor_name)?);
            let inputs = list_l0_files(&input_dir)?;
            if inputs.is_empty() {
                println!("No L0 files found in {}", input_dir.display());
                return Ok(());
            }
            std::fs::create_dir_all(&output_dir)?;

            println!("Converting {} L0 files from {}", inputs.len(), input_dir.display());
            println!("Workers: {}, format: {}", max_workers, format);

            let progress = ProgressReporter::new(inputs.len() as u64, "Converting L0 batches...", cli.quiet);

            let (summaries, failures) = tokio::task::spawn_blocking(move || -> Result<_> {
                let mut jobs = Vec::with_capacity(inputs.len());
                let mut failures = Vec::new();

                for input in &inputs {
                    match reader.read(input) {
                        Ok(batch) => jobs.push(ConversionJob {
                            batch_id: file_stem(input),
                            batch: Arc::new(batch),
                            attrs: attrs.clone(),
                            destination: l1_path_for_l0(input, &output_dir, format),
                            format,
                        }),
                        Err(e) => {
                            warn!(file = %input.display(), error = %e, "cannot read L0 file");
                            progress.increment(1);
                            failures.push((file_stem(input), e));
                        }
                    }
                }

                let processor = L1Processor::new()
                    .with_mode(mode.into())
                    .with_max_workers(max_workers)
                    .with_compression_level(compression_level);
                let results = processor.convert_all(&jobs, Some(&progress))?;

                let mut summaries = Vec::new();
                for (job, result) in jobs.iter().zip(results) {
                    match result {
                        Ok(summary) => summaries.push(summary),
                        Err(e) => failures.push((job.batch_id.clone(), e)),
                    }
                }
                Ok((summaries, failures))
            })
            .await??;

            for summary in &summaries {
                println!("{}", summary.summary());
            }
            for (batch_id, error) in &failures {
                eprintln!("❌ {}: {}", batch_id, error);
            }
            println!(
                "Converted {} of {} L0 files",
                summaries.len(),
                summaries.len() + failures.len()
            );
        }

        Commands::Sensors => {
            for profile in SensorSchemaRegistry::available_profiles() {
                println!("{} (time chunk {})", profile.sensor, profile.time_chunk);
                println!(
                    "  diameter classes: {}, velocity classes: {}",
                    profile.diameter_bins.len(),
                    profile.velocity_bins.len()
                );
                for spec in &profile.raw_fields {
                    println!(
                        "  {:<8} {:>5} values  {:<8} chunks {:?}",
                        spec.field.name(),
                        spec.n_bins,
                        spec.dtype.name(),
                        spec.chunks
                    );
                }
            }

            let pending: Vec<&str> = SensorName::ALL
                .iter()
                .filter(|s| s.profile().is_err())
                .map(|s| s.as_str())
                .collect();
            if !pending.is_empty() {
                println!("Recognised without standards: {}", pending.join(", "));
            }
        }

        Commands::Info { path } => {
            if !path.exists() {
                return Err(ConversionError::InvalidFormat(format!(
                    "{} does not exist",
                    path.display()
                )));
            }

            match OutputFormat::detect(&path)? {
                OutputFormat::Zarr => {
                    let info = ZarrWriter::store_info(&path)?;
                    println!("{}", info.summary());
                }
                OutputFormat::Parquet => {
                    let writer = ParquetWriter::new(DEFAULT_COMPRESSION_LEVEL, 1);
                    let info = writer.get_file_info(&path)?;
                    println!("{}", info.summary());
                }
            }
        }
    }

    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// L0 files of `dir`, sorted by name.
fn list_l0_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if L0Reader::is_l0_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
