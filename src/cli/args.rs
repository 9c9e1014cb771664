use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::models::ExecutionMode;
use crate::utils::constants::DEFAULT_COMPRESSION_LEVEL;
use crate::writers::OutputFormat;

#[derive(Parser)]
#[command(name = "disdro-l1")]
#[command(about = "Convert disdrometer L0 tables into standardised L1 products")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Hide progress output")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Compute every array as soon as it is described
    Eager,
    /// Keep arrays pending until validation and writing
    Deferred,
}

impl From<ModeArg> for ExecutionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Eager => ExecutionMode::Eager,
            ModeArg::Deferred => ExecutionMode::Deferred,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert one L0 file into an L1 product
    Convert {
        #[arg(short, long, help = "L0 Parquet or CSV file")]
        input: PathBuf,

        #[arg(short, long, help = "Station descriptor (YAML, JSON or TOML)")]
        station: PathBuf,

        #[arg(
            short,
            long,
            help = "Output path [default: L1_{campaign}_{station}.{zarr|parquet}]"
        )]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Zarr)]
        format: OutputFormat,

        #[arg(short, long, value_enum, default_value_t = ModeArg::Eager)]
        mode: ModeArg,

        #[arg(short, long, default_value_t = DEFAULT_COMPRESSION_LEVEL)]
        compression_level: i32,

        #[arg(long, help = "Batch identifier used in logs [default: input file stem]")]
        batch_id: Option<String>,
    },

    /// Convert every L0 file of a directory, one L1 product per file
    ConvertDir {
        #[arg(short, long, help = "Directory containing L0 Parquet or CSV files")]
        input_dir: PathBuf,

        #[arg(short, long, help = "Station descriptor (YAML, JSON or TOML)")]
        station: PathBuf,

        #[arg(short, long, help = "Directory receiving the L1 products")]
        output_dir: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Zarr)]
        format: OutputFormat,

        #[arg(short, long, value_enum, default_value_t = ModeArg::Eager)]
        mode: ModeArg,

        #[arg(short, long, default_value_t = DEFAULT_COMPRESSION_LEVEL)]
        compression_level: i32,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// List the sensors with L1 standards
    Sensors,

    /// Summarise a written L1 product
    Info {
        #[arg(help = "Zarr store or Parquet file")]
        path: PathBuf,
    },
}
