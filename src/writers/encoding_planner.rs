use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ConversionError, Result};
use crate::models::{Dimension, Dtype, SensorName, SensorProfile, Variable};
use crate::standards::SensorSchemaRegistry;
use crate::utils::constants::{DEFAULT_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL, MIN_COMPRESSION_LEVEL};

/// Chunk compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "lowercase")]
pub enum Codec {
    /// Blosc container around zstd. Shuffling is set per variable.
    Blosc { level: i32 },
}

impl Codec {
    pub fn level(&self) -> i32 {
        match self {
            Codec::Blosc { level } => *level,
        }
    }
}

/// What a reader sees for chunk padding past the array edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillValuePolicy {
    /// Floats: padding and declared fill are NaN.
    NaN,
    /// Integers: padding and declared fill are 0.
    Zero,
}

impl FillValuePolicy {
    pub fn for_dtype(dtype: Dtype) -> Self {
        if dtype.is_float() {
            FillValuePolicy::NaN
        } else {
            FillValuePolicy::Zero
        }
    }
}

/// Storage encoding of one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableEncoding {
    pub dtype: Dtype,
    pub chunks: Vec<usize>,
    pub codec: Codec,
    /// Byte shuffle before compression.
    pub shuffle: bool,
    pub fill_value: FillValuePolicy,
}

impl VariableEncoding {
    fn new(dtype: Dtype, chunks: Vec<usize>, level: i32) -> Self {
        Self {
            dtype,
            chunks,
            codec: Codec::Blosc { level },
            shuffle: true,
            fill_value: FillValuePolicy::for_dtype(dtype),
        }
    }
}

/// Encoding of every variable the standards know for a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingProfile {
    pub sensor: SensorName,
    pub time_chunk: usize,
    pub compression_level: i32,
    pub variables: BTreeMap<String, VariableEncoding>,
}

impl EncodingProfile {
    pub fn get(&self, name: &str) -> Option<&VariableEncoding> {
        self.variables.get(name)
    }

    /// Planned encoding of `name`, or one derived from the variable itself
    /// for auxiliary series: its own dtype, `time_chunk` along time and
    /// whole-axis chunks elsewhere.
    pub fn for_variable(&self, name: &str, variable: &Variable) -> VariableEncoding {
        if let Some(encoding) = self.get(name) {
            return encoding.clone();
        }

        let chunks = variable
            .dims
            .iter()
            .zip(variable.array.shape())
            .map(|(dim, len)| match dim {
                Dimension::Time => self.time_chunk,
                _ => (*len).max(1),
            })
            .collect();
        VariableEncoding::new(variable.array.dtype(), chunks, self.compression_level)
    }
}

/// Derives storage encodings from sensor profiles.
#[derive(Debug, Clone)]
pub struct EncodingPlanner {
    compression_level: i32,
}

impl Default for EncodingPlanner {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl EncodingPlanner {
    pub fn new(compression_level: i32) -> Result<Self> {
        if !(MIN_COMPRESSION_LEVEL..=MAX_COMPRESSION_LEVEL).contains(&compression_level) {
            return Err(ConversionError::Settings(format!(
                "compression level {} outside {}..={}",
                compression_level, MIN_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL
            )));
        }
        Ok(Self { compression_level })
    }

    pub fn compression_level(&self) -> i32 {
        self.compression_level
    }

    pub fn plan_encoding(&self, profile: &SensorProfile) -> EncodingProfile {
        let level = self.compression_level;
        let mut variables = BTreeMap::new();

        for spec in &profile.raw_fields {
            variables.insert(
                spec.field.name().to_string(),
                VariableEncoding::new(spec.dtype, spec.chunks.clone(), level),
            );
        }

        variables.insert(
            Dimension::Time.name().to_string(),
            VariableEncoding::new(Dtype::Int64, vec![profile.time_chunk], level),
        );
        for (prefix, n_bins) in [
            ("diameter", profile.diameter_bins.len()),
            ("velocity", profile.velocity_bins.len()),
        ] {
            for suffix in ["center", "lower", "upper", "width"] {
                variables.insert(
                    format!("{}_bin_{}", prefix, suffix),
                    VariableEncoding::new(Dtype::Float64, vec![n_bins.max(1)], level),
                );
            }
        }

        EncodingProfile {
            sensor: profile.sensor,
            time_chunk: profile.time_chunk,
            compression_level: level,
            variables,
        }
    }

    /// Resolve the sensor through the registry, then plan.
    pub fn plan_for_sensor(&self, sensor_id: &str) -> Result<EncodingProfile> {
        let profile = SensorSchemaRegistry::lookup(sensor_id)?;
        Ok(self.plan_encoding(&profile))
    }
}
