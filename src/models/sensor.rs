use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConversionError, Result};

/// Disdrometer types known to the standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorName {
    #[serde(rename = "OTT_Parsivel")]
    OttParsivel,
    #[serde(rename = "OTT_Parsivel2")]
    OttParsivel2,
    #[serde(rename = "Thies_LPM")]
    ThiesLpm,
}

impl SensorName {
    pub const ALL: [SensorName; 3] = [
        SensorName::OttParsivel,
        SensorName::OttParsivel2,
        SensorName::ThiesLpm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorName::OttParsivel => "OTT_Parsivel",
            SensorName::OttParsivel2 => "OTT_Parsivel2",
            SensorName::ThiesLpm => "Thies_LPM",
        }
    }
}

impl FromStr for SensorName {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ott_parsivel" | "parsivel" => Ok(SensorName::OttParsivel),
            "ott_parsivel2" | "parsivel2" => Ok(SensorName::OttParsivel2),
            "thies_lpm" | "thieslpm" => Ok(SensorName::ThiesLpm),
            _ => Err(ConversionError::UnknownSensor {
                sensor_name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SensorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named dimensions of an L1 dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "time")]
    Time,
    #[serde(rename = "diameter_bin_center")]
    DiameterBinCenter,
    #[serde(rename = "velocity_bin_center")]
    VelocityBinCenter,
}

impl Dimension {
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Time => "time",
            Dimension::DiameterBinCenter => "diameter_bin_center",
            Dimension::VelocityBinCenter => "velocity_bin_center",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw spectrum fields reported by the instrument as comma-separated strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RawField {
    FieldN,
    FieldV,
    RawData,
}

impl RawField {
    pub fn name(&self) -> &'static str {
        match self {
            RawField::FieldN => "FieldN",
            RawField::FieldV => "FieldV",
            RawField::RawData => "RawData",
        }
    }

    /// Dimensions of the field in the L1 dataset, `time` first.
    pub fn dimensions(&self) -> &'static [Dimension] {
        match self {
            RawField::FieldN => &[Dimension::Time, Dimension::DiameterBinCenter],
            RawField::FieldV => &[Dimension::Time, Dimension::VelocityBinCenter],
            RawField::RawData => &[
                Dimension::Time,
                Dimension::DiameterBinCenter,
                Dimension::VelocityBinCenter,
            ],
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FieldN" => Some(RawField::FieldN),
            "FieldV" => Some(RawField::FieldV),
            "RawData" => Some(RawField::RawData),
            _ => None,
        }
    }
}

impl fmt::Display for RawField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric element types used by L1 variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Float32,
    Float64,
    Int32,
    Int64,
}

impl Dtype {
    pub fn name(&self) -> &'static str {
        match self {
            Dtype::Float32 => "float32",
            Dtype::Float64 => "float64",
            Dtype::Int32 => "int32",
            Dtype::Int64 => "int64",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Dtype::Float32 | Dtype::Float64)
    }

    pub fn size_of(&self) -> usize {
        match self {
            Dtype::Float32 | Dtype::Int32 => 4,
            Dtype::Float64 | Dtype::Int64 => 8,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One discretised physical axis (diameter in mm, velocity in m/s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinTable {
    pub center: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub width: Vec<f64>,
}

impl BinTable {
    /// Build a table from published centers and class widths. Edges are
    /// accumulated from zero.
    pub fn from_centers_and_widths(center: &[f64], width: &[f64]) -> Self {
        let mut lower = Vec::with_capacity(width.len());
        let mut upper = Vec::with_capacity(width.len());
        let mut edge = 0.0;
        for w in width {
            lower.push(edge);
            edge += w;
            upper.push(edge);
        }

        Self {
            center: center.to_vec(),
            lower,
            upper,
            width: width.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.center.len()
    }

    pub fn is_empty(&self) -> bool {
        self.center.is_empty()
    }
}

/// Per raw field standards of a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFieldSpec {
    pub field: RawField,
    /// Number of tokens expected in one raw string.
    pub n_bins: usize,
    pub dtype: Dtype,
    /// Chunk shape used when persisting, `time` first.
    pub chunks: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorProfile {
    pub sensor: SensorName,
    pub raw_fields: Vec<RawFieldSpec>,
    pub diameter_bins: BinTable,
    pub velocity_bins: BinTable,
    pub time_chunk: usize,
}

impl SensorProfile {
    pub fn raw_field(&self, field: RawField) -> Option<&RawFieldSpec> {
        self.raw_fields.iter().find(|spec| spec.field == field)
    }

    pub fn raw_field_names(&self) -> Vec<&'static str> {
        self.raw_fields.iter().map(|spec| spec.field.name()).collect()
    }

    pub fn dimension_len(&self, dimension: Dimension) -> Option<usize> {
        match dimension {
            Dimension::Time => None,
            Dimension::DiameterBinCenter => Some(self.diameter_bins.len()),
            Dimension::VelocityBinCenter => Some(self.velocity_bins.len()),
        }
    }

    /// Shape of one observation of `field`, i.e. everything after `time`.
    pub fn trailing_shape(&self, field: RawField) -> Vec<usize> {
        field.dimensions()[1..]
            .iter()
            .filter_map(|dim| self.dimension_len(*dim))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_name_parsing() {
        assert_eq!(
            "OTT_Parsivel".parse::<SensorName>().unwrap(),
            SensorName::OttParsivel
        );
        assert_eq!(
            "Parsivel".parse::<SensorName>().unwrap(),
            SensorName::OttParsivel
        );
        assert_eq!(
            "ThiesLPM".parse::<SensorName>().unwrap(),
            SensorName::ThiesLpm
        );

        let err = "Joss_RD80".parse::<SensorName>().unwrap_err();
        assert!(matches!(err, ConversionError::UnknownSensor { .. }));
    }

    #[test]
    fn test_sensor_name_round_trips_through_display() {
        for sensor in SensorName::ALL {
            assert_eq!(sensor.to_string().parse::<SensorName>().unwrap(), sensor);
        }
    }

    #[test]
    fn test_bin_table_edges_accumulate() {
        let table = BinTable::from_centers_and_widths(&[0.5, 1.5, 3.0], &[1.0, 1.0, 2.0]);
        assert_eq!(table.lower, vec![0.0, 1.0, 2.0]);
        assert_eq!(table.upper, vec![1.0, 2.0, 4.0]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_raw_field_dimensions_start_with_time() {
        for field in [RawField::FieldN, RawField::FieldV, RawField::RawData] {
            assert_eq!(field.dimensions()[0], Dimension::Time);
            assert_eq!(RawField::from_name(field.name()), Some(field));
        }
    }
}
