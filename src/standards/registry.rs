use crate::error::{ConversionError, Result};
use crate::models::{SensorName, SensorProfile};
use crate::standards::parsivel::ott_parsivel_profile;

impl SensorName {
    /// Standards of this sensor. Sensors that are recognised but not yet
    /// described fail with `UnsupportedSensor`.
    pub fn profile(&self) -> Result<SensorProfile> {
        match self {
            SensorName::OttParsivel => Ok(ott_parsivel_profile()),
            SensorName::OttParsivel2 | SensorName::ThiesLpm => {
                Err(ConversionError::UnsupportedSensor {
                    sensor: self.to_string(),
                })
            }
        }
    }
}

/// Lookup from sensor identifier to its profile.
pub struct SensorSchemaRegistry;

impl SensorSchemaRegistry {
    pub fn lookup(sensor_id: &str) -> Result<SensorProfile> {
        let sensor: SensorName = sensor_id.parse()?;
        sensor.profile()
    }

    /// Profiles of every sensor that currently has standards.
    pub fn available_profiles() -> Vec<SensorProfile> {
        SensorName::ALL
            .iter()
            .filter_map(|sensor| sensor.profile().ok())
            .collect()
    }
}
