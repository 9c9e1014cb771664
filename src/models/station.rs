use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::Result;

/// Station description attached to every L1 product as global attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationAttrs {
    #[validate(length(min = 1))]
    pub sensor_name: String,

    #[serde(default)]
    pub campaign_name: Option<String>,

    #[serde(default)]
    pub station_id: Option<String>,

    #[serde(default)]
    pub station_name: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub altitude: f64,

    #[serde(default = "default_crs")]
    #[validate(length(min = 1))]
    pub crs: String,
}

fn default_crs() -> String {
    "WGS84".to_string()
}

impl StationAttrs {
    pub fn new(sensor_name: &str, latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            sensor_name: sensor_name.to_string(),
            campaign_name: None,
            station_id: None,
            station_name: None,
            latitude,
            longitude,
            altitude,
            crs: default_crs(),
        }
    }

    pub fn with_station(mut self, campaign_name: &str, station_id: &str) -> Self {
        self.campaign_name = Some(campaign_name.to_string());
        self.station_id = Some(station_id.to_string());
        self
    }

    /// Load attributes from a YAML, JSON or TOML descriptor and validate them.
    pub fn from_file(path: &Path) -> Result<Self> {
        let attrs: StationAttrs = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;

        attrs.validate()?;
        Ok(attrs)
    }

    /// Global attributes as key/value pairs, in a stable order.
    pub fn to_global_attributes(&self) -> Vec<(&'static str, serde_json::Value)> {
        let mut attrs = vec![
            ("sensor_name", serde_json::Value::from(self.sensor_name.clone())),
            ("latitude", serde_json::Value::from(self.latitude)),
            ("longitude", serde_json::Value::from(self.longitude)),
            ("altitude", serde_json::Value::from(self.altitude)),
            ("crs", serde_json::Value::from(self.crs.clone())),
        ];
        if let Some(ref campaign) = self.campaign_name {
            attrs.push(("campaign_name", serde_json::Value::from(campaign.clone())));
        }
        if let Some(ref station_id) = self.station_id {
            attrs.push(("station_id", serde_json::Value::from(station_id.clone())));
        }
        if let Some(ref station_name) = self.station_name {
            attrs.push(("station_name", serde_json::Value::from(station_name.clone())));
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_station_validation() {
        let attrs = StationAttrs::new("OTT_Parsivel", 46.52, 6.57, 402.0);
        assert!(attrs.validate().is_ok());
        assert_eq!(attrs.crs, "WGS84");
    }

    #[test]
    fn test_invalid_coordinates() {
        let attrs = StationAttrs::new("OTT_Parsivel", 91.0, 6.57, 402.0);
        assert!(attrs.validate().is_err());

        let attrs = StationAttrs::new("OTT_Parsivel", 46.52, -181.0, 402.0);
        assert!(attrs.validate().is_err());
    }

    #[test]
    fn test_load_from_yaml_descriptor() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile()?;
        writeln!(
            file,
            "sensor_name: OTT_Parsivel\n\
             campaign_name: PAYERNE_2014\n\
             station_id: \"10\"\n\
             latitude: 46.81\n\
             longitude: 6.94\n\
             altitude: 491.0"
        )?;

        let attrs = StationAttrs::from_file(file.path())?;
        assert_eq!(attrs.sensor_name, "OTT_Parsivel");
        assert_eq!(attrs.campaign_name.as_deref(), Some("PAYERNE_2014"));
        assert_eq!(attrs.station_id.as_deref(), Some("10"));
        assert_eq!(attrs.crs, "WGS84");
        Ok(())
    }

    #[test]
    fn test_load_rejects_out_of_range_latitude() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
        writeln!(
            file,
            r#"{{"sensor_name": "OTT_Parsivel", "latitude": 123.0, "longitude": 6.9, "altitude": 10.0}}"#
        )?;

        assert!(StationAttrs::from_file(file.path()).is_err());
        Ok(())
    }
}
