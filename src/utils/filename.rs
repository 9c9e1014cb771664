use std::path::{Path, PathBuf};

use crate::models::StationAttrs;
use crate::writers::OutputFormat;

/// Default L1 product name: `L1_{campaign}_{station}.{zarr|parquet}`.
///
/// Missing campaign or station parts fall back to the sensor name.
pub fn default_l1_filename(attrs: &StationAttrs, format: OutputFormat) -> PathBuf {
    let mut parts = vec!["L1".to_string()];
    match (&attrs.campaign_name, &attrs.station_id) {
        (None, None) => parts.push(attrs.sensor_name.clone()),
        (campaign, station) => {
            parts.extend(campaign.iter().cloned());
            parts.extend(station.iter().cloned());
        }
    }

    let stem: String = parts
        .join("_")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();

    PathBuf::from(format!("{}.{}", stem, format.extension()))
}

/// Output path for an L0 file converted inside `output_dir`: the L0 stem with
/// the L1 extension.
pub fn l1_path_for_l0(l0_path: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    let stem = l0_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "L0".to_string());
    output_dir.join(format!("{}.{}", stem, format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_l1_filename() {
        let attrs = StationAttrs::new("OTT_Parsivel", 46.8, 6.9, 491.0)
            .with_station("PAYERNE 2014", "10");

        assert_eq!(
            default_l1_filename(&attrs, OutputFormat::Zarr),
            PathBuf::from("L1_PAYERNE_2014_10.zarr")
        );
        assert_eq!(
            default_l1_filename(&attrs, OutputFormat::Parquet),
            PathBuf::from("L1_PAYERNE_2014_10.parquet")
        );
    }

    #[test]
    fn test_default_l1_filename_without_station() {
        let attrs = StationAttrs::new("OTT_Parsivel", 46.8, 6.9, 491.0);
        assert_eq!(
            default_l1_filename(&attrs, OutputFormat::Zarr),
            PathBuf::from("L1_OTT_Parsivel.zarr")
        );
    }

    #[test]
    fn test_l1_path_for_l0() {
        let path = l1_path_for_l0(
            Path::new("/data/L0/station_10.parquet"),
            Path::new("/data/L1"),
            OutputFormat::Zarr,
        );
        assert_eq!(path, PathBuf::from("/data/L1/station_10.zarr"));
    }
}
