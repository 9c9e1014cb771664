use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};
use validator::Validate;

use crate::error::{ConversionError, Result};
use crate::models::{
    ArrayData, BinTable, Dimension, FieldArray, GriddedDataset, RawField, SensorName,
    SensorProfile, StationAttrs, Variable,
};
use crate::utils::constants::{TIME_CALENDAR, TIME_UNITS};
use crate::utils::logging::BatchContext;

/// Builds the gridded dataset of one batch from its field arrays.
pub struct DatasetAssembler;

impl DatasetAssembler {
    /// Combine raw field arrays, scalar series, schema coordinates and
    /// station attributes. Any shape disagreement fails the whole assembly.
    pub fn assemble(
        fields: BTreeMap<RawField, FieldArray>,
        scalars: BTreeMap<String, FieldArray>,
        time: Vec<i64>,
        profile: &SensorProfile,
        attrs: &StationAttrs,
        ctx: &BatchContext,
    ) -> Result<GriddedDataset> {
        ctx.in_scope(|| {
            attrs.validate()?;
            let declared: SensorName = attrs.sensor_name.parse()?;
            if declared != profile.sensor {
                return Err(ConversionError::InvalidFormat(format!(
                    "station attributes declare sensor {} but the profile is for {}",
                    declared, profile.sensor
                )));
            }

            let n_time = time.len();
            let coords = Self::coordinates(profile, time);

            let missing: Vec<String> = profile
                .raw_fields
                .iter()
                .filter(|spec| !fields.contains_key(&spec.field))
                .map(|spec| spec.field.name().to_string())
                .collect();
            if !missing.is_empty() {
                return Err(ConversionError::MissingRawField {
                    sensor: profile.sensor.to_string(),
                    fields: missing,
                });
            }

            let mut data_vars = BTreeMap::new();
            for (field, array) in fields {
                if profile.raw_field(field).is_none() {
                    return Err(ConversionError::InvalidFormat(format!(
                        "{} is not a raw field of {}",
                        field, profile.sensor
                    )));
                }

                let dims = field.dimensions().to_vec();
                check_shape(field.name(), &dims, array.shape(), n_time, profile)?;

                let variable = Variable::new(dims, array).with_attr("long_name", long_name(field));
                data_vars.insert(field.name().to_string(), variable);
            }

            for (name, array) in scalars {
                if data_vars.contains_key(&name) || coords.contains_key(&name) {
                    return Err(ConversionError::InvalidFormat(format!(
                        "scalar column '{}' collides with an L1 variable",
                        name
                    )));
                }
                let dims = vec![Dimension::Time];
                check_shape(&name, &dims, array.shape(), n_time, profile)?;
                data_vars.insert(name, Variable::new(dims, array));
            }

            let global_attrs: BTreeMap<String, Value> = attrs
                .to_global_attributes()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();

            debug!(
                variables = data_vars.len(),
                coordinates = coords.len(),
                "assembled dataset"
            );
            info!(n_time, "L1 dataset created");

            Ok(GriddedDataset::from_parts(
                profile.sensor,
                coords,
                data_vars,
                global_attrs,
            ))
        })
    }

    /// Coordinate variables of the sensor, with `time` from the batch.
    pub fn coordinates(profile: &SensorProfile, time: Vec<i64>) -> BTreeMap<String, Variable> {
        let mut coords = BTreeMap::new();

        let n_time = time.len();
        coords.insert(
            Dimension::Time.name().to_string(),
            Variable::new(
                vec![Dimension::Time],
                FieldArray::from_data(ArrayData::Int64(ndarray::Array1::from(time).into_dyn())),
            )
            .with_attr("units", TIME_UNITS)
            .with_attr("calendar", TIME_CALENDAR),
        );
        debug!(n_time, "time coordinate built");

        insert_bin_coordinates(
            &mut coords,
            "diameter",
            Dimension::DiameterBinCenter,
            &profile.diameter_bins,
            "mm",
        );
        insert_bin_coordinates(
            &mut coords,
            "velocity",
            Dimension::VelocityBinCenter,
            &profile.velocity_bins,
            "m s-1",
        );

        coords
    }
}

fn insert_bin_coordinates(
    coords: &mut BTreeMap<String, Variable>,
    prefix: &str,
    dim: Dimension,
    table: &BinTable,
    units: &str,
) {
    let columns = [
        ("center", &table.center),
        ("lower", &table.lower),
        ("upper", &table.upper),
        ("width", &table.width),
    ];

    for (suffix, values) in columns {
        let name = format!("{}_bin_{}", prefix, suffix);
        let array = FieldArray::from_data(ArrayData::Float64(
            ndarray::Array1::from(values.clone()).into_dyn(),
        ));
        coords.insert(
            name,
            Variable::new(vec![dim], array).with_attr("units", units),
        );
    }
}

fn check_shape(
    variable: &str,
    dims: &[Dimension],
    shape: &[usize],
    n_time: usize,
    profile: &SensorProfile,
) -> Result<()> {
    if shape.len() != dims.len() {
        return Err(ConversionError::CoordinateMismatch {
            variable: variable.to_string(),
            dimension: format!("rank of ({})", dim_list(dims)),
            expected: dims.len(),
            found: shape.len(),
        });
    }

    for (dim, found) in dims.iter().zip(shape) {
        let expected = match dim {
            Dimension::Time => n_time,
            other => profile.dimension_len(*other).unwrap_or(0),
        };
        if *found != expected {
            return Err(ConversionError::CoordinateMismatch {
                variable: variable.to_string(),
                dimension: dim.name().to_string(),
                expected,
                found: *found,
            });
        }
    }

    Ok(())
}

fn dim_list(dims: &[Dimension]) -> String {
    dims.iter().map(|d| d.name()).collect::<Vec<_>>().join(", ")
}

fn long_name(field: RawField) -> &'static str {
    match field {
        RawField::FieldN => "Raw drop concentration per diameter class",
        RawField::FieldV => "Raw drop average velocity per diameter class",
        RawField::RawData => "Raw drop number per diameter and velocity class",
    }
}
