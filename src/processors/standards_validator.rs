use tracing::{info, warn};

use crate::error::{ConversionError, Result};
use crate::models::{Dimension, Dtype, GriddedDataset, SensorProfile};
use crate::utils::logging::BatchContext;

/// Checks an assembled dataset against the L1 standards of its sensor.
pub struct StandardsValidator;

impl StandardsValidator {
    /// Materialises every variable and reports all violations at once.
    pub fn validate(
        dataset: &GriddedDataset,
        profile: &SensorProfile,
        ctx: &BatchContext,
    ) -> Result<()> {
        ctx.in_scope(|| {
            let mut violations = Vec::new();

            if dataset.sensor() != profile.sensor {
                violations.push(format!(
                    "dataset is for {} but standards are for {}",
                    dataset.sensor(),
                    profile.sensor
                ));
            }

            let n_time = dataset.n_time();

            for spec in &profile.raw_fields {
                let name = spec.field.name();
                let Some(variable) = dataset.data_var(name) else {
                    violations.push(format!("missing variable {}", name));
                    continue;
                };

                if variable.dims != spec.field.dimensions() {
                    violations.push(format!(
                        "{} has dims ({}), expected ({})",
                        name,
                        variable.dim_names().join(", "),
                        spec.field
                            .dimensions()
                            .iter()
                            .map(|d| d.name())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ));
                }

                let data = variable.array.compute()?;
                if data.dtype() != spec.dtype {
                    violations.push(format!(
                        "{} has dtype {}, standard is {}",
                        name,
                        data.dtype(),
                        spec.dtype
                    ));
                }

                let mut expected_shape = vec![n_time];
                expected_shape.extend(profile.trailing_shape(spec.field));
                if data.shape() != expected_shape.as_slice() {
                    violations.push(format!(
                        "{} has shape {:?}, expected {:?}",
                        name,
                        data.shape(),
                        expected_shape
                    ));
                }
            }

            for (name, variable) in dataset.data_vars() {
                if profile.raw_fields.iter().any(|s| s.field.name() == name) {
                    continue;
                }
                let data = variable.array.compute()?;
                if variable.dims != [Dimension::Time] || data.dtype() != Dtype::Float64 {
                    violations.push(format!(
                        "auxiliary variable {} must be float64 over (time), found {} over ({})",
                        name,
                        data.dtype(),
                        variable.dim_names().join(", ")
                    ));
                }
            }

            for (dim, expected) in [
                (Dimension::DiameterBinCenter, profile.diameter_bins.len()),
                (Dimension::VelocityBinCenter, profile.velocity_bins.len()),
            ] {
                match dataset.dims().get(&dim) {
                    Some(found) if *found == expected => {}
                    Some(found) => violations.push(format!(
                        "coordinate {} has length {}, expected {}",
                        dim, found, expected
                    )),
                    None => violations.push(format!("missing coordinate {}", dim)),
                }
            }

            if violations.is_empty() {
                info!("L1 standards check passed");
                Ok(())
            } else {
                for violation in &violations {
                    warn!(violation = %violation, "L1 standards violation");
                }
                Err(ConversionError::StandardsViolation {
                    sensor: profile.sensor.to_string(),
                    violations,
                })
            }
        })
    }
}
