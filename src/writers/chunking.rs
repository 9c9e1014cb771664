use std::sync::Arc;

use crate::error::{ConversionError, Result};
use crate::models::{ArrayData, Dimension, GriddedDataset};
use crate::writers::encoding_planner::{EncodingProfile, VariableEncoding};

/// A variable computed and cast to the dtype it will be written with.
#[derive(Debug, Clone)]
pub struct AlignedVariable {
    pub name: String,
    pub dims: Vec<Dimension>,
    pub data: Arc<ArrayData>,
    pub encoding: VariableEncoding,
    /// Coordinate of the dataset rather than a data variable.
    pub is_coord: bool,
    pub attrs: serde_json::Map<String, serde_json::Value>,
}

impl AlignedVariable {
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Whether this is a coordinate not named after one of its own dims,
    /// e.g. `diameter_bin_lower` along `diameter_bin_center`.
    pub fn is_auxiliary_coord(&self) -> bool {
        self.is_coord && !self.dims.iter().any(|d| d.name() == self.name)
    }
}

/// Check `chunks` against an array of `shape`: one positive length per axis.
pub fn validate_chunks(name: &str, shape: &[usize], chunks: &[usize]) -> Result<()> {
    if shape.len() != chunks.len() {
        return Err(ConversionError::Settings(format!(
            "{}: chunk shape {:?} does not match array rank {}",
            name,
            chunks,
            shape.len()
        )));
    }
    if chunks.iter().any(|c| *c == 0) {
        return Err(ConversionError::Settings(format!(
            "{}: chunk shape {:?} has a zero length dimension",
            name, chunks
        )));
    }
    Ok(())
}

/// Non-dimension coordinates sharing at least one dim with `variable`,
/// space separated. `None` for coordinates and when nothing applies.
pub fn coordinates_attr(variable: &AlignedVariable, all: &[AlignedVariable]) -> Option<String> {
    if variable.is_coord {
        return None;
    }

    let names: Vec<&str> = all
        .iter()
        .filter(|v| v.is_auxiliary_coord())
        .filter(|v| v.dims.iter().any(|d| variable.dims.contains(d)))
        .map(|v| v.name.as_str())
        .collect();

    if names.is_empty() {
        None
    } else {
        Some(names.join(" "))
    }
}

/// Materialise every variable of `dataset`, cast it to its encoded dtype and
/// check its planned chunk shape. Both writers consume the result.
pub fn realign(dataset: &GriddedDataset, encoding: &EncodingProfile) -> Result<Vec<AlignedVariable>> {
    dataset
        .variables()
        .map(|(name, variable)| {
            let var_encoding = encoding.for_variable(name, variable);
            let computed = variable.array.compute()?;
            let data = if computed.dtype() == var_encoding.dtype {
                computed
            } else {
                Arc::new(computed.cast(var_encoding.dtype))
            };
            validate_chunks(name, data.shape(), &var_encoding.chunks)?;

            Ok(AlignedVariable {
                name: name.clone(),
                dims: variable.dims.clone(),
                data,
                encoding: var_encoding,
                is_coord: dataset.coord(name).is_some(),
                attrs: variable
                    .attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            })
        })
        .collect()
}
