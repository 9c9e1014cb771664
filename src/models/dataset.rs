use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::array::FieldArray;
use crate::models::sensor::{Dimension, SensorName};

/// One named array of a dataset together with its dimension names.
#[derive(Debug, Clone)]
pub struct Variable {
    pub dims: Vec<Dimension>,
    pub array: FieldArray,
    pub attrs: BTreeMap<String, Value>,
}

impl Variable {
    pub fn new(dims: Vec<Dimension>, array: FieldArray) -> Self {
        Self {
            dims,
            array,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn dim_names(&self) -> Vec<&'static str> {
        self.dims.iter().map(|d| d.name()).collect()
    }
}

/// Gridded L1 product of one observation batch.
///
/// Instances are only produced whole by the dataset assembler.
#[derive(Debug, Clone)]
pub struct GriddedDataset {
    sensor: SensorName,
    coords: BTreeMap<String, Variable>,
    data_vars: BTreeMap<String, Variable>,
    attrs: BTreeMap<String, Value>,
}

impl GriddedDataset {
    pub(crate) fn from_parts(
        sensor: SensorName,
        coords: BTreeMap<String, Variable>,
        data_vars: BTreeMap<String, Variable>,
        attrs: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            sensor,
            coords,
            data_vars,
            attrs,
        }
    }

    pub fn sensor(&self) -> SensorName {
        self.sensor
    }

    pub fn coords(&self) -> &BTreeMap<String, Variable> {
        &self.coords
    }

    pub fn data_vars(&self) -> &BTreeMap<String, Variable> {
        &self.data_vars
    }

    pub fn attrs(&self) -> &BTreeMap<String, Value> {
        &self.attrs
    }

    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name)
    }

    pub fn data_var(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name)
    }

    /// Coordinates first, then data variables.
    pub fn variables(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.coords.iter().chain(self.data_vars.iter())
    }

    /// Length of every dimension, read from its dimension coordinate.
    pub fn dims(&self) -> BTreeMap<Dimension, usize> {
        [
            Dimension::Time,
            Dimension::DiameterBinCenter,
            Dimension::VelocityBinCenter,
        ]
        .into_iter()
        .filter_map(|dim| {
            self.coords
                .get(dim.name())
                .map(|coord| (dim, coord.array.shape().first().copied().unwrap_or(0)))
        })
        .collect()
    }

    pub fn n_time(&self) -> usize {
        self.dims().get(&Dimension::Time).copied().unwrap_or(0)
    }
}
