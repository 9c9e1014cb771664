pub mod array;
pub mod dataset;
pub mod observation;
pub mod sensor;
pub mod station;

pub use array::{ArrayData, Element, ExecutionMode, FieldArray};
pub use dataset::{GriddedDataset, Variable};
pub use observation::{RawObservationBatch, RawObservationBatchBuilder};
pub use sensor::{BinTable, Dimension, Dtype, RawField, RawFieldSpec, SensorName, SensorProfile};
pub use station::StationAttrs;
