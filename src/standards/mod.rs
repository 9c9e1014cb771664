pub mod parsivel;
pub mod registry;

pub use parsivel::ott_parsivel_profile;
pub use registry::SensorSchemaRegistry;
