pub mod cli;
pub mod error;
pub mod models;
pub mod processors;
pub mod readers;
pub mod standards;
pub mod utils;
pub mod writers;

pub use error::{ConversionError, Result};
