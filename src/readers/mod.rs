pub mod l0_reader;

pub use l0_reader::{parse_time, L0Reader};
