pub mod constants;
pub mod filename;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use filename::{default_l1_filename, l1_path_for_l0};
pub use logging::{init_logging, BatchContext};
pub use progress::ProgressReporter;
