use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::Span;
use tracing_subscriber::EnvFilter;

use crate::error::{ConversionError, Result};
use crate::models::SensorName;

/// Diagnostic context of one batch conversion, handed to every stage.
#[derive(Debug, Clone)]
pub struct BatchContext {
    batch_id: String,
    sensor: SensorName,
    span: Span,
}

impl BatchContext {
    pub fn new(batch_id: &str, sensor: SensorName) -> Self {
        let span = tracing::info_span!("batch", id = %batch_id, sensor = %sensor);
        Self {
            batch_id: batch_id.to_string(),
            sensor,
            span,
        }
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn sensor(&self) -> SensorName {
        self.sensor
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Run `f` inside the batch span.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span.in_scope(f)
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `verbose`.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    result.map_err(|e| ConversionError::Settings(format!("cannot initialise logging: {}", e)))
}
