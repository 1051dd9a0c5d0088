//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` registry with one fmt layer per enabled
//! output (console, file) driven by [`LoggingConfig`]. `RUST_LOG` takes
//! precedence over the configured level when set.

use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::{ProtocolError, Result};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the filter: `RUST_LOG` if present, otherwise the configured level
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_lowercase()))
}

fn open_log_file(config: &LoggingConfig) -> Result<File> {
    let path = config.log_file_path.as_ref().ok_or_else(|| {
        ProtocolError::ConfigError(
            "log_file_path must be specified when log_to_file is true".to_string(),
        )
    })?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ProtocolError::ConfigError(format!("Failed to open log file: {e}")))
}

/// One fmt layer per enabled output
fn build_layers(config: &LoggingConfig) -> Result<Vec<BoxedLayer>> {
    if !config.log_to_console && !config.log_to_file {
        return Err(ProtocolError::ConfigError(
            "At least one logging output (console or file) must be enabled".to_string(),
        ));
    }

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.log_to_console {
        let layer = fmt::layer().with_target(true);
        layers.push(if config.json_format {
            layer.json().boxed()
        } else {
            layer.boxed()
        });
    }

    if config.log_to_file {
        let file = open_log_file(config)?;
        let layer = fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file));
        layers.push(if config.json_format {
            layer.json().boxed()
        } else {
            layer.boxed()
        });
    }

    Ok(layers)
}

/// Initialise the global subscriber.
///
/// Fails with `ConfigError` when no output is enabled or the log file cannot
/// be opened. Calling this more than once is harmless: later calls keep the
/// subscriber that is already installed and return `Ok(())`.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let layers = build_layers(config)?;

    let installed = tracing_subscriber::registry()
        .with(layers)
        .with(build_filter(config))
        .try_init();

    if installed.is_err() {
        tracing::debug!(app = %config.app_name, "Subscriber already installed");
    } else {
        tracing::info!(
            app = %config.app_name,
            console = config.log_to_console,
            file = config.log_to_file,
            "Logging initialized"
        );
    }

    Ok(())
}
