//! Structured logging setup
//!
//! Human-readable or JSON lines on stderr, optionally mirrored to a file.
//! Stdout is left to command output (slug tables, sitemap XML).

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn open_log_file(path: &Path) -> Result<Arc<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    Ok(Arc::new(file))
}

/// Initialize the global subscriber
///
/// `RUST_LOG` takes precedence over `config.level`.
///
/// # Errors
///
/// Returns error if the level filter is invalid, the log file cannot be
/// opened, or a subscriber is already installed
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;
    let file = config.file_path.as_deref().map(open_log_file).transpose()?;
    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json_format {
        let file_layer = file.map(|f| fmt::layer().json().with_current_span(true).with_writer(f));
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .with(file_layer)
            .try_init()?;
    } else {
        let file_layer = file.map(|f| fmt::layer().with_ansi(false).with_writer(f));
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(file_layer)
            .try_init()?;
    }

    Ok(())
}
