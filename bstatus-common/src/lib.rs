//! bstatus Common Library
//!
//! This crate provides shared types and utilities for the bstatus workspace:
//!
//! - [`text`] - Rich-text model (`Run`, `RichText`) and the markup parser
//! - [`color`] - Color specs (`{f00}` / `{ff0000}`) and their terminal/i3bar forms
//! - [`config`] - Logging configuration shared by every binary
//! - [`error`] - Error types

pub mod color;
pub mod config;
pub mod error;
pub mod text;

// Re-export commonly used types at the crate root
pub use color::{Color, ERROR_COLOR};
pub use config::{LogFormat, LoggingConfig};
pub use error::{Error, MarkupError, Result};
pub use text::{RichText, Run, WIDTH_PAD, markup_width};

/// Initialize tracing with the given configuration.
///
/// Logs always go to standard error: standard output carries the status line.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// # Example
///
/// ```ignore
/// use bstatus_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "debug".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
