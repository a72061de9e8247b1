//! seisplot common library
//!
//! Shared types and utilities for the seisplot crates:
//!
//! - [`station`] - Station descriptors and the immutable station table
//! - [`waveform`] - Trace, stream and dataset model
//! - [`cache`] - Per-duration fetch-or-load waveform cache
//! - [`processing`] - Demean and high-pass filtering
//! - [`serialization`] - JSON/CBOR encoding and decoding
//! - [`config`] - Configuration loading (JSON5 format)
//! - [`color`] - Display colors
//! - [`error`] - Error types

pub mod cache;
pub mod color;
pub mod config;
pub mod error;
pub mod processing;
pub mod serialization;
pub mod station;
pub mod waveform;

// Re-export commonly used types at the crate root
pub use cache::{CacheError, CacheLoad, WaveformCache};
pub use color::Color;
pub use config::{
    CacheConfig, ConfigFile, EventConfig, LogFormat, LoggingConfig, load_config, parse_config,
};
pub use error::{Error, Result};
pub use processing::ProcessingConfig;
pub use serialization::{Format, decode, encode};
pub use station::{StationDescriptor, StationTable};
pub use waveform::{Dataset, Stream, Trace};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Example
///
/// ```ignore
/// use seisplot_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
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
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
