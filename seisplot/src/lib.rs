//! seisplot
//!
//! Fetches the waveforms of an earthquake as recorded by a handful of
//! stations, caches them per time window and renders two figures: a
//! timeline of all waveforms and a map of the stations.
//!
//! - [`args`] - Command line
//! - [`config`] - JSON5 configuration
//! - [`runner`] - Command execution
//! - [`error`] - Error types

pub mod args;
pub mod config;
pub mod error;
pub mod runner;

pub use args::{Args, Command};
pub use config::SeisplotConfig;
pub use error::{Result, RunError};
pub use runner::Runner;
