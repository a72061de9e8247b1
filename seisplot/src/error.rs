//! Error types for a seisplot run.

use seisplot_common::CacheError;
use seisplot_fdsn::FetchError;
use seisplot_render::RenderError;
use thiserror::Error;

/// Result type alias using [`RunError`].
pub type Result<T> = std::result::Result<T, RunError>;

/// Errors that end a run.
#[derive(Error, Debug)]
pub enum RunError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] seisplot_common::Error),

    /// A cache operation other than the fetch itself failed.
    #[error("Station '{label}': {source}")]
    Cache {
        label: String,
        #[source]
        source: CacheError<FetchError>,
    },

    /// A figure could not be produced.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Every station failed.
    #[error("No station produced waveform data")]
    NoData,
}
