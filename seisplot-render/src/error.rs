//! Error types for rendering.

use thiserror::Error;

/// Result type alias using [`RenderError`].
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors that can occur while drawing or writing a figure.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A drawing backend failed, including PNG encoding.
    #[error("Drawing error: {0}")]
    Draw(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The land GeoJSON could not be read.
    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    /// A station referenced by the figure is not in the table.
    #[error("Unknown station '{0}'")]
    UnknownStation(String),

    /// Invalid figure settings.
    #[error("Invalid figure configuration: {0}")]
    Config(#[from] seisplot_common::Error),

    /// There is nothing to draw.
    #[error("Nothing to plot: {0}")]
    NoData(String),
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        Self::GeoJson(err.to_string())
    }
}
