//! Error types for waveform retrieval.

use thiserror::Error;

/// Result type alias using [`FetchError`].
pub type Result<T> = std::result::Result<T, FetchError>;

/// Errors that can occur while fetching waveforms.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an unexpected status.
    #[error("Service returned {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// The service has no data for the request.
    #[error("No data available for {0}")]
    NoData(String),

    /// The response body is not valid miniSEED.
    #[error("Invalid miniSEED: {0}")]
    Mseed(#[from] MseedError),
}

/// Errors raised while decoding miniSEED records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MseedError {
    /// Fewer bytes remain than the structure being read requires.
    #[error("record truncated at offset {offset}: need {needed} bytes")]
    Truncated { offset: usize, needed: usize },

    /// A header or blockette field holds an impossible value.
    #[error("invalid header at offset {offset}: {reason}")]
    InvalidHeader { offset: usize, reason: String },

    /// The data encoding is not one this decoder handles.
    #[error("unsupported data encoding {0}")]
    UnsupportedEncoding(u8),

    /// A Steim frame is malformed or holds too few samples.
    #[error("Steim decoding failed: {0}")]
    SteimFrame(String),
}

impl MseedError {
    pub(crate) fn header(offset: usize, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            offset,
            reason: reason.into(),
        }
    }
}
