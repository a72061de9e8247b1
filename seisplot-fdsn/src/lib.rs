//! seisplot FDSN client
//!
//! Retrieval of seismic waveforms from FDSN web services.
//!
//! # Overview
//!
//! This crate provides:
//! - [`WaveformRequest`] describing one channel and time window
//! - [`WaveformSource`] trait for anything that can satisfy a request
//! - [`FdsnClient`], the dataselect implementation over HTTP
//! - [`mseed`] and [`steim`] decoders for the miniSEED responses
//! - [`assemble`] to stitch records into continuous traces
//!
//! # Example
//!
//! ```ignore
//! use seisplot_fdsn::{FdsnClient, FdsnConfig, WaveformRequest, WaveformSource};
//!
//! let client = FdsnClient::new(&FdsnConfig::default())?;
//! let request = WaveformRequest::for_station(&station, 1700);
//! let stream = client.fetch(&request).await?;
//! ```

pub mod assemble;
pub mod client;
pub mod error;
pub mod mseed;
pub mod request;
pub mod steim;

pub use assemble::assemble;
pub use client::{FdsnClient, FdsnConfig, WaveformSource};
pub use error::{FetchError, MseedError, Result};
pub use request::WaveformRequest;
