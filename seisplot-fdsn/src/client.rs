//! FDSN dataselect HTTP client.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use seisplot_common::Stream;

use crate::assemble::assemble;
use crate::error::{FetchError, Result};
use crate::mseed::parse_records;
use crate::request::WaveformRequest;

/// Path of the dataselect query endpoint below the service base URL.
const DATASELECT_PATH: &str = "/fdsnws/dataselect/1/query";

/// Connection settings for the FDSN data service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FdsnConfig {
    /// Service base URL (default: "https://service.iris.edu").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds (default: 120).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://service.iris.edu".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_user_agent() -> String {
    format!("seisplot/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for FdsnConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl FdsnConfig {
    pub fn validate(&self) -> seisplot_common::Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(seisplot_common::Error::validation(format!(
                "fdsn.base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(seisplot_common::Error::validation(
                "fdsn.timeout_secs must be > 0",
            ));
        }
        Ok(())
    }
}

/// Anything that can produce waveforms for a request.
pub trait WaveformSource {
    /// Retrieve the stream for `request`.
    fn fetch(&self, request: &WaveformRequest) -> impl Future<Output = Result<Stream>> + Send;
}

/// Client for an FDSN dataselect service.
#[derive(Debug, Clone)]
pub struct FdsnClient {
    http: reqwest::Client,
    query_url: String,
}

impl FdsnClient {
    /// Create a client from configuration.
    pub fn new(config: &FdsnConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            query_url: format!("{}{}", config.base_url.trim_end_matches('/'), DATASELECT_PATH),
        })
    }

    /// Full URL of the dataselect query endpoint.
    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    /// Download and decode the waveforms for `request`.
    pub async fn get_waveforms(&self, request: &WaveformRequest) -> Result<Stream> {
        tracing::debug!(url = %self.query_url, %request, "Requesting waveforms");

        let response = self
            .http
            .get(&self.query_url)
            .query(&request.query_pairs())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            return Err(FetchError::NoData(request.to_string()));
        }
        if !status.is_success() {
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
                body: body.chars().take(512).collect(),
            });
        }

        let body = response.bytes().await?;
        let records = parse_records(&body)?;
        let stream = assemble(records);
        if stream.is_empty() {
            return Err(FetchError::NoData(request.to_string()));
        }

        tracing::info!(
            %request,
            bytes = body.len(),
            traces = stream.len(),
            samples = stream.sample_count(),
            "Waveforms downloaded"
        );
        Ok(stream)
    }
}

impl WaveformSource for FdsnClient {
    async fn fetch(&self, request: &WaveformRequest) -> Result<Stream> {
        self.get_waveforms(request).await
    }
}
