//! Fetch-or-load memoization of waveform streams.
//!
//! One cache file exists per total duration (`waveforms_<seconds>.<ext>`) and maps
//! station labels to the streams fetched for them. Files only ever gain labels:
//! nothing here prunes or invalidates entries.
//!
//! Loading never fails. A missing file is [`CacheLoad::Absent`] and an unreadable
//! or undecodable one is [`CacheLoad::Corrupt`]; both behave as an empty dataset.
//! A corrupt file is moved aside to `<name>.corrupt` before it would be
//! overwritten, unless an earlier backup already exists.

use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::serialization::{Format, decode, encode};
use crate::waveform::{Dataset, Stream};

/// Outcome of reading a cache file.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLoad {
    /// The file was read and decoded.
    Valid(Dataset),
    /// No file exists (or it is empty).
    Absent,
    /// The file exists but could not be read or decoded.
    Corrupt { reason: String },
}

impl CacheLoad {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, CacheLoad::Corrupt { .. })
    }

    /// Labels present in the loaded dataset (none unless valid).
    pub fn labels(&self) -> Vec<&str> {
        match self {
            CacheLoad::Valid(dataset) => dataset.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// The loaded dataset, empty for absent or corrupt files.
    pub fn into_dataset(self) -> Dataset {
        match self {
            CacheLoad::Valid(dataset) => dataset,
            CacheLoad::Absent | CacheLoad::Corrupt { .. } => Dataset::new(),
        }
    }
}

/// Errors returned by [`WaveformCache::get_or_fetch`].
#[derive(Debug, Error)]
pub enum CacheError<E: std::error::Error + 'static> {
    /// The fallback could not obtain the data; nothing was written.
    #[error("fetch failed: {0}")]
    Fetch(#[source] E),

    /// The data was fetched but the cache file could not be written.
    #[error("failed to persist cache file '{path}': {source}")]
    Persist {
        path: String,
        #[source]
        source: Error,
    },
}

/// Directory of per-duration waveform cache files.
#[derive(Debug, Clone)]
pub struct WaveformCache {
    dir: PathBuf,
    format: Format,
}

impl WaveformCache {
    /// Create a cache rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    /// Create a cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.dir.clone(), config.format)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Path of the cache file for a total duration.
    pub fn path_for(&self, duration_secs: u64) -> PathBuf {
        self.dir.join(format!(
            "waveforms_{}.{}",
            duration_secs,
            self.format.extension()
        ))
    }

    /// Read and decode the cache file for a total duration.
    pub async fn load(&self, duration_secs: u64) -> CacheLoad {
        let path = self.path_for(duration_secs);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheLoad::Absent,
            Err(e) => {
                return CacheLoad::Corrupt {
                    reason: format!("read failed: {}", e),
                };
            }
        };

        if bytes.is_empty() {
            return CacheLoad::Absent;
        }

        match decode::<Dataset>(&bytes, self.format) {
            Ok(dataset) => CacheLoad::Valid(dataset),
            Err(e) => CacheLoad::Corrupt {
                reason: e.to_string(),
            },
        }
    }

    /// Replace the cache file for a total duration with `dataset`.
    ///
    /// The data is written to a sibling temporary file and renamed into place.
    pub async fn store(&self, duration_secs: u64, dataset: &Dataset) -> Result<()> {
        let path = self.path_for(duration_secs);
        let bytes = encode(dataset, self.format)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = sibling(&path, "tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(
            path = %path.display(),
            labels = dataset.len(),
            bytes = bytes.len(),
            "Cache file written"
        );
        Ok(())
    }

    /// Return the stream cached under `label`, fetching and persisting it first
    /// when absent.
    ///
    /// `fetch` runs at most once and only when the label is missing. Its error is
    /// returned as [`CacheError::Fetch`] and leaves the file untouched.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        duration_secs: u64,
        label: &str,
        fetch: F,
    ) -> std::result::Result<Stream, CacheError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Stream, E>>,
        E: std::error::Error + 'static,
    {
        let path = self.path_for(duration_secs);
        let loaded = self.load(duration_secs).await;
        let corrupt = loaded.is_corrupt();

        match &loaded {
            CacheLoad::Valid(dataset) => {
                tracing::debug!(path = %path.display(), labels = dataset.len(), "Cache loaded");
            }
            CacheLoad::Absent => {
                tracing::info!(path = %path.display(), "No cache file, starting empty");
            }
            CacheLoad::Corrupt { reason } => {
                tracing::warn!(
                    path = %path.display(),
                    %reason,
                    "Cache file unusable, starting empty"
                );
            }
        }

        let mut dataset = loaded.into_dataset();
        if let Some(stream) = dataset.remove(label) {
            tracing::debug!(label, "Cache hit");
            return Ok(stream);
        }

        tracing::info!(label, duration_secs, "Fetching waveforms");
        let stream = fetch().await.map_err(CacheError::Fetch)?;

        if corrupt {
            preserve_corrupt(&path).await;
        }

        dataset.insert(label.to_string(), stream.clone());
        self.store(duration_secs, &dataset)
            .await
            .map_err(|source| CacheError::Persist {
                path: path.display().to_string(),
                source,
            })?;

        Ok(stream)
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Move a corrupt cache file aside, keeping the first backup.
async fn preserve_corrupt(path: &Path) {
    let backup = sibling(path, "corrupt");
    if tokio::fs::try_exists(&backup).await.unwrap_or(false) {
        tracing::debug!(backup = %backup.display(), "Corrupt backup already present");
        return;
    }

    match tokio::fs::rename(path, &backup).await {
        Ok(()) => {
            tracing::warn!(backup = %backup.display(), "Preserved corrupt cache file");
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Could not preserve corrupt cache file"
            );
        }
    }
}
