//! Run orchestration: collect waveforms, then render figures.

use std::path::PathBuf;

use seisplot_common::{CacheError, StationDescriptor, Stream, WaveformCache};
use seisplot_fdsn::{WaveformRequest, WaveformSource};
use seisplot_render::{PathSummary, Timeline, WorldMap};

use crate::args::Command;
use crate::config::SeisplotConfig;
use crate::error::{Result, RunError};

/// Runs seisplot commands against a configuration and a waveform source.
///
/// The source is only consulted for stations missing from the cache file of
/// the configured duration.
///
/// # Example
///
/// ```ignore
/// use seisplot::{Command, Runner, SeisplotConfig};
/// use seisplot_fdsn::FdsnClient;
///
/// let config = SeisplotConfig::load("seisplot.json5")?;
/// let client = FdsnClient::new(&config.fdsn)?;
/// Runner::new(config, client).run(Command::All).await?;
/// ```
pub struct Runner<S> {
    config: SeisplotConfig,
    cache: WaveformCache,
    source: S,
}

impl<S: WaveformSource> Runner<S> {
    pub fn new(config: SeisplotConfig, source: S) -> Self {
        let cache = WaveformCache::from_config(&config.cache);
        Self {
            config,
            cache,
            source,
        }
    }

    pub fn config(&self) -> &SeisplotConfig {
        &self.config
    }

    pub fn cache(&self) -> &WaveformCache {
        &self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Execute a command.
    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::All => {
                self.waveforms().await?;
                self.map()?;
            }
            Command::Waveforms => {
                self.waveforms().await?;
            }
            Command::Map => {
                self.map()?;
            }
            Command::Cache => {
                for label in self.cached_labels().await {
                    println!("{}", label);
                }
            }
        }
        Ok(())
    }

    /// Load or fetch every station's stream, in table order, with processing applied.
    ///
    /// A station whose data cannot be obtained or processed is logged and
    /// skipped. A cache write failure aborts the collection.
    pub async fn collect_waveforms(&self) -> Result<Vec<(&StationDescriptor, Stream)>> {
        let duration_secs = self.config.event.duration_secs;
        let mut collected = Vec::with_capacity(self.config.stations.len());

        for station in &self.config.stations {
            let request = WaveformRequest::for_station(station, duration_secs);
            let fetched = self
                .cache
                .get_or_fetch(duration_secs, &station.label, || self.source.fetch(&request))
                .await;

            let mut stream = match fetched {
                Ok(stream) => stream,
                Err(CacheError::Fetch(e)) => {
                    tracing::error!(
                        station = %station.label,
                        request = %request,
                        error = %e,
                        "Failed to fetch waveforms, skipping station"
                    );
                    continue;
                }
                Err(source) => {
                    return Err(RunError::Cache {
                        label: station.label.clone(),
                        source,
                    });
                }
            };

            if !station.processing.is_noop() {
                let processed = stream
                    .traces_mut()
                    .iter_mut()
                    .try_for_each(|trace| station.processing.apply(trace));
                if let Err(e) = processed {
                    tracing::error!(
                        station = %station.label,
                        error = %e,
                        "Failed to process waveforms, skipping station"
                    );
                    continue;
                }
            }

            tracing::info!(
                station = %station.label,
                traces = stream.len(),
                samples = stream.sample_count(),
                "Waveforms ready"
            );
            collected.push((station, stream));
        }

        if collected.is_empty() {
            return Err(RunError::NoData);
        }
        Ok(collected)
    }

    /// Collect waveforms and render the timeline.
    pub async fn waveforms(&self) -> Result<PathBuf> {
        let collected = self.collect_waveforms().await?;
        let event = &self.config.event;

        let mut timeline = Timeline::new(&self.config.timeline, event.origin, event.window_end());
        for (station, stream) in &collected {
            match stream.first() {
                Some(trace) => {
                    timeline.add(station, trace);
                }
                None => {
                    tracing::warn!(station = %station.label, "Empty stream, skipping station");
                }
            }
        }

        Ok(timeline.render()?)
    }

    /// Render the station map.
    pub fn map(&self) -> Result<PathSummary> {
        let map = WorldMap::new(&self.config.map).load_land()?;
        Ok(map.render(&self.config.stations)?)
    }

    /// Labels present in the cache file for the configured duration.
    pub async fn cached_labels(&self) -> Vec<String> {
        let duration_secs = self.config.event.duration_secs;
        let loaded = self.cache.load(duration_secs).await;
        let labels: Vec<String> = loaded.labels().into_iter().map(str::to_string).collect();

        tracing::info!(
            path = %self.cache.path_for(duration_secs).display(),
            stations = labels.len(),
            corrupt = loaded.is_corrupt(),
            "Cache contents"
        );
        labels
    }
}
