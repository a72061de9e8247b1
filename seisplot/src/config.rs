//! Top-level seisplot configuration.

use serde::Deserialize;

use seisplot_common::{
    CacheConfig, ConfigFile, Error, EventConfig, LoggingConfig, Result, StationTable,
};
use seisplot_fdsn::FdsnConfig;
use seisplot_render::{MapConfig, TimelineConfig};

/// Complete configuration loaded from a JSON5 file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeisplotConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// The event and the time window shared by every station.
    pub event: EventConfig,

    /// FDSN data center.
    #[serde(default)]
    pub fdsn: FdsnConfig,

    /// Waveform cache location and encoding.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Stations, in plotting order.
    pub stations: StationTable,

    #[serde(default)]
    pub timeline: TimelineConfig,

    #[serde(default)]
    pub map: MapConfig,
}

impl ConfigFile for SeisplotConfig {
    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn validate(&self) -> Result<()> {
        self.event.validate()?;
        self.fdsn.validate()?;
        self.stations.validate()?;
        self.timeline.validate()?;
        self.map.validate()?;

        for label in [&self.map.path.from, &self.map.path.to] {
            if !self.stations.contains(label) {
                return Err(Error::validation(format!(
                    "map.path references unknown station '{}'",
                    label
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seisplot_common::{Format, parse_config};

    const MINIMAL: &str = r#"{
        event: { origin: "2024-01-01T07:08:00Z", duration_secs: 1700 },
        stations: [
            { label: "Nagano, Japan", network: "IU", station: "MAJO", channel: "BHZ",
              start: "2024-01-01T07:10:00Z", end: "2024-01-01T07:19:00Z", color: "r",
              lat: 36.546, lng: 138.204 },
            { label: "Pittsboro, NC", network: "N4", station: "V58A", channel: "HHZ",
              start: "2024-01-01T07:28:00Z", end: "2024-01-01T07:53:00Z", color: "k",
              lat: 35.79, lng: -79.11 },
        ],
    }"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config: SeisplotConfig = parse_config(MINIMAL).unwrap();
        config.validate().unwrap();

        assert_eq!(config.stations.len(), 2);
        assert_eq!(config.fdsn.base_url, "https://service.iris.edu");
        assert_eq!(config.cache.format, Format::Cbor);
        assert_eq!(config.timeline.width_in, 16.0);
        assert_eq!(config.map.path.segments, 256);
        assert_eq!(config.stations.get("Nagano, Japan").unwrap().location, "*");
    }

    #[test]
    fn test_unknown_path_endpoint_rejected() {
        let mut config: SeisplotConfig = parse_config(MINIMAL).unwrap();
        config.map.path.to = "Casper, WY".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Casper, WY"));
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let duplicated = MINIMAL.replace("Pittsboro, NC", "Nagano, Japan");
        let config: SeisplotConfig = parse_config(&duplicated).unwrap();
        assert!(matches!(config.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config: SeisplotConfig =
            parse_config(&MINIMAL.replace("duration_secs: 1700", "duration_secs: 0")).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_duration_rejected() {
        let huge = MINIMAL.replace("duration_secs: 1700", "duration_secs: 10000000000000");
        let config: SeisplotConfig = parse_config(&huge).unwrap();
        assert!(matches!(config.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = SeisplotConfig::load("/nonexistent/seisplot.json5");
        assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../seisplot.json5");
        let config = SeisplotConfig::load(path).unwrap();

        let labels: Vec<&str> = config.stations.labels().collect();
        assert_eq!(
            labels,
            ["Nagano, Japan", "Meade River, AK", "Casper, WY", "Pittsboro, NC"]
        );
        assert_eq!(config.event.duration_secs, 1700);
    }
}
