//! Station descriptors and the immutable station table.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::processing::ProcessingConfig;

/// A seismic sensor, its highlighted time window and how to draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDescriptor {
    /// Human-readable label, unique within a table (e.g., "Nagano, Japan").
    pub label: String,

    /// Network code (e.g., "IU").
    pub network: String,

    /// Station code (e.g., "MAJO").
    pub station: String,

    /// Channel code (e.g., "BHZ").
    pub channel: String,

    /// Location code; `*` matches any (default).
    #[serde(default = "default_location")]
    pub location: String,

    /// Start of the highlighted window, also the start of the fetch window.
    pub start: DateTime<Utc>,

    /// End of the highlighted window.
    pub end: DateTime<Utc>,

    /// Display scale factor applied after normalization (default: 1.0).
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Line and marker color.
    pub color: Color,

    /// Latitude in degrees.
    pub lat: f64,

    /// Longitude in degrees.
    pub lng: f64,

    /// Signal conditioning applied before plotting.
    #[serde(default)]
    pub processing: ProcessingConfig,
}

fn default_location() -> String {
    "*".to_string()
}

fn default_scale() -> f64 {
    1.0
}

impl StationDescriptor {
    /// Validate a single descriptor.
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(Error::validation("station label must not be empty"));
        }
        for (name, code) in [
            ("network", &self.network),
            ("station", &self.station),
            ("channel", &self.channel),
        ] {
            if code.trim().is_empty() {
                return Err(Error::validation(format!(
                    "station '{}': {} code must not be empty",
                    self.label, name
                )));
            }
        }
        if self.start >= self.end {
            return Err(Error::validation(format!(
                "station '{}': start must be before end",
                self.label
            )));
        }
        if !(self.scale > 0.0) {
            return Err(Error::validation(format!(
                "station '{}': scale must be > 0",
                self.label
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::validation(format!(
                "station '{}': latitude {} out of range",
                self.label, self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::validation(format!(
                "station '{}': longitude {} out of range",
                self.label, self.lng
            )));
        }
        self.processing
            .validate()
            .map_err(|e| Error::validation(format!("station '{}': {}", self.label, e)))
    }
}

/// Ordered, immutable collection of station descriptors.
///
/// Order is the configuration order and drives legend order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationTable {
    stations: Vec<StationDescriptor>,
}

impl StationTable {
    /// Build a validated table.
    pub fn new(stations: Vec<StationDescriptor>) -> Result<Self> {
        let table = Self { stations };
        table.validate()?;
        Ok(table)
    }

    /// Validate every descriptor and label uniqueness.
    pub fn validate(&self) -> Result<()> {
        if self.stations.is_empty() {
            return Err(Error::validation("at least one station is required"));
        }
        let mut seen = HashSet::new();
        for station in &self.stations {
            station.validate()?;
            if !seen.insert(station.label.as_str()) {
                return Err(Error::validation(format!(
                    "duplicate station label '{}'",
                    station.label
                )));
            }
        }
        Ok(())
    }

    /// Look up a station by label.
    pub fn get(&self, label: &str) -> Option<&StationDescriptor> {
        self.stations.iter().find(|s| s.label == label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StationDescriptor> {
        self.stations.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.stations.iter().map(|s| s.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

impl<'a> IntoIterator for &'a StationTable {
    type Item = &'a StationDescriptor;
    type IntoIter = std::slice::Iter<'a, StationDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const TABLE: &str = r#"
    [
        {
            label: "Nagano, Japan",
            network: "IU", station: "MAJO", channel: "BHZ",
            scale: 1.0,
            start: "2024-01-01T07:10:00Z", end: "2024-01-01T07:19:00Z",
            color: "r", lat: 36.546, lng: 138.204,
        },
        {
            label: "Meade River, AK",
            network: "AK", station: "B20K", channel: "BHZ",
            scale: 0.8,
            start: "2024-01-01T07:19:00Z", end: "2024-01-01T07:23:00Z",
            color: "b", lat: 70.0079, lng: -157.1599,
        },
    ]
    "#;

    #[test]
    fn test_parse_table() {
        let table: StationTable = parse_config(TABLE).unwrap();
        table.validate().unwrap();

        assert_eq!(table.len(), 2);
        let labels: Vec<_> = table.labels().collect();
        assert_eq!(labels, vec!["Nagano, Japan", "Meade River, AK"]);

        let nagano = table.get("Nagano, Japan").unwrap();
        assert_eq!(nagano.location, "*");
        assert_eq!(nagano.color, Color::rgb(255, 0, 0));
        assert!(nagano.processing.is_noop());
        assert!(table.get("Casper, WY").is_none());
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let table: StationTable = parse_config(TABLE).unwrap();
        let mut stations: Vec<_> = table.iter().cloned().collect();
        stations.push(stations[0].clone());

        let err = StationTable::new(stations).unwrap_err();
        assert!(err.to_string().contains("duplicate station label"));
    }

    #[test]
    fn test_invalid_window_rejected() {
        let table: StationTable = parse_config(TABLE).unwrap();
        let mut station = table.get("Nagano, Japan").unwrap().clone();
        station.end = station.start;
        assert!(matches!(station.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(StationTable::new(Vec::new()).is_err());
    }
}
