//! Waveform request parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use seisplot_common::StationDescriptor;
use seisplot_common::config::duration;

/// Time format accepted by FDSN web services.
const FDSN_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A dataselect query for one channel over one time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveformRequest {
    pub network: String,
    pub station: String,
    /// Location code; `*` matches any.
    pub location: String,
    pub channel: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WaveformRequest {
    /// Request `duration_secs` of data starting at the station's window start.
    ///
    /// The end saturates at the latest representable time.
    pub fn for_station(station: &StationDescriptor, duration_secs: u64) -> Self {
        Self {
            network: station.network.clone(),
            station: station.station.clone(),
            location: station.location.clone(),
            channel: station.channel.clone(),
            start: station.start,
            end: station
                .start
                .checked_add_signed(duration(duration_secs))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Query string parameters in dataselect order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("net", self.network.clone()),
            ("sta", self.station.clone()),
            ("loc", self.location.clone()),
            ("cha", self.channel.clone()),
            ("start", self.start.format(FDSN_TIME_FORMAT).to_string()),
            ("end", self.end.format(FDSN_TIME_FORMAT).to_string()),
        ]
    }
}

impl std::fmt::Display for WaveformRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{} {} - {}",
            self.network,
            self.station,
            self.location,
            self.channel,
            self.start.format(FDSN_TIME_FORMAT),
            self.end.format(FDSN_TIME_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use seisplot_common::{Color, ProcessingConfig};

    fn nagano() -> StationDescriptor {
        StationDescriptor {
            label: "Nagano, Japan".to_string(),
            network: "IU".to_string(),
            station: "MAJO".to_string(),
            channel: "BHZ".to_string(),
            location: "*".to_string(),
            start: Utc.with_ymd_and_hms(2024, 1, 1, 7, 10, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 1, 7, 19, 0).unwrap(),
            scale: 1.0,
            color: Color::rgb(255, 0, 0),
            lat: 36.546,
            lng: 138.204,
            processing: ProcessingConfig::default(),
        }
    }

    #[test]
    fn test_window_from_station_start() {
        let request = WaveformRequest::for_station(&nagano(), 1700);
        assert_eq!(request.start, Utc.with_ymd_and_hms(2024, 1, 1, 7, 10, 0).unwrap());
        assert_eq!(request.end, Utc.with_ymd_and_hms(2024, 1, 1, 7, 38, 20).unwrap());
        assert_eq!(request.location, "*");
    }

    #[test]
    fn test_huge_duration_saturates() {
        for secs in [10_000_000_000_000, u64::MAX] {
            let request = WaveformRequest::for_station(&nagano(), secs);
            assert_eq!(request.end, DateTime::<Utc>::MAX_UTC);
        }
    }

    #[test]
    fn test_query_pairs() {
        let pairs = WaveformRequest::for_station(&nagano(), 60).query_pairs();
        assert_eq!(pairs[0], ("net", "IU".to_string()));
        assert_eq!(pairs[2], ("loc", "*".to_string()));
        assert_eq!(pairs[4], ("start", "2024-01-01T07:10:00.000000".to_string()));
        assert_eq!(pairs[5], ("end", "2024-01-01T07:11:00.000000".to_string()));
    }

    #[test]
    fn test_display() {
        let request = WaveformRequest::for_station(&nagano(), 60);
        assert_eq!(
            request.to_string(),
            "IU.MAJO.*.BHZ 2024-01-01T07:10:00.000000 - 2024-01-01T07:11:00.000000"
        );
    }
}
