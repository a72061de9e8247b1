use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A continuous, evenly sampled time series from one sensor channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Network code (e.g., "IU").
    pub network: String,

    /// Station code (e.g., "MAJO").
    pub station: String,

    /// Location code, possibly empty.
    #[serde(default)]
    pub location: String,

    /// Channel code (e.g., "BHZ").
    pub channel: String,

    /// Time of the first sample.
    pub start: DateTime<Utc>,

    /// Samples per second.
    pub sampling_rate: f64,

    /// Amplitude samples in counts.
    #[serde(with = "samples")]
    pub samples: Vec<f64>,
}

impl Trace {
    /// Create a new trace.
    pub fn new(
        network: impl Into<String>,
        station: impl Into<String>,
        location: impl Into<String>,
        channel: impl Into<String>,
        start: DateTime<Utc>,
        sampling_rate: f64,
        samples: Vec<f64>,
    ) -> Self {
        Self {
            network: network.into(),
            station: station.into(),
            location: location.into(),
            channel: channel.into(),
            start,
            sampling_rate,
            samples,
        }
    }

    /// SEED identifier `NET.STA.LOC.CHA`.
    pub fn id(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.network, self.station, self.location, self.channel
        )
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample interval in seconds.
    pub fn delta(&self) -> f64 {
        if self.sampling_rate > 0.0 {
            1.0 / self.sampling_rate
        } else {
            0.0
        }
    }

    /// Time of sample `index`.
    pub fn time_of(&self, index: usize) -> DateTime<Utc> {
        let offset_ns = (index as f64 * self.delta() * 1e9).round() as i64;
        self.start + TimeDelta::nanoseconds(offset_ns)
    }

    /// Time of the last sample (the start time for an empty trace).
    pub fn end(&self) -> DateTime<Utc> {
        self.time_of(self.samples.len().saturating_sub(1))
    }

    /// Time at which the sample following the last one would fall.
    pub fn next_sample_time(&self) -> DateTime<Utc> {
        self.time_of(self.samples.len())
    }

    /// Iterate over `(time, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, &v)| (self.time_of(i), v))
    }

    /// Largest sample value.
    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }

    /// Largest absolute sample value.
    pub fn abs_max(&self) -> Option<f64> {
        self.samples.iter().map(|v| v.abs()).reduce(f64::max)
    }
}

/// The traces returned for one station request, in time order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stream {
    traces: Vec<Trace>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    /// First trace, the one used for plotting.
    pub fn first(&self) -> Option<&Trace> {
        self.traces.first()
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn traces_mut(&mut self) -> &mut [Trace] {
        &mut self.traces
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Total number of samples across all traces.
    pub fn sample_count(&self) -> usize {
        self.traces.iter().map(Trace::len).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trace> {
        self.traces.iter()
    }
}

impl From<Vec<Trace>> for Stream {
    fn from(traces: Vec<Trace>) -> Self {
        Self { traces }
    }
}

impl<'a> IntoIterator for &'a Stream {
    type Item = &'a Trace;
    type IntoIter = std::slice::Iter<'a, Trace>;

    fn into_iter(self) -> Self::IntoIter {
        self.traces.iter()
    }
}

/// Fetched streams keyed by station label, for one total duration.
pub type Dataset = BTreeMap<String, Stream>;

/// Sample arrays that survive formats without non-finite numbers.
///
/// Human-readable formats (JSON) spell NaN and infinities as the strings
/// `"NaN"`, `"inf"` and `"-inf"`; binary formats keep plain floats.
mod samples {
    use serde::de;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Sample {
        Number(f64),
        Text(String),
    }

    fn name(value: f64) -> &'static str {
        if value.is_nan() {
            "NaN"
        } else if value > 0.0 {
            "inf"
        } else {
            "-inf"
        }
    }

    pub fn serialize<S: Serializer>(samples: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        if !serializer.is_human_readable() || samples.iter().all(|v| v.is_finite()) {
            return samples.serialize(serializer);
        }

        let mut seq = serializer.serialize_seq(Some(samples.len()))?;
        for &value in samples {
            if value.is_finite() {
                seq.serialize_element(&value)?;
            } else {
                seq.serialize_element(name(value))?;
            }
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        if !deserializer.is_human_readable() {
            return Vec::<f64>::deserialize(deserializer);
        }

        Vec::<Sample>::deserialize(deserializer)?
            .into_iter()
            .map(|sample| match sample {
                Sample::Number(value) => Ok(value),
                Sample::Text(text) => match text.as_str() {
                    "NaN" => Ok(f64::NAN),
                    "inf" => Ok(f64::INFINITY),
                    "-inf" => Ok(f64::NEG_INFINITY),
                    other => Err(de::Error::custom(format!("invalid sample '{}'", other))),
                },
            })
            .collect()
    }
}
