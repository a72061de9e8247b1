//! Stitch decoded records into continuous traces.

use std::collections::BTreeMap;

use seisplot_common::{Stream, Trace};

use crate::mseed::Record;

/// Group records by SEED id and merge contiguous ones into traces.
///
/// A record continues the current trace when it has the same sampling rate and
/// starts within half a sample period of the trace's next expected sample.
/// Anything else (gaps, overlaps, rate changes) starts a new trace.
pub fn assemble(records: Vec<Record>) -> Stream {
    let mut groups: BTreeMap<(String, String, String, String), Vec<Record>> = BTreeMap::new();
    for record in records {
        groups.entry(record.seed_id()).or_default().push(record);
    }

    let mut stream = Stream::new();
    for (_, mut group) in groups {
        group.sort_by_key(|r| r.start);

        let mut current: Option<Trace> = None;
        for record in group {
            match current.as_mut() {
                Some(trace) if continues(trace, &record) => {
                    trace.samples.extend(record.samples);
                }
                _ => {
                    if let Some(done) = current.take() {
                        stream.push(done);
                    }
                    current = Some(Trace::new(
                        record.network,
                        record.station,
                        record.location,
                        record.channel,
                        record.start,
                        record.sampling_rate,
                        record.samples,
                    ));
                }
            }
        }
        if let Some(done) = current {
            stream.push(done);
        }
    }

    stream
}

fn continues(trace: &Trace, record: &Record) -> bool {
    let same_rate = (trace.sampling_rate - record.sampling_rate).abs()
        <= 1e-6 * trace.sampling_rate.max(1.0);
    if !same_rate {
        return false;
    }

    let expected = trace.next_sample_time();
    let gap_us = (record.start - expected).num_microseconds().unwrap_or(i64::MAX).abs();
    let tolerance_us = (trace.delta() * 0.5 * 1e6) as i64;
    gap_us <= tolerance_us
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mseed::Encoding;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 7, 10, 0).unwrap()
    }

    fn record(station: &str, start: DateTime<Utc>, samples: Vec<f64>) -> Record {
        Record {
            network: "IU".to_string(),
            station: station.to_string(),
            location: "00".to_string(),
            channel: "BHZ".to_string(),
            quality: 'D',
            start,
            sampling_rate: 10.0,
            encoding: Encoding::Steim2,
            length: 512,
            samples,
        }
    }

    #[test]
    fn test_contiguous_records_merge() {
        let records = vec![
            // Out of order on purpose.
            record("MAJO", t0() + TimeDelta::milliseconds(300), vec![4.0, 5.0]),
            record("MAJO", t0(), vec![1.0, 2.0, 3.0]),
        ];

        let stream = assemble(records);
        assert_eq!(stream.len(), 1);
        let trace = stream.first().unwrap();
        assert_eq!(trace.start, t0());
        assert_eq!(trace.samples, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_small_jitter_tolerated() {
        let records = vec![
            record("MAJO", t0(), vec![1.0, 2.0]),
            record("MAJO", t0() + TimeDelta::milliseconds(240), vec![3.0]),
        ];
        assert_eq!(assemble(records).len(), 1);
    }

    #[test]
    fn test_gap_splits_trace() {
        let records = vec![
            record("MAJO", t0(), vec![1.0, 2.0]),
            record("MAJO", t0() + TimeDelta::seconds(5), vec![3.0]),
        ];

        let stream = assemble(records);
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.traces()[1].samples, vec![3.0]);
    }

    #[test]
    fn test_stations_kept_apart() {
        let records = vec![
            record("MAJO", t0(), vec![1.0]),
            record("ANMO", t0(), vec![2.0]),
        ];

        let stream = assemble(records);
        assert_eq!(stream.len(), 2);
        // BTreeMap ordering: ANMO before MAJO.
        assert_eq!(stream.first().unwrap().station, "ANMO");
    }
}
