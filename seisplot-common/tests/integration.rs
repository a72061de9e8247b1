//! Integration tests for seisplot-common.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{TimeZone, Utc};
use seisplot_common::{
    CacheError, CacheLoad, Format, Stream, StationTable, Trace, WaveformCache, decode,
    parse_config,
};

fn stream_for(station: &str, value: f64) -> Stream {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 7, 10, 0).unwrap();
    Stream::from(vec![Trace::new(
        "N4",
        station,
        "00",
        "HHZ",
        start,
        100.0,
        vec![value; 16],
    )])
}

#[derive(Debug, thiserror::Error)]
#[error("service unavailable")]
struct Unavailable;

#[tokio::test]
async fn test_second_call_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = WaveformCache::new(dir.path(), Format::Cbor);
    let fetches = AtomicUsize::new(0);
    let fetches = &fetches;

    let first = cache
        .get_or_fetch(1700, "Casper, WY", move || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Unavailable>(stream_for("K22A", 4.0))
        })
        .await
        .expect("first call fetches");

    // A fresh handle on the same directory must see the persisted entry.
    let reopened = WaveformCache::new(dir.path(), Format::Cbor);
    let second = reopened
        .get_or_fetch(1700, "Casper, WY", move || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            Err::<Stream, _>(Unavailable)
        })
        .await
        .expect("second call must be served from cache");

    assert_eq!(first, second);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_station_does_not_disturb_others() {
    let dir = tempfile::tempdir().unwrap();
    let cache = WaveformCache::new(dir.path(), Format::Json);

    cache
        .get_or_fetch(1700, "Casper, WY", || async {
            Ok::<_, Unavailable>(stream_for("K22A", 1.0))
        })
        .await
        .unwrap();

    let failed = cache
        .get_or_fetch(1700, "Pittsboro, NC", || async { Err::<Stream, _>(Unavailable) })
        .await;
    assert!(matches!(failed, Err(CacheError::Fetch(Unavailable))));

    match cache.load(1700).await {
        CacheLoad::Valid(dataset) => {
            assert_eq!(dataset.len(), 1);
            assert!(dataset.contains_key("Casper, WY"));
        }
        other => panic!("expected a valid cache, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cache_file_is_plain_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let cache = WaveformCache::new(dir.path(), Format::Cbor);

    cache
        .get_or_fetch(60, "Pittsboro, NC", || async {
            Ok::<_, Unavailable>(stream_for("V58A", 2.5))
        })
        .await
        .unwrap();

    let bytes = std::fs::read(dir.path().join("waveforms_60.cbor")).unwrap();
    let dataset: seisplot_common::Dataset = decode(&bytes, Format::Cbor).unwrap();
    let stream = &dataset["Pittsboro, NC"];
    assert_eq!(stream.first().unwrap().id(), "N4.V58A.00.HHZ");
    assert_eq!(stream.sample_count(), 16);
}

#[test]
fn test_station_table_keeps_file_order() {
    let table: StationTable = parse_config(
        r#"
        [
            { label: "Pittsboro, NC", network: "N4", station: "V58A", channel: "HHZ",
              start: "2024-01-01T07:28:00Z", end: "2024-01-01T07:53:00Z",
              scale: 0.5, color: "k", lat: 35.79, lng: -79.11 },
            { label: "Casper, WY", network: "N4", station: "K22A", channel: "HHZ",
              start: "2024-01-01T07:23:00Z", end: "2024-01-01T07:28:00Z",
              scale: 0.6, color: "g", lat: 42.65, lng: -106.32,
              processing: { demean: true, highpass_hz: 0.5 } },
        ]
        "#,
    )
    .unwrap();
    table.validate().unwrap();

    let labels: Vec<_> = table.labels().collect();
    assert_eq!(labels, vec!["Pittsboro, NC", "Casper, WY"]);

    let casper = table.get("Casper, WY").unwrap();
    assert!(casper.processing.demean);
    assert_eq!(casper.processing.highpass_hz, Some(0.5));
    assert_eq!(casper.processing.corners, 4);
}
