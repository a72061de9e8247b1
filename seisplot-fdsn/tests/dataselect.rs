//! Integration tests for the FDSN client against an in-process dataselect server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::{TimeDelta, TimeZone, Utc};
use seisplot_fdsn::{FdsnClient, FdsnConfig, FetchError, WaveformRequest, WaveformSource};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// Build a 512-byte big-endian record header with blockette 1000.
fn header(encoding: u8, num_samples: u16, start_fraction: u16) -> Vec<u8> {
    let mut rec = vec![0u8; 512];
    rec[0..6].copy_from_slice(b"000001");
    rec[6] = b'D';
    rec[7] = b' ';
    rec[8..13].copy_from_slice(b"MAJO ");
    rec[13..15].copy_from_slice(b"00");
    rec[15..18].copy_from_slice(b"BHZ");
    rec[18..20].copy_from_slice(b"IU");
    rec[20..22].copy_from_slice(&2024u16.to_be_bytes());
    rec[22..24].copy_from_slice(&1u16.to_be_bytes());
    rec[24] = 7;
    rec[25] = 10;
    rec[26] = 0;
    rec[28..30].copy_from_slice(&start_fraction.to_be_bytes());
    rec[30..32].copy_from_slice(&num_samples.to_be_bytes());
    rec[32..34].copy_from_slice(&20i16.to_be_bytes());
    rec[34..36].copy_from_slice(&1i16.to_be_bytes());
    rec[39] = 1;
    rec[44..46].copy_from_slice(&64u16.to_be_bytes());
    rec[46..48].copy_from_slice(&48u16.to_be_bytes());
    rec[48..50].copy_from_slice(&1000u16.to_be_bytes());
    rec[52] = encoding;
    rec[53] = 1;
    rec[54] = 9;
    rec
}

/// Two contiguous records: five Steim-1 samples, then three INT32 samples.
fn mseed_body() -> Vec<u8> {
    let mut steim = header(10, 5, 0);
    let words: [u32; 5] = [0x01C0_0000, 10, 20, 0x0002_FD00, 11];
    for (i, w) in words.iter().enumerate() {
        steim[64 + i * 4..68 + i * 4].copy_from_slice(&w.to_be_bytes());
    }

    // 5 samples at 20 Hz = 0.25 s later.
    let mut ints = header(3, 3, 2500);
    for (i, v) in [21i32, 22, 23].iter().enumerate() {
        ints[64 + i * 4..68 + i * 4].copy_from_slice(&v.to_be_bytes());
    }

    steim.extend(ints);
    steim
}

async fn dataselect(
    State(seen): State<Seen>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    seen.lock().unwrap().push(params.clone());
    match params.get("sta").map(String::as_str) {
        Some("MAJO") => (StatusCode::OK, mseed_body()).into_response(),
        Some("EMPTY") => StatusCode::NO_CONTENT.into_response(),
        Some("GONE") => StatusCode::NOT_FOUND.into_response(),
        _ => (StatusCode::BAD_REQUEST, "Error 400: bad station").into_response(),
    }
}

async fn spawn_server() -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/fdsnws/dataselect/1/query", get(dataselect))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), seen)
}

fn request(station: &str) -> WaveformRequest {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 7, 10, 0).unwrap();
    WaveformRequest {
        network: "IU".to_string(),
        station: station.to_string(),
        location: "*".to_string(),
        channel: "BHZ".to_string(),
        start,
        end: start + TimeDelta::seconds(1700),
    }
}

fn client(base_url: String) -> FdsnClient {
    FdsnClient::new(&FdsnConfig {
        base_url,
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_decodes_and_merges_records() {
    let (base_url, seen) = spawn_server().await;
    let client = client(base_url);

    let stream = client.fetch(&request("MAJO")).await.unwrap();

    assert_eq!(stream.len(), 1);
    let trace = stream.first().unwrap();
    assert_eq!(trace.id(), "IU.MAJO.00.BHZ");
    assert_eq!(trace.sampling_rate, 20.0);
    assert_eq!(trace.start, Utc.with_ymd_and_hms(2024, 1, 1, 7, 10, 0).unwrap());
    assert_eq!(
        trace.samples,
        vec![10.0, 12.0, 9.0, 9.0, 20.0, 21.0, 22.0, 23.0]
    );

    let params = seen.lock().unwrap()[0].clone();
    assert_eq!(params["net"], "IU");
    assert_eq!(params["loc"], "*");
    assert_eq!(params["cha"], "BHZ");
    assert_eq!(params["start"], "2024-01-01T07:10:00.000000");
    assert_eq!(params["end"], "2024-01-01T07:38:20.000000");
}

#[tokio::test]
async fn test_no_content_is_no_data() {
    let (base_url, _) = spawn_server().await;
    let client = client(base_url);

    let result = client.fetch(&request("EMPTY")).await;
    assert!(matches!(result, Err(FetchError::NoData(_))));

    let result = client.fetch(&request("GONE")).await;
    assert!(matches!(result, Err(FetchError::NoData(_))));
}

#[tokio::test]
async fn test_error_status_reported() {
    let (base_url, _) = spawn_server().await;
    let client = client(base_url);

    match client.fetch(&request("XXXX")).await {
        Err(FetchError::Status { status, body, .. }) => {
            assert_eq!(status, 400);
            assert!(body.contains("bad station"));
        }
        other => panic!("expected a status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_service() {
    // Bind and drop a listener to obtain a port nobody is serving.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = client(format!("http://127.0.0.1:{}", port));

    let result = client.fetch(&request("MAJO")).await;
    assert!(matches!(result, Err(FetchError::Http(_))));
}
