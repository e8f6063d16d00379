#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path as UrlPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::{Value, json};

/// A request seen by the mock matching service
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub coordinates: String,
    pub params: HashMap<String, String>,
}

#[derive(Default)]
pub struct MockBehaviour {
    /// Answer HTTP 500 when the timestamps parameter starts with this
    pub fail_timestamps_prefix: Option<String>,
    /// Delay the answer when the timestamps parameter starts with this
    pub slow_timestamps_prefix: Option<String>,
}

struct MockState {
    behaviour: MockBehaviour,
    seen: Mutex<Vec<SeenRequest>>,
}

pub struct MockMatcher {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockMatcher {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().unwrap().clone()
    }
}

/// Start an OSRM-like `/match` endpoint that echoes the request points
/// back as a single matching.
pub async fn spawn_matcher(behaviour: MockBehaviour) -> MockMatcher {
    let state = Arc::new(MockState {
        behaviour,
        seen: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/match/v1/driving/:coords", get(handle_match))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockMatcher {
        base_url: format!("http://{}", addr),
        state,
    }
}

async fn handle_match(
    State(state): State<Arc<MockState>>,
    UrlPath(coords): UrlPath<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let timestamps = params.get("timestamps").cloned().unwrap_or_default();
    state.seen.lock().unwrap().push(SeenRequest {
        coordinates: coords.clone(),
        params,
    });

    if let Some(prefix) = &state.behaviour.slow_timestamps_prefix {
        if timestamps.starts_with(prefix.as_str()) {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
    }
    if let Some(prefix) = &state.behaviour.fail_timestamps_prefix {
        if timestamps.starts_with(prefix.as_str()) {
            return (StatusCode::INTERNAL_SERVER_ERROR, "matcher exploded").into_response();
        }
    }

    let geometry: Vec<Vec<f64>> = coords
        .split(';')
        .map(|pair| pair.split(',').map(|v| v.parse().unwrap()).collect())
        .collect();
    axum::Json(json!({
        "code": "Ok",
        "matchings": [{
            "confidence": 0.8,
            "geometry": {"type": "LineString", "coordinates": geometry}
        }],
        "tracepoints": []
    }))
    .into_response()
}

/// Write a trajectory file from `(lat, lon, epoch ms)` rows
pub fn write_trajectory_csv(dir: &Path, rows: &[(f64, f64, i64)]) -> PathBuf {
    let mut contents = String::from("latitude;longitude;datetime\n");
    for (lat, lon, ts) in rows {
        contents.push_str(&format!("{};{};{}\n", lat, lon, ts));
    }
    let path = dir.join("trajectory.csv");
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}
