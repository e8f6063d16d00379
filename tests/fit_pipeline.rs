pub mod test_utils;

use std::num::NonZeroUsize;

use serde_json::Value;
use tempdir::TempDir;
use test_utils::{MockBehaviour, read_json, spawn_matcher, write_trajectory_csv};
use trackfit::{DropPolicy, Error, MatchingClient, TrackFitConfig, Trajectory, match_trajectory, run_fit};

fn config_for(dir: &TempDir, base_url: &str, batch_size: usize) -> TrackFitConfig {
    TrackFitConfig {
        matching_endpoint: base_url.to_string(),
        batch_size: NonZeroUsize::new(batch_size).unwrap(),
        results_path: dir.path().join("matched_results.json"),
        show_progress: false,
        ..Default::default()
    }
}

fn six_rows() -> Vec<(f64, f64, i64)> {
    vec![
        (52.1, 13.1, 1000),
        (52.2, 13.2, 2000),
        (52.3, 13.3, 3000),
        (52.4, 13.4, 4000),
        (52.5, 13.5, 5000),
        (52.6, 13.6, 6000),
    ]
}

#[tokio::test]
async fn three_points_make_one_batch() {
    let dir = TempDir::new("fit_three_points").unwrap();
    let matcher = spawn_matcher(MockBehaviour::default()).await;
    let mut config = config_for(&dir, &matcher.base_url, 50);
    config.input_path = write_trajectory_csv(
        dir.path(),
        &[(52.1, 13.3, 1000), (52.2, 13.4, 2000), (52.3, 13.5, 3000)],
    );

    let report = run_fit(&config).await.unwrap();
    assert_eq!(report.batches_sent, 1);
    assert_eq!(report.succeeded, 1);
    assert!(report.dropped.is_empty());

    let requests = matcher.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].coordinates, "13.3,52.1;13.4,52.2;13.5,52.3");
    assert_eq!(requests[0].params["timestamps"], "1;2;3");
    assert_eq!(requests[0].params["steps"], "true");
    assert_eq!(requests[0].params["geometries"], "geojson");

    let stored = read_json(&config.results_path);
    let stored = stored.as_array().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0]["matchings"][0]["geometry"]["coordinates"]
            .as_array()
            .unwrap()
            .len(),
        3
    );

    let raw = std::fs::read_to_string(&config.results_path).unwrap();
    assert!(raw.starts_with("[\n    {"));
}

#[tokio::test]
async fn rejected_batch_is_dropped_and_reported() {
    let dir = TempDir::new("fit_drop").unwrap();
    let matcher = spawn_matcher(MockBehaviour {
        fail_timestamps_prefix: Some("3;".to_string()),
        ..Default::default()
    })
    .await;
    let mut config = config_for(&dir, &matcher.base_url, 2);
    config.input_path = write_trajectory_csv(dir.path(), &six_rows());

    let report = run_fit(&config).await.unwrap();
    assert_eq!(report.batches_sent, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.dropped, vec![1]);
    assert_eq!(report.summary(), "matched 2 of 3 batches (1 dropped)");

    let stored = read_json(&config.results_path);
    assert_eq!(stored.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn placeholder_policy_keeps_batch_positions() {
    let dir = TempDir::new("fit_placeholder").unwrap();
    let matcher = spawn_matcher(MockBehaviour {
        fail_timestamps_prefix: Some("3;".to_string()),
        ..Default::default()
    })
    .await;
    let mut config = config_for(&dir, &matcher.base_url, 2);
    config.input_path = write_trajectory_csv(dir.path(), &six_rows());
    config.drop_policy = DropPolicy::Placeholder;

    run_fit(&config).await.unwrap();

    let stored = read_json(&config.results_path);
    let stored = stored.as_array().unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored[0].is_object());
    assert_eq!(stored[1], Value::Null);
    assert!(stored[2].is_object());
}

#[tokio::test]
async fn concurrent_requests_keep_batch_order() {
    let dir = TempDir::new("fit_concurrent").unwrap();
    // the first batch answers last
    let matcher = spawn_matcher(MockBehaviour {
        slow_timestamps_prefix: Some("1;".to_string()),
        ..Default::default()
    })
    .await;
    let mut config = config_for(&dir, &matcher.base_url, 2);
    config.concurrency = NonZeroUsize::new(3).unwrap();
    let rows = six_rows();
    let trajectory = Trajectory::from_points(
        &rows
            .iter()
            .map(|&(latitude, longitude, timestamp)| trackfit::TrajectoryPoint {
                latitude,
                longitude,
                timestamp,
            })
            .collect::<Vec<_>>(),
    );

    let client = MatchingClient::new(&config).unwrap();
    let (results, report) = match_trajectory(&client, &trajectory, &config).await;
    assert_eq!(report.succeeded, 3);

    let first_lons: Vec<f64> = results
        .iter()
        .map(|r| r["matchings"][0]["geometry"]["coordinates"][0][0].as_f64().unwrap())
        .collect();
    assert_eq!(first_lons, vec![13.1, 13.3, 13.5]);
}

#[tokio::test]
async fn unreachable_service_drops_every_batch() {
    let dir = TempDir::new("fit_unreachable").unwrap();
    // nothing listens on port 9 of localhost
    let mut config = config_for(&dir, "http://127.0.0.1:9", 2);
    config.request_timeout_secs = Some(5);
    config.input_path = write_trajectory_csv(dir.path(), &six_rows());

    let report = run_fit(&config).await.unwrap();
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.dropped, vec![0, 1, 2]);
    assert_eq!(read_json(&config.results_path), serde_json::json!([]));
}

#[tokio::test]
async fn missing_input_is_fatal() {
    let dir = TempDir::new("fit_missing").unwrap();
    let mut config = config_for(&dir, "http://127.0.0.1:9", 2);
    config.input_path = dir.path().join("nope.csv");

    let err = run_fit(&config).await.unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert!(!config.results_path.exists());
}
