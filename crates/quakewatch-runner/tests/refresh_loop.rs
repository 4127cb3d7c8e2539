//! End-to-end refresh tests: file feed -> planner -> sinks.
//!
//! The feed file is rewritten between cycles to simulate the upstream
//! service publishing new events.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use quakewatch_core::PlannerError;
use quakewatch_core::config::FeedConfig;

use quakewatch_core::config::PlannerConfig;
use quakewatch_core::UpdatePlanner;
use quakewatch_core::sink::{
    GeoJsonFileSink, MARKERS_FILE, NotificationSink, RISK_ZONES_FILE, SinkError,
};
use quakewatch_feed::{FeedError, FeedSource, FileFeed};
use quakewatch_observer::AppState;
use quakewatch_runner::{CycleOutcome, Refresher};
use quakewatch_types::EventRecord;

#[derive(Clone, Default)]
struct Recorder {
    ids: Arc<Mutex<Vec<String>>>,
}

impl NotificationSink for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn notify(&mut self, event: &EventRecord) -> Result<(), SinkError> {
        self.ids.lock().unwrap().push(event.id.to_string());
        Ok(())
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("quakewatch-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn feature(id: &str, lon: f64, lat: f64, mag: f64) -> String {
    format!(
        r#"{{"type":"Feature","id":"{id}","properties":{{"mag":{mag},"place":"{id} area","time":1717228800000}},"geometry":{{"type":"Point","coordinates":[{lon},{lat},10.0]}}}}"#
    )
}

fn write_feed(path: &PathBuf, features: &[String]) {
    let body = format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    );
    std::fs::write(path, body).unwrap();
}

#[tokio::test]
async fn second_cycle_announces_only_new_significant_events() {
    let dir = scratch_dir("refresh");
    let feed_path = dir.join("feed.geojson");
    let out_dir = dir.join("layers");

    write_feed(
        &feed_path,
        &[feature("a", 0.0, 0.0, 5.5), feature("b", 0.0, 0.1, 6.0)],
    );

    let recorder = Recorder::default();
    let state = Arc::new(AppState::new());
    let mut refresher = Refresher::new(
        FeedSource::File(FileFeed::new(feed_path.to_string_lossy().into_owned())),
        UpdatePlanner::new(PlannerConfig::default()),
        Duration::from_secs(60),
        Duration::from_secs(5),
    )
    .with_render_sink(Box::new(GeoJsonFileSink::new(&out_dir).unwrap()))
    .with_notification_sink(Box::new(recorder.clone()))
    .with_observer(Arc::clone(&state));

    // First cycle establishes the baseline silently.
    let first = refresher.run_cycle().await;
    assert!(matches!(
        first,
        CycleOutcome::Committed { events: 2, risk_zones: 1, new_significant: 0, sink_failures: 0 }
    ));
    assert!(recorder.ids.lock().unwrap().is_empty());

    let zones: serde_json::Value =
        serde_json::from_slice(&std::fs::read(out_dir.join(RISK_ZONES_FILE)).unwrap()).unwrap();
    assert_eq!(zones["features"].as_array().unwrap().len(), 1);

    // Upstream adds one significant and one minor event far away.
    write_feed(
        &feed_path,
        &[
            feature("a", 0.0, 0.0, 5.5),
            feature("b", 0.0, 0.1, 6.0),
            feature("c", 100.0, 40.0, 7.1),
            feature("d", -70.0, -20.0, 4.2),
        ],
    );

    let second = refresher.run_cycle().await;
    assert!(matches!(
        second,
        CycleOutcome::Committed { events: 4, risk_zones: 1, new_significant: 1, .. }
    ));
    assert_eq!(*recorder.ids.lock().unwrap(), vec![String::from("c")]);

    let markers: serde_json::Value =
        serde_json::from_slice(&std::fs::read(out_dir.join(MARKERS_FILE)).unwrap()).unwrap();
    assert_eq!(markers["features"].as_array().unwrap().len(), 4);

    let snap = state.snapshot();
    assert_eq!(snap.status.updates_applied, 2);
    assert_eq!(snap.alerts.len(), 1);
    assert_eq!(refresher.planner().committed_cycles(), 2);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn malformed_feed_keeps_previous_baseline() {
    let dir = scratch_dir("malformed");
    let feed_path = dir.join("feed.geojson");
    write_feed(&feed_path, &[feature("a", 10.0, 10.0, 5.0)]);

    let mut refresher = Refresher::new(
        FeedSource::File(FileFeed::new(feed_path.to_string_lossy().into_owned())),
        UpdatePlanner::new(PlannerConfig::default()),
        Duration::from_secs(60),
        Duration::from_secs(5),
    );

    assert!(matches!(refresher.run_cycle().await, CycleOutcome::Committed { .. }));

    std::fs::write(&feed_path, "{not json").unwrap();
    assert!(matches!(refresher.run_cycle().await, CycleOutcome::Failed(_)));

    let baseline = refresher.planner().last_event_set().unwrap();
    assert_eq!(baseline.len(), 1);
    assert_eq!(refresher.planner().committed_cycles(), 1);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn loop_runs_first_cycle_immediately() {
    let dir = scratch_dir("loop");
    let feed_path = dir.join("feed.geojson");
    write_feed(&feed_path, &[feature("a", 10.0, 10.0, 5.0)]);

    let refresher = Refresher::new(
        FeedSource::File(FileFeed::new(feed_path.to_string_lossy().into_owned())),
        UpdatePlanner::new(PlannerConfig::default()),
        Duration::from_secs(3600),
        Duration::from_secs(5),
    );

    // With an hour-long interval only the startup cycle can run.
    let summary = refresher
        .run(tokio::time::sleep(Duration::from_millis(500)))
        .await;
    assert_eq!(summary.committed, 1);
    assert_eq!(summary.failed, 0);

    std::fs::remove_dir_all(&dir).unwrap();
}

/// Serves one event on the first request and stalls on every later one.
async fn stalling_feed() -> String {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new().route(
        "/query",
        get(move || {
            let hits = Arc::clone(&hits);
            async move {
                if hits.fetch_add(1, Ordering::SeqCst) > 0 {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
                format!(
                    r#"{{"type":"FeatureCollection","features":[{}]}}"#,
                    feature("a", 10.0, 10.0, 5.0)
                )
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/query")
}

#[tokio::test]
async fn timed_out_fetch_is_a_fetch_failure_and_keeps_baseline() {
    let config = FeedConfig {
        base_url: stalling_feed().await,
        request_timeout_ms: 60_000,
        ..FeedConfig::default()
    };
    let state = Arc::new(AppState::new());
    let mut refresher = Refresher::new(
        FeedSource::from_config(&config).unwrap(),
        UpdatePlanner::new(PlannerConfig::default()),
        Duration::from_secs(60),
        Duration::from_millis(300),
    )
    .with_observer(Arc::clone(&state));

    assert!(matches!(
        refresher.run_cycle().await,
        CycleOutcome::Committed { events: 1, .. }
    ));
    let baseline = refresher.planner().last_event_set().cloned().unwrap();

    // The cycle's own deadline fires well before the client's.
    let outcome = refresher.run_cycle().await;
    assert!(matches!(
        outcome,
        CycleOutcome::Failed(PlannerError::FetchFailure { ref message })
            if message == &FeedError::Timeout(300).to_string()
    ));
    assert_eq!(refresher.planner().last_event_set(), Some(&baseline));
    assert_eq!(refresher.planner().committed_cycles(), 1);
    assert_eq!(state.snapshot().status.failures, 1);

    // Abandoning a cycle mid-fetch commits nothing either.
    let abandoned = tokio::time::timeout(Duration::from_millis(50), refresher.run_cycle()).await;
    assert!(abandoned.is_err());
    assert_eq!(refresher.planner().last_event_set(), Some(&baseline));
    assert_eq!(refresher.planner().committed_cycles(), 1);
}
