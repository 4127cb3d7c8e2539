//! End-to-end cycle tests for the update planner.
//!
//! Each test drives an [`UpdatePlanner`] through several fetch results the
//! way the refresh loop does, and checks both the emitted update and the
//! committed baseline.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use chrono::{TimeZone, Utc};
use quakewatch_core::config::PlannerConfig;
use quakewatch_core::{CycleStage, PlannerError, UpdatePlanner};
use quakewatch_types::{EventId, EventRecord, EventSet, GeoPoint};

fn quake(id: &str, lon: f64, lat: f64, mag: f64) -> EventRecord {
    EventRecord {
        id: EventId::from(id),
        location: GeoPoint::new(lon, lat),
        magnitude: mag,
        place: format!("Region {id}"),
        observed_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        depth_km: Some(35.0),
    }
}

fn set(records: Vec<EventRecord>) -> EventSet {
    EventSet::new(records).unwrap()
}

fn ids(events: &[EventRecord]) -> Vec<String> {
    events.iter().map(|e| e.id.to_string()).collect()
}

#[test]
fn first_cycle_renders_everything_and_notifies_nothing() {
    let mut planner = UpdatePlanner::new(PlannerConfig::default());
    let update = planner
        .cycle(set(vec![quake("1", 0.0, 0.0, 5.5), quake("2", 0.0, 0.1, 6.0)]))
        .unwrap();

    assert_eq!(update.markers.len(), 2);
    assert!(update.new_significant_events.is_empty());
    assert_eq!(update.risk_zones.len(), 1);

    let zone = update.risk_zones.first().unwrap();
    assert!(zone.descriptor.is_pair(&EventId::from("1"), &EventId::from("2")));
    assert!((zone.descriptor.radius_km - 5.56).abs() < 0.01);
    assert!((zone.descriptor.center.lat - 0.05).abs() < 1e-9);
    assert_eq!(zone.polygon.ring.len(), 65);
    assert!(zone.polygon.is_closed());
    assert_eq!(planner.committed_cycles(), 1);
}

#[test]
fn second_cycle_reports_only_new_significant_arrivals() {
    let mut planner = UpdatePlanner::new(PlannerConfig::default());
    planner.cycle(set(vec![quake("1", 0.0, 0.0, 5.5)])).unwrap();

    let update = planner
        .cycle(set(vec![
            quake("1", 0.0, 0.0, 5.5),
            quake("2", 0.0, 0.1, 6.0),
            quake("3", 100.0, -5.0, 4.2),
        ]))
        .unwrap();

    assert_eq!(ids(&update.new_significant_events), ["2"]);
    assert_eq!(update.markers.len(), 3);

    let update = planner
        .cycle(set(vec![quake("1", 0.0, 0.0, 5.5), quake("2", 0.0, 0.1, 6.0)]))
        .unwrap();
    assert!(update.new_significant_events.is_empty());
}

#[test]
fn higher_threshold_suppresses_notification() {
    let config = PlannerConfig {
        min_magnitude: 6.5,
        ..PlannerConfig::default()
    };
    let mut planner = UpdatePlanner::new(config);
    planner.cycle(set(vec![quake("1", 0.0, 0.0, 5.5)])).unwrap();
    let update = planner
        .cycle(set(vec![quake("1", 0.0, 0.0, 5.5), quake("2", 0.0, 0.1, 6.0)]))
        .unwrap();
    assert!(update.new_significant_events.is_empty());
}

#[test]
fn empty_feed_yields_empty_update() {
    let mut planner = UpdatePlanner::new(PlannerConfig::default());
    planner.cycle(set(vec![quake("1", 0.0, 0.0, 7.0)])).unwrap();

    let update = planner.cycle(EventSet::empty()).unwrap();
    assert!(update.markers.is_empty());
    assert!(update.risk_zones.is_empty());
    assert!(update.new_significant_events.is_empty());
    assert_eq!(planner.last_event_set().map(EventSet::len), Some(0));
}

#[test]
fn failed_stage_keeps_the_baseline() {
    let mut planner = UpdatePlanner::new(PlannerConfig::default());
    let baseline = set(vec![quake("1", 0.0, 0.0, 5.5)]);
    planner.cycle(baseline.clone()).unwrap();

    let err = planner
        .cycle(set(vec![
            quake("1", 0.0, 0.0, 5.5),
            quake("2", 0.0, 0.1, 6.0),
            quake("broken", 0.0, 123.0, 6.0),
        ]))
        .unwrap_err();
    assert!(matches!(
        err,
        PlannerError::PartialCycleFailure { ref source } if source.stage() == CycleStage::Cluster
    ));
    assert_eq!(planner.last_event_set(), Some(&baseline));
    assert_eq!(planner.committed_cycles(), 1);

    // The retry diffs against the same baseline, so "2" is still new.
    let update = planner
        .cycle(set(vec![quake("1", 0.0, 0.0, 5.5), quake("2", 0.0, 0.1, 6.0)]))
        .unwrap();
    assert_eq!(ids(&update.new_significant_events), ["2"]);
}

#[test]
fn fetch_failure_runs_no_cycle() {
    let mut planner = UpdatePlanner::new(PlannerConfig::default());
    let baseline = set(vec![quake("1", 0.0, 0.0, 5.5)]);
    planner.cycle(baseline.clone()).unwrap();

    let err = planner
        .apply_fetch(Err::<EventSet, _>("connection reset by peer"))
        .unwrap_err();
    assert!(matches!(
        err,
        PlannerError::FetchFailure { ref message } if message == "connection reset by peer"
    ));
    assert_eq!(planner.last_event_set(), Some(&baseline));
    assert_eq!(planner.committed_cycles(), 1);

    let update = planner
        .apply_fetch(Ok::<_, String>(set(vec![
            quake("1", 0.0, 0.0, 5.5),
            quake("9", 20.0, 20.0, 8.1),
        ])))
        .unwrap();
    assert_eq!(ids(&update.new_significant_events), ["9"]);
}

#[test]
fn planners_do_not_share_baselines() {
    let mut pacific = UpdatePlanner::new(PlannerConfig::default());
    let mut atlantic = UpdatePlanner::new(PlannerConfig::default());

    pacific.cycle(set(vec![quake("p1", 150.0, 40.0, 6.0)])).unwrap();
    let update = atlantic
        .cycle(set(vec![quake("p1", 150.0, 40.0, 6.0)]))
        .unwrap();

    // Atlantic has no baseline of its own yet, so it stays silent.
    assert!(update.new_significant_events.is_empty());
    assert_eq!(pacific.committed_cycles(), 1);
    assert_eq!(atlantic.committed_cycles(), 1);
}

#[test]
fn planning_is_deterministic() {
    let planner = UpdatePlanner::new(PlannerConfig::default());
    let events = set(vec![
        quake("a", -155.28, 19.41, 5.1),
        quake("b", -155.21, 19.33, 5.3),
        quake("c", -155.30, 19.40, 5.0),
    ]);
    assert_eq!(planner.plan(&events).unwrap(), planner.plan(&events).unwrap());
}
