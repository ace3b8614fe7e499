#![cfg(feature = "metrics")]
//! Tests for `relayhttp` metrics helpers.
//!
//! These tests verify that counters and gauges update as expected using
//! `metrics_util::debugging::DebuggingRecorder`.
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use relayhttp::metrics::{self as relay_metrics, Direction};
use rstest::rstest;

fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

#[rstest]
#[case(Direction::Inbound, "inbound")]
#[case(Direction::Outbound, "outbound")]
fn fragment_metric_is_labelled_by_direction(#[case] direction: Direction, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || relay_metrics::inc_fragments(direction));

    let metrics = snapshotter.snapshot().into_vec();
    let found = metrics.iter().any(|(k, _, _, v)| {
        k.key().name() == relay_metrics::FRAGMENTS_PROCESSED
            && k.key()
                .labels()
                .any(|l| l.key() == "direction" && l.value() == label)
            && matches!(v, DebugValue::Counter(c) if *c > 0)
    });
    assert!(found, "{label} fragment metric not recorded");
}

#[test]
fn error_metric_increments() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        relay_metrics::inc_errors();
        relay_metrics::inc_errors();
    });

    let metrics = snapshotter.snapshot().into_vec();
    let found = metrics.iter().any(|(k, _, _, v)| {
        k.key().name() == relay_metrics::ERRORS_TOTAL && matches!(v, DebugValue::Counter(2))
    });
    assert!(found, "error metric not recorded");
}

#[test]
fn session_gauge_tracks_guard_lifetime() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let sessions = relayhttp::session::ActiveSessions::new();
    metrics::with_local_recorder(&recorder, || {
        let first = sessions.enter();
        let _second = sessions.enter();
        drop(first);
    });
    assert_eq!(sessions.get(), 0);

    let metrics = snapshotter.snapshot().into_vec();
    let gauge = metrics.iter().find_map(|(k, _, _, v)| match v {
        DebugValue::Gauge(g) if k.key().name() == relay_metrics::SESSIONS_ACTIVE => {
            Some(g.into_inner())
        }
        _ => None,
    });
    assert_eq!(gauge, Some(0.0));
}
