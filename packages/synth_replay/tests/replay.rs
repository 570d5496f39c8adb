use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use synth_replay::{Capture, CaptureError, replay};
use synth_tracker::{SessionEvent, SessionPhase, TrackerConfig};

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("captures/basic_session.jsonl")
}

fn sample() -> Capture {
    Capture::read(sample_path()).unwrap()
}

fn count(events: &[SessionEvent], name: &str) -> usize {
    events.iter().filter(|e| e.name() == name).count()
}

#[test]
fn sample_capture_replays_cleanly() {
    let capture = sample();
    assert_eq!(capture.header.recipes.len(), 1);
    assert_eq!(capture.duration_ms(), 22000);

    let report = replay(&capture, TrackerConfig::default());
    let events: Vec<SessionEvent> = report.events.iter().map(|t| t.event.clone()).collect();

    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    assert_eq!(report.final_phase, SessionPhase::Idle);
    assert_eq!(report.phase_changes(), 13);
    assert_eq!(count(&events, "started"), 1);
    assert_eq!(count(&events, "advanced"), 1);
    assert_eq!(count(&events, "finished"), 1);
    assert_eq!(count(&events, "quick_synth_progress"), 4);

    let summary = &report.summary;
    assert_eq!(summary.started, 1);
    assert_eq!(summary.cancelled, 0);
    assert_eq!(summary.quick_synth_updates, 4);
    assert_eq!(summary.sessions.len(), 1);
    let outcome = &summary.sessions[0];
    assert_eq!(outcome.recipe_id, Some(35000));
    assert!(outcome.completed);
    assert_eq!(outcome.progress, 1000);
    assert_eq!(outcome.quality, 250);
}

#[test]
fn advanced_waits_for_buffs_to_show_up() {
    let report = replay(&sample(), TrackerConfig::default());
    let advanced = report
        .events
        .iter()
        .find(|t| matches!(t.event, SessionEvent::Advanced { .. }))
        .unwrap();
    // 4050 still showed the old status list
    assert_eq!(advanced.at_ms, 4100);
    match &advanced.event {
        SessionEvent::Advanced { step, .. } => {
            assert_eq!(step.index, 2);
            assert_eq!(step.buffs.inner_quiet, 1);
            assert_eq!(step.remaining_cp, 582);
        }
        _ => unreachable!(),
    }
}

#[test]
fn short_deadline_accepts_stale_window() {
    let config = TrackerConfig {
        prediction_deadline: Duration::from_millis(10),
        ..Default::default()
    };
    let report = replay(&sample(), config);
    let advanced = report
        .events
        .iter()
        .find(|t| matches!(t.event, SessionEvent::Advanced { .. }))
        .unwrap();
    assert_eq!(advanced.at_ms, 4050);

    let codes: Vec<_> = report
        .diagnostics
        .iter()
        .map(|r| r.diagnostic.code())
        .collect();
    assert_eq!(codes, vec!["reconciliation_timeout"]);
    assert_eq!(report.final_phase, SessionPhase::Idle);
}

#[test]
fn report_serializes_tagged_events() {
    let report = replay(&sample(), TrackerConfig::default());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["final_phase"], "idle");
    assert_eq!(json["events"][0]["at_ms"], 0);
    assert_eq!(json["events"][0]["event"]["type"], "phase_changed");
    assert_eq!(json["events"][0]["event"]["to"], "awaiting_session_end");
}

#[test]
fn reads_capture_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"record":"header"}}"#).unwrap();
    writeln!(
        file,
        r#"{{"record":"frame","at_ms":0,"signal":{{"preparing":true,"active":true}}}}"#
    )
    .unwrap();
    writeln!(
        file,
        r#"{{"record":"frame","at_ms":5,"signal":{{"preparing":true,"active":true}}}}"#
    )
    .unwrap();

    let capture = Capture::read(file.path()).unwrap();
    let report = replay(&capture, TrackerConfig::default());
    assert_eq!(report.final_phase, SessionPhase::IdleBetween);
    assert!(report.summary.sessions.is_empty());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Capture::read(dir.path().join("nope.jsonl")).unwrap_err();
    assert!(matches!(err, CaptureError::Io(_)));
}
