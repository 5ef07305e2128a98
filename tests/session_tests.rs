//! # Session Tests
//!
//! The session state machine driven by a real pipeline, without the async
//! controller.


use fieldscan::capture::{CaptureError, PermissionStatus, RawImage};
use fieldscan::config::AppConfig;
use fieldscan::labels::PipelineKind;
use fieldscan::pipeline::build_analyzer;
use fieldscan::scan_errors::ScanError;
use fieldscan::session::{Completion, ScanSession, SessionState};
use test_helpers::*;

#[test]
fn test_start_capture_without_permission_stays_idle() {
    let mut session = ScanSession::new(PipelineKind::Disease);
    assert_eq!(
        session.start_capture(PermissionStatus::Denied),
        Err(ScanError::PermissionDenied)
    );

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(snapshot.generation, 0);
    assert!(snapshot.result.is_none());
    assert!(!snapshot.has_image);
}

#[test]
fn test_full_scan_reaches_result() {
    let analyzer = build_analyzer(PipelineKind::Disease, &AppConfig::default()).unwrap();
    let mut session = ScanSession::new(PipelineKind::Disease);

    session.start_capture(PermissionStatus::Granted).unwrap();
    let ticket = session.accept_capture(raw_png(&mildewed_leaf())).unwrap();
    let outcome = analyzer.analyze(ticket.image());
    assert_eq!(
        session.complete(ticket.generation(), outcome).unwrap(),
        Completion::Applied
    );

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, SessionState::Result);
    assert!(snapshot.failure.is_none());
    let result = snapshot.result.unwrap();
    assert_eq!(result.label, "powdery_mildew");
    assert_eq!(result.name, "Powdery Mildew");
}

#[test]
fn test_undecodable_capture_fails_with_reason() {
    let analyzer = build_analyzer(PipelineKind::Soil, &AppConfig::default()).unwrap();
    let mut session = ScanSession::new(PipelineKind::Soil);

    session.start_capture(PermissionStatus::Granted).unwrap();
    let ticket = session
        .accept_capture(RawImage::new(b"\x89PNG but not really".to_vec()))
        .unwrap();
    let outcome = analyzer.analyze(ticket.image());
    assert!(matches!(outcome, Err(ScanError::ImageDecode(_))));
    session.complete(ticket.generation(), outcome).unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, SessionState::Failed);
    assert!(snapshot.result.is_none());
    assert!(snapshot.failure.unwrap().starts_with("[IMAGE_DECODE]"));
    assert!(snapshot.has_image);
}

#[test]
fn test_new_scan_after_result_starts_fresh() {
    let analyzer = build_analyzer(PipelineKind::Soil, &AppConfig::default()).unwrap();
    let mut session = ScanSession::new(PipelineKind::Soil);
    session.start_capture(PermissionStatus::Granted).unwrap();

    let ticket = session.accept_capture(raw_png(&sandy_soil())).unwrap();
    session
        .complete(ticket.generation(), analyzer.analyze(ticket.image()))
        .unwrap();
    assert_eq!(session.state(), SessionState::Result);

    session.new_scan().unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, SessionState::AwaitingCapture);
    assert_eq!(snapshot.generation, 1);
    assert!(snapshot.result.is_none());
    assert!(!snapshot.has_image);

    // Second scan in the same session
    let ticket = session.accept_capture(raw_png(&clay_soil())).unwrap();
    assert_eq!(ticket.generation(), 1);
    session
        .complete(ticket.generation(), analyzer.analyze(ticket.image()))
        .unwrap();
    assert_eq!(session.result().unwrap().label, "clay");
}

#[test]
fn test_stale_completion_never_writes_result() {
    let analyzer = build_analyzer(PipelineKind::Disease, &AppConfig::default()).unwrap();
    let mut session = ScanSession::new(PipelineKind::Disease);
    session.start_capture(PermissionStatus::Granted).unwrap();

    let stale = session.accept_capture(raw_png(&spotted_leaf())).unwrap();
    session.new_scan().unwrap();
    let fresh = session.accept_capture(raw_png(&healthy_leaf())).unwrap();

    let stale_outcome = analyzer.analyze(stale.image());
    assert_eq!(
        session.complete(stale.generation(), stale_outcome).unwrap(),
        Completion::Discarded
    );
    assert_eq!(session.state(), SessionState::Analyzing);

    session
        .complete(fresh.generation(), analyzer.analyze(fresh.image()))
        .unwrap();
    assert_eq!(session.result().unwrap().label, "healthy");
}

#[test]
fn test_capture_error_surfaces_as_failed() {
    let mut session = ScanSession::new(PipelineKind::Disease);
    session.start_capture(PermissionStatus::Granted).unwrap();
    session
        .capture_failed(CaptureError::Hardware("sensor timeout".to_string()))
        .unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, SessionState::Failed);
    assert!(snapshot.failure.unwrap().contains("sensor timeout"));

    session.new_scan().unwrap();
    assert_eq!(session.state(), SessionState::AwaitingCapture);
}
