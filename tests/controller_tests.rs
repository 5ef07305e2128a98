//! # Controller Tests
//!
//! Async scan flow through the controller with file-backed captures.


use fieldscan::capture::{FileCaptureDevice, PermissionStatus};
use fieldscan::config::AppConfig;
use fieldscan::controller::ScanController;
use fieldscan::labels::PipelineKind;
use fieldscan::pipeline::build_analyzer;
use fieldscan::scan_errors::ScanError;
use fieldscan::session::{Completion, SessionState};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use test_helpers::*;

fn controller(
    kind: PipelineKind,
    paths: Vec<PathBuf>,
    permission: PermissionStatus,
) -> ScanController<FileCaptureDevice> {
    let device = Arc::new(FileCaptureDevice::new(paths).with_permission(permission));
    let analyzer = build_analyzer(kind, &AppConfig::default()).unwrap();
    ScanController::new(device, analyzer)
}

#[tokio::test]
async fn test_capture_to_result() {
    let dir = TempDir::new().unwrap();
    let path = write_png(dir.path(), "leaf.png", &spotted_leaf());
    let controller = controller(PipelineKind::Disease, vec![path], PermissionStatus::Granted);

    controller.start_capture().unwrap();
    assert_eq!(controller.capture().await.unwrap(), Completion::Applied);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, SessionState::Result);
    let result = snapshot.result.unwrap();
    assert_eq!(result.label, "leaf_spots");
    assert_eq!(result.name, "Leaf Spot Disease");
    assert!(controller.captured_image().unwrap().source().unwrap().ends_with("leaf.png"));
}

#[tokio::test]
async fn test_permission_denied_keeps_session_idle() {
    let controller = controller(PipelineKind::Soil, Vec::new(), PermissionStatus::Denied);

    assert_eq!(controller.start_capture(), Err(ScanError::PermissionDenied));
    assert_eq!(controller.snapshot().state, SessionState::Idle);
    assert_eq!(controller.snapshot().permission, Some(PermissionStatus::Denied));

    // Capturing without an open camera is a contract violation
    let err = controller.capture().await.unwrap_err();
    assert!(matches!(err, ScanError::InvalidTransition { from: "idle", .. }));
}

#[tokio::test]
async fn test_missing_file_fails_the_scan() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nowhere.png");
    let controller = controller(PipelineKind::Soil, vec![missing], PermissionStatus::Granted);

    controller.start_capture().unwrap();
    let err = controller.capture().await.unwrap_err();
    assert!(matches!(err, ScanError::Capture(_)));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, SessionState::Failed);
    assert!(snapshot.failure.unwrap().starts_with("[CAPTURE]"));
}

#[tokio::test]
async fn test_corrupt_file_fails_with_decode_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corrupt.jpg");
    std::fs::write(&path, b"\xFF\xD8\xFF\xE0 truncated jpeg").unwrap();
    let controller = controller(PipelineKind::Disease, vec![path], PermissionStatus::Granted);

    controller.start_capture().unwrap();
    assert_eq!(controller.capture().await.unwrap(), Completion::Applied);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, SessionState::Failed);
    assert!(snapshot.result.is_none());
    assert!(snapshot.failure.unwrap().starts_with("[IMAGE_DECODE]"));
    assert!(snapshot.has_image);
}

#[tokio::test]
async fn test_new_scan_during_analysis_discards_result() {
    let dir = TempDir::new().unwrap();
    let first = write_png(dir.path(), "first.png", &mildewed_leaf());
    let second = write_png(dir.path(), "second.png", &healthy_leaf());

    let device = Arc::new(FileCaptureDevice::new(vec![first, second]));
    let inner = build_analyzer(PipelineKind::Disease, &AppConfig::default()).unwrap();
    let (gated, gate) = GatedAnalyzer::new(inner);
    let controller = ScanController::new(device, Arc::new(gated));

    controller.start_capture().unwrap();
    let run = controller.begin_capture().await.unwrap();
    assert_eq!(run.generation(), 0);
    assert_eq!(controller.snapshot().state, SessionState::Analyzing);

    controller.new_scan().unwrap();
    assert_eq!(controller.snapshot().state, SessionState::AwaitingCapture);
    assert_eq!(controller.snapshot().generation, 1);

    gate.send(()).unwrap();
    assert_eq!(run.finish().await.unwrap(), Completion::Discarded);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, SessionState::AwaitingCapture);
    assert!(snapshot.result.is_none());

    // The next capture runs normally
    gate.send(()).unwrap();
    assert_eq!(controller.capture().await.unwrap(), Completion::Applied);
    assert_eq!(controller.snapshot().result.unwrap().label, "healthy");
}

#[tokio::test]
async fn test_snapshots_are_published() {
    let dir = TempDir::new().unwrap();
    let path = write_png(dir.path(), "soil.png", &sandy_soil());
    let controller = controller(PipelineKind::Soil, vec![path], PermissionStatus::Granted);
    let mut snapshots = controller.subscribe();

    controller.start_capture().unwrap();
    assert!(snapshots.has_changed().unwrap());
    assert_eq!(
        snapshots.borrow_and_update().state,
        SessionState::AwaitingCapture
    );

    controller.capture().await.unwrap();
    assert!(snapshots.has_changed().unwrap());
    let latest = snapshots.borrow_and_update().clone();
    assert_eq!(latest.state, SessionState::Result);
    assert_eq!(latest.result.unwrap().label, "sandy");

    controller.new_scan().unwrap();
    assert_eq!(
        snapshots.borrow_and_update().state,
        SessionState::AwaitingCapture
    );
}

#[tokio::test]
async fn test_new_scan_rejected_while_awaiting_capture() {
    let controller = controller(PipelineKind::Disease, Vec::new(), PermissionStatus::Granted);
    controller.start_capture().unwrap();

    let err = controller.new_scan().unwrap_err();
    assert_eq!(
        err,
        ScanError::InvalidTransition {
            from: "awaiting_capture",
            trigger: "new_scan"
        }
    );
    assert_eq!(controller.snapshot().state, SessionState::AwaitingCapture);
}

#[tokio::test]
async fn test_overlapping_captures_fire_the_camera_once() {
    let dir = TempDir::new().unwrap();
    let first = write_png(dir.path(), "first.png", &spotted_leaf());
    let second = write_png(dir.path(), "second.png", &healthy_leaf());
    let device = Arc::new(FileCaptureDevice::new(vec![first, second]));
    let analyzer = build_analyzer(PipelineKind::Disease, &AppConfig::default()).unwrap();
    let controller = ScanController::new(Arc::clone(&device), analyzer);
    controller.start_capture().unwrap();

    let (a, b) = tokio::join!(controller.begin_capture(), controller.begin_capture());
    let (run, rejected) = match (a, b) {
        (Ok(run), Err(err)) | (Err(err), Ok(run)) => (run, err),
        (a, b) => panic!("expected exactly one accepted capture, got {:?} and {:?}", a, b),
    };
    assert_eq!(
        rejected,
        ScanError::InvalidTransition {
            from: "awaiting_capture",
            trigger: "capture"
        }
    );
    assert_eq!(device.remaining(), 1);

    assert_eq!(run.finish().await.unwrap(), Completion::Applied);
    assert_eq!(controller.snapshot().result.unwrap().label, "leaf_spots");
}

#[tokio::test]
async fn test_cancelled_capture_releases_the_camera() {
    let dir = TempDir::new().unwrap();
    let abandoned = write_png(dir.path(), "abandoned.png", &sandy_soil());
    let kept = write_png(dir.path(), "kept.png", &clay_soil());
    let controller = controller(PipelineKind::Soil, vec![abandoned, kept], PermissionStatus::Granted);
    controller.start_capture().unwrap();

    // Poll the capture once, then abandon it while the device is still reading
    tokio::select! {
        biased;
        _ = controller.begin_capture() => panic!("capture finished before the device answered"),
        _ = std::future::ready(()) => {}
    }
    assert_eq!(controller.snapshot().state, SessionState::AwaitingCapture);

    assert_eq!(controller.capture().await.unwrap(), Completion::Applied);
    assert_eq!(controller.snapshot().result.unwrap().label, "clay");
}

#[tokio::test]
async fn test_snapshots_carry_capture_time_in_order() {
    let dir = TempDir::new().unwrap();
    let first = write_png(dir.path(), "first.png", &sandy_soil());
    let second = write_png(dir.path(), "second.png", &clay_soil());
    let controller = controller(PipelineKind::Soil, vec![first, second], PermissionStatus::Granted);
    assert!(controller.snapshot().captured_at.is_none());

    controller.start_capture().unwrap();
    controller.capture().await.unwrap();
    let first = controller.snapshot();
    let first_at = first.captured_at.unwrap();
    assert_eq!(first.result.unwrap().captured_at, first_at);

    controller.new_scan().unwrap();
    controller.capture().await.unwrap();
    let second_at = controller.snapshot().captured_at.unwrap();
    assert!(second_at >= first_at);
}
