//! # Capture Device Boundary
//!
//! The camera (or any other image source) sits outside the core. It answers
//! permission requests and delivers raw images through a two-step protocol:
//! `capture()` returns a [`CaptureHandle`] right away and the image arrives on
//! it later, so the scan session performs its own state transition when the
//! handle resolves instead of being driven from device callbacks.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::errors::error_logging;

/// Outcome of a camera permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Device-level capture failures
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// The camera is in use by another operation
    DeviceBusy,
    /// The camera reported a hardware fault
    Hardware(String),
    /// The image source could not be read
    Io(String),
    /// The device dropped the capture without answering
    Disconnected,
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::DeviceBusy => write!(f, "capture device is busy"),
            CaptureError::Hardware(msg) => write!(f, "hardware failure: {}", msg),
            CaptureError::Io(msg) => write!(f, "image source unreadable: {}", msg),
            CaptureError::Disconnected => write!(f, "capture device disconnected"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Encoded image bytes exactly as the device produced them
#[derive(Debug, Clone)]
pub struct RawImage {
    bytes: Vec<u8>,
    source: Option<String>,
    captured_at: DateTime<Utc>,
}

impl RawImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            source: None,
            captured_at: Utc::now(),
        }
    }

    /// Attach a human-readable origin (file name, camera id)
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

/// Sending half of a pending capture, held by the device
#[derive(Debug)]
pub struct CaptureCompleter {
    tx: oneshot::Sender<Result<RawImage, CaptureError>>,
}

impl CaptureCompleter {
    /// Deliver the capture outcome; a no-op if the handle was dropped
    pub fn complete(self, outcome: Result<RawImage, CaptureError>) {
        if self.tx.send(outcome).is_err() {
            debug!("Capture completed after its handle was dropped");
        }
    }
}

/// Pending capture returned by [`CaptureDevice::capture`]
#[derive(Debug)]
pub struct CaptureHandle {
    rx: oneshot::Receiver<Result<RawImage, CaptureError>>,
}

impl CaptureHandle {
    /// Create a connected completer/handle pair
    pub fn channel() -> (CaptureCompleter, CaptureHandle) {
        let (tx, rx) = oneshot::channel();
        (CaptureCompleter { tx }, CaptureHandle { rx })
    }

    /// A handle that is already resolved
    pub fn ready(outcome: Result<RawImage, CaptureError>) -> Self {
        let (completer, handle) = Self::channel();
        completer.complete(outcome);
        handle
    }

    /// Wait for the device to deliver the image
    pub async fn wait(self) -> Result<RawImage, CaptureError> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(CaptureError::Disconnected),
        }
    }
}

/// Image source consumed by the scan controller
pub trait CaptureDevice: Send + Sync {
    /// Ask for (or report) camera permission
    fn request_permission(&self) -> PermissionStatus;

    /// Start a capture; the image is delivered on the returned handle
    fn capture(&self) -> CaptureHandle;
}

/// Capture device that "photographs" image files from a queue of paths.
///
/// Files are read on the tokio runtime, so `capture` must be called from
/// within one.
#[derive(Debug)]
pub struct FileCaptureDevice {
    queue: Mutex<VecDeque<PathBuf>>,
    permission: PermissionStatus,
}

impl FileCaptureDevice {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            queue: Mutex::new(paths.into_iter().collect()),
            permission: PermissionStatus::Granted,
        }
    }

    /// Override the permission answer
    pub fn with_permission(mut self, permission: PermissionStatus) -> Self {
        self.permission = permission;
        self
    }

    /// Number of images still waiting to be captured
    pub fn remaining(&self) -> usize {
        self.queue.lock().len()
    }
}

impl CaptureDevice for FileCaptureDevice {
    fn request_permission(&self) -> PermissionStatus {
        info!(permission = ?self.permission, "Camera permission requested");
        self.permission
    }

    fn capture(&self) -> CaptureHandle {
        let Some(path) = self.queue.lock().pop_front() else {
            return CaptureHandle::ready(Err(CaptureError::Io(
                "no more images queued".to_string(),
            )));
        };

        let (completer, handle) = CaptureHandle::channel();
        tokio::spawn(async move {
            let source = path.display().to_string();
            let outcome = match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    debug!(path = %source, bytes = bytes.len(), "Image file captured");
                    Ok(RawImage::new(bytes).with_source(source))
                }
                Err(e) => {
                    error_logging::log_capture_error(&e, "read_image_file", Some(&source));
                    Err(CaptureError::Io(format!("{}: {}", source, e)))
                }
            };
            completer.complete(outcome);
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_handle_resolves_immediately() {
        let handle = CaptureHandle::ready(Ok(RawImage::new(vec![1, 2, 3])));
        let image = handle.wait().await.unwrap();
        assert_eq!(image.bytes(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_dropped_completer_reports_disconnect() {
        let (completer, handle) = CaptureHandle::channel();
        drop(completer);
        assert_eq!(handle.wait().await.unwrap_err(), CaptureError::Disconnected);
    }

    #[tokio::test]
    async fn test_file_device_reads_queued_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.bin");
        let second = dir.path().join("second.bin");
        std::fs::write(&first, b"one").unwrap();
        std::fs::write(&second, b"two").unwrap();

        let device = FileCaptureDevice::new(vec![first, second]);
        assert_eq!(device.remaining(), 2);
        assert_eq!(device.capture().wait().await.unwrap().bytes(), b"one");
        assert_eq!(device.capture().wait().await.unwrap().bytes(), b"two");
        assert!(matches!(
            device.capture().wait().await,
            Err(CaptureError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_file_device_missing_file_is_io_error() {
        let device = FileCaptureDevice::new(vec![PathBuf::from("/nonexistent/leaf.png")]);
        assert!(matches!(
            device.capture().wait().await,
            Err(CaptureError::Io(msg)) if msg.contains("leaf.png")
        ));
    }

    #[test]
    fn test_permission_override() {
        let device = FileCaptureDevice::new(Vec::new()).with_permission(PermissionStatus::Denied);
        assert_eq!(device.request_permission(), PermissionStatus::Denied);
        assert!(!device.request_permission().is_granted());
    }
}
