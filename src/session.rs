//! # Scan Session Module
//!
//! The per-pipeline state machine that owns the captured image and the scan
//! result. Every trigger is checked against the current state; anything the
//! machine does not accept is rejected, logged and leaves the state untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::capture::{CaptureError, PermissionStatus, RawImage};
use crate::errors::error_logging;
use crate::labels::PipelineKind;
use crate::observability::{record_stale_result, record_transition};
use crate::pipeline::ScanOutcome;
use crate::scan_errors::ScanError;

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingCapture,
    Analyzing,
    Result,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingCapture => "awaiting_capture",
            SessionState::Analyzing => "analyzing",
            SessionState::Result => "result",
            SessionState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issued when a capture is accepted; identifies the analysis run it starts.
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    generation: u64,
    image: Arc<RawImage>,
}

impl AnalysisTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Read-only handle to the image the session owns
    pub fn image(&self) -> &Arc<RawImage> {
        &self.image
    }
}

/// What happened to a finished analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result was written to the session
    Applied,
    /// The session moved on since the run started; the result was dropped
    Discarded,
}

/// Read-only view of a session for the presenter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub pipeline: PipelineKind,
    pub state: SessionState,
    pub generation: u64,
    pub result: Option<ScanOutcome>,
    pub failure: Option<String>,
    pub has_image: bool,
    /// Capture time of the held image
    pub captured_at: Option<DateTime<Utc>>,
    pub permission: Option<PermissionStatus>,
}

/// Scan session state machine.
///
/// ```text
/// Idle ──start_capture(granted)──► AwaitingCapture ──accept_capture──► Analyzing
///                                        │                               │
///                                  capture_failed                    complete
///                                        │                          ┌────┴────┐
///                                        ▼                          ▼         ▼
///                                     Failed ◄──────────────────  Failed    Result
///
/// Result | Failed | Analyzing ──new_scan──► AwaitingCapture (generation + 1)
/// ```
///
/// A completion whose generation is older than the session's is discarded, so
/// a scan restarted mid-analysis never shows the abandoned result. While
/// AwaitingCapture, at most one capture may be reserved at a time.
#[derive(Debug)]
pub struct ScanSession {
    pipeline: PipelineKind,
    state: SessionState,
    generation: u64,
    image: Option<Arc<RawImage>>,
    result: Option<ScanOutcome>,
    failure: Option<ScanError>,
    permission: Option<PermissionStatus>,
    capture_in_flight: bool,
}

impl ScanSession {
    pub fn new(pipeline: PipelineKind) -> Self {
        Self {
            pipeline,
            state: SessionState::Idle,
            generation: 0,
            image: None,
            result: None,
            failure: None,
            permission: None,
            capture_in_flight: false,
        }
    }

    pub fn pipeline(&self) -> PipelineKind {
        self.pipeline
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Present only in `Result`
    pub fn result(&self) -> Option<&ScanOutcome> {
        self.result.as_ref()
    }

    /// Present only in `Failed`
    pub fn failure(&self) -> Option<&ScanError> {
        self.failure.as_ref()
    }

    /// Held from capture until the next `new_scan`
    pub fn image(&self) -> Option<&Arc<RawImage>> {
        self.image.as_ref()
    }

    /// A reserved capture has not delivered yet
    pub fn is_capturing(&self) -> bool {
        self.capture_in_flight
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        record_transition(from.as_str(), to.as_str());
        info!(
            pipeline = %self.pipeline,
            generation = self.generation,
            from = %from,
            to = %to,
            "Session transition"
        );
        self.state = to;
    }

    fn reject(&self, trigger: &'static str) -> ScanError {
        let error = ScanError::InvalidTransition {
            from: self.state.as_str(),
            trigger,
        };
        error_logging::log_rejected_transition(&error, self.pipeline, self.generation);
        error
    }

    /// Claim the camera for one capture before it fires.
    ///
    /// Returns the generation the capture belongs to. The reservation ends
    /// with `accept_capture`, `capture_failed` or `release_capture`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside AwaitingCapture or while another capture
    /// is reserved.
    pub fn reserve_capture(&mut self) -> Result<u64, ScanError> {
        if self.state != SessionState::AwaitingCapture || self.capture_in_flight {
            return Err(self.reject("capture"));
        }
        self.capture_in_flight = true;
        debug!(pipeline = %self.pipeline, generation = self.generation, "Capture reserved");
        Ok(self.generation)
    }

    /// Drop a reservation whose capture never reported back
    pub fn release_capture(&mut self) {
        if self.capture_in_flight {
            debug!(pipeline = %self.pipeline, generation = self.generation, "Capture reservation released");
            self.capture_in_flight = false;
        }
    }

    /// Idle → AwaitingCapture when permission is granted.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` if permission is not granted (the session stays
    /// Idle), `InvalidTransition` outside Idle.
    pub fn start_capture(&mut self, permission: PermissionStatus) -> Result<(), ScanError> {
        if self.state != SessionState::Idle {
            return Err(self.reject("start_capture"));
        }
        self.permission = Some(permission);
        if !permission.is_granted() {
            info!(pipeline = %self.pipeline, "Capture not started, camera permission denied");
            return Err(ScanError::PermissionDenied);
        }
        self.transition(SessionState::AwaitingCapture);
        Ok(())
    }

    /// AwaitingCapture → Analyzing; the session takes ownership of the image.
    pub fn accept_capture(&mut self, image: RawImage) -> Result<AnalysisTicket, ScanError> {
        if self.state != SessionState::AwaitingCapture {
            return Err(self.reject("accept_capture"));
        }
        self.capture_in_flight = false;
        debug!(
            pipeline = %self.pipeline,
            bytes = image.len(),
            source = ?image.source(),
            "Capture accepted"
        );
        let image = Arc::new(image);
        self.image = Some(Arc::clone(&image));
        self.transition(SessionState::Analyzing);
        Ok(AnalysisTicket {
            generation: self.generation,
            image,
        })
    }

    /// AwaitingCapture → Analyzing → Failed for a device-side capture error.
    pub fn capture_failed(&mut self, error: CaptureError) -> Result<(), ScanError> {
        if self.state != SessionState::AwaitingCapture {
            return Err(self.reject("capture_failed"));
        }
        self.capture_in_flight = false;
        error_logging::log_capture_error(&error, "capture", None);
        self.transition(SessionState::Analyzing);
        self.failure = Some(ScanError::Capture(error));
        self.transition(SessionState::Failed);
        Ok(())
    }

    /// Analyzing → Result or Failed for the run identified by `generation`.
    ///
    /// A stale generation is discarded without touching the session.
    pub fn complete(
        &mut self,
        generation: u64,
        outcome: Result<ScanOutcome, ScanError>,
    ) -> Result<Completion, ScanError> {
        if generation != self.generation {
            record_stale_result(self.pipeline);
            debug!(
                pipeline = %self.pipeline,
                stale_generation = generation,
                generation = self.generation,
                "Discarding result of an abandoned analysis"
            );
            return Ok(Completion::Discarded);
        }
        if self.state != SessionState::Analyzing {
            return Err(self.reject("complete"));
        }

        match outcome {
            Ok(outcome) => {
                self.result = Some(outcome);
                self.transition(SessionState::Result);
            }
            Err(error) => {
                error_logging::log_scan_error(&error, self.pipeline, "analyze", Some(generation));
                // Image stays for diagnostic display
                self.failure = Some(error);
                self.transition(SessionState::Failed);
            }
        }
        Ok(Completion::Applied)
    }

    /// Result | Failed | Analyzing → AwaitingCapture, releasing the image.
    pub fn new_scan(&mut self) -> Result<(), ScanError> {
        match self.state {
            SessionState::Result | SessionState::Failed | SessionState::Analyzing => {
                self.result = None;
                self.failure = None;
                self.image = None;
                self.generation += 1;
                self.transition(SessionState::AwaitingCapture);
                Ok(())
            }
            SessionState::Idle | SessionState::AwaitingCapture => Err(self.reject("new_scan")),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            pipeline: self.pipeline,
            state: self.state,
            generation: self.generation,
            result: self.result.clone(),
            failure: self.failure.as_ref().map(ToString::to_string),
            has_image: self.image.is_some(),
            captured_at: self.image.as_ref().map(|image| image.captured_at()),
            permission: self.permission,
        }
    }
}
