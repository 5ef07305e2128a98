//! # Scan Controller Module
//!
//! Async driver wiring a capture device, an analyzer and a scan session.
//! Commands lock the session only for synchronous transitions; analysis runs
//! on the blocking pool and reports back through the session's generation
//! check. Every accepted change is published on a watch channel.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::capture::{CaptureDevice, RawImage};
use crate::labels::PipelineKind;
use crate::observability::session_span;
use crate::pipeline::{Analyzer, ScanOutcome};
use crate::scan_errors::ScanError;
use crate::session::{Completion, ScanSession, SessionSnapshot};

/// Drives one scan session for one pipeline.
pub struct ScanController<D: CaptureDevice + 'static> {
    device: Arc<D>,
    analyzer: Arc<dyn Analyzer>,
    session: Arc<Mutex<ScanSession>>,
    snapshots: Arc<watch::Sender<SessionSnapshot>>,
}

impl<D: CaptureDevice + 'static> Clone for ScanController<D> {
    fn clone(&self) -> Self {
        Self {
            device: Arc::clone(&self.device),
            analyzer: Arc::clone(&self.analyzer),
            session: Arc::clone(&self.session),
            snapshots: Arc::clone(&self.snapshots),
        }
    }
}

/// An analysis running in the background
#[derive(Debug)]
pub struct AnalysisRun {
    generation: u64,
    task: JoinHandle<Result<Completion, ScanError>>,
}

impl AnalysisRun {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the run to finish and report whether its result was applied.
    pub async fn finish(self) -> Result<Completion, ScanError> {
        self.task
            .await
            .map_err(|e| ScanError::Internal(format!("analysis task failed: {}", e)))?
    }
}

/// Releases a capture reservation if the capture future is dropped before the
/// device answers.
struct CaptureReservation<'a> {
    session: &'a Mutex<ScanSession>,
    armed: bool,
}

impl Drop for CaptureReservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.lock().release_capture();
        }
    }
}

fn apply_completion(
    session: &Mutex<ScanSession>,
    snapshots: &watch::Sender<SessionSnapshot>,
    generation: u64,
    outcome: Result<ScanOutcome, ScanError>,
) -> Result<Completion, ScanError> {
    let mut session = session.lock();
    let completion = session.complete(generation, outcome)?;
    if completion == Completion::Applied {
        snapshots.send_replace(session.snapshot());
    }
    Ok(completion)
}

impl<D: CaptureDevice + 'static> ScanController<D> {
    pub fn new(device: Arc<D>, analyzer: Arc<dyn Analyzer>) -> Self {
        let session = ScanSession::new(analyzer.kind());
        let (snapshots, _) = watch::channel(session.snapshot());
        Self {
            device,
            analyzer,
            session: Arc::new(Mutex::new(session)),
            snapshots: Arc::new(snapshots),
        }
    }

    pub fn pipeline(&self) -> PipelineKind {
        self.analyzer.kind()
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    /// Raw image held by the session, for preview
    pub fn captured_image(&self) -> Option<Arc<RawImage>> {
        self.session.lock().image().cloned()
    }

    fn publish(&self, session: &ScanSession) {
        self.snapshots.send_replace(session.snapshot());
    }

    /// Ask the device for permission and open the camera.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` leaves the session Idle; `InvalidTransition` if the
    /// session is not Idle.
    pub fn start_capture(&self) -> Result<(), ScanError> {
        let permission = self.device.request_permission();
        let mut session = self.session.lock();
        let _span = session_span(self.pipeline(), "start_capture", session.generation()).entered();
        let result = session.start_capture(permission);
        // Permission is recorded even when denied
        self.publish(&session);
        result
    }

    /// Take a photo and start analyzing it in the background.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless AwaitingCapture, or while another capture
    /// is still waiting on the device; the camera is not fired in that case.
    /// A device failure moves the session to Failed and is returned as
    /// `ScanError::Capture`.
    pub async fn begin_capture(&self) -> Result<AnalysisRun, ScanError> {
        let generation = self.session.lock().reserve_capture()?;
        let mut reservation = CaptureReservation {
            session: &self.session,
            armed: true,
        };

        let captured = self
            .device
            .capture()
            .wait()
            .instrument(session_span(self.pipeline(), "capture", generation))
            .await;

        let ticket = {
            let mut session = self.session.lock();
            // Both outcomes below end the reservation
            reservation.armed = false;
            let ticket = match captured {
                Ok(image) => session.accept_capture(image),
                Err(error) => session
                    .capture_failed(error.clone())
                    .and(Err(ScanError::Capture(error))),
            };
            self.publish(&session);
            ticket?
        };

        let analyzer = Arc::clone(&self.analyzer);
        let session = Arc::clone(&self.session);
        let snapshots = Arc::clone(&self.snapshots);
        let generation = ticket.generation();
        let image = Arc::clone(ticket.image());
        let span = session_span(self.pipeline(), "analyze", generation);

        let task = tokio::spawn(
            async move {
                let outcome = match tokio::task::spawn_blocking(move || analyzer.analyze(&image)).await {
                    Ok(outcome) => outcome,
                    Err(e) => Err(ScanError::Internal(format!("analysis panicked: {}", e))),
                };
                apply_completion(&session, &snapshots, generation, outcome)
            }
            .instrument(span),
        );

        Ok(AnalysisRun { generation, task })
    }

    /// Take a photo and wait for its analysis.
    pub async fn capture(&self) -> Result<Completion, ScanError> {
        self.begin_capture().await?.finish().await
    }

    /// Discard the current result, failure or in-flight analysis and open the
    /// camera again.
    pub fn new_scan(&self) -> Result<(), ScanError> {
        let mut session = self.session.lock();
        let _span = session_span(self.pipeline(), "new_scan", session.generation()).entered();
        session.new_scan()?;
        self.publish(&session);
        Ok(())
    }
}
