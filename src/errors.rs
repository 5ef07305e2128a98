//! # Application Error Types
//!
//! This module defines common error types used throughout the FieldScan application.
//! It provides structured error handling for the components around the scan pipeline.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::{error, warn};

    /// Log a failed scan stage with pipeline and session context
    pub fn log_scan_error(
        error: &crate::scan_errors::ScanError,
        pipeline: crate::labels::PipelineKind,
        stage: &str,
        generation: Option<u64>,
    ) {
        error!(
            error = %error,
            error_code = error.code(),
            pipeline = %pipeline,
            stage = %stage,
            generation = ?generation,
            recoverable = error.is_user_recoverable(),
            "Scan stage failed"
        );
    }

    /// Log capture device errors with the device context
    pub fn log_capture_error(
        error: &impl std::fmt::Display,
        operation: &str,
        source: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            source = ?source,
            "Capture device operation failed"
        );
    }

    /// Log a trigger the session state machine refused
    pub fn log_rejected_transition(
        error: &impl std::fmt::Display,
        pipeline: crate::labels::PipelineKind,
        generation: u64,
    ) {
        warn!(
            error = %error,
            pipeline = %pipeline,
            generation = generation,
            "Session transition rejected"
        );
    }
}
