//! # Scan Error Types Module
//!
//! This module defines the error taxonomy of the capture-to-advisory pipeline.
//! Device and data errors end a scan in the `Failed` state, integrity and
//! configuration errors stop the pipeline from being built at all.

use crate::capture::CaptureError;

/// Custom error types for scan operations
#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    /// Camera permission was not granted; recoverable by re-requesting it
    PermissionDenied,
    /// The capture device failed to deliver an image
    Capture(CaptureError),
    /// The captured image is empty, too large or cannot be decoded
    ImageDecode(String),
    /// A declared label has no (or a malformed) advisory record
    KnowledgeBaseIntegrity(String),
    /// A trigger arrived in a state that does not accept it
    InvalidTransition {
        from: &'static str,
        trigger: &'static str,
    },
    /// A feature vector does not match the layout it was built for
    FeatureShape { expected: usize, actual: usize },
    /// Invalid classifier or pipeline configuration
    Config(String),
    /// The analysis job stopped without producing an outcome
    Internal(String),
}

impl ScanError {
    /// Short stable code used in logs and metrics labels
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::PermissionDenied => "permission_denied",
            ScanError::Capture(_) => "capture",
            ScanError::ImageDecode(_) => "image_decode",
            ScanError::KnowledgeBaseIntegrity(_) => "knowledge_base_integrity",
            ScanError::InvalidTransition { .. } => "invalid_transition",
            ScanError::FeatureShape { .. } => "feature_shape",
            ScanError::Config(_) => "config",
            ScanError::Internal(_) => "internal",
        }
    }

    /// Whether a fresh scan can recover from this error
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::PermissionDenied | ScanError::Capture(_) | ScanError::ImageDecode(_)
        )
    }
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::PermissionDenied => write!(f, "[PERMISSION] Camera permission was denied"),
            ScanError::Capture(err) => write!(f, "[CAPTURE] Image capture failed: {}", err),
            ScanError::ImageDecode(msg) => write!(f, "[IMAGE_DECODE] Captured image could not be decoded: {}", msg),
            ScanError::KnowledgeBaseIntegrity(msg) => write!(f, "[KB_INTEGRITY] Knowledge base is incomplete: {}", msg),
            ScanError::InvalidTransition { from, trigger } => {
                write!(f, "[SESSION] '{}' is not accepted while the session is {}", trigger, from)
            }
            ScanError::FeatureShape { expected, actual } => {
                write!(f, "[FEATURES] Expected {} feature values, got {}", expected, actual)
            }
            ScanError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            ScanError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<CaptureError> for ScanError {
    fn from(err: CaptureError) -> Self {
        ScanError::Capture(err)
    }
}

impl From<crate::errors::AppError> for ScanError {
    fn from(err: crate::errors::AppError) -> Self {
        match err {
            crate::errors::AppError::Config(msg) => ScanError::Config(msg),
        }
    }
}

impl From<image::ImageError> for ScanError {
    fn from(err: image::ImageError) -> Self {
        ScanError::ImageDecode(err.to_string())
    }
}
