//! # Image Preprocessing Module
//!
//! Prepares captured photos for feature extraction.
//!
//! The module is organized into focused sub-modules:
//! - `normalize`: Format checks, decoding and resizing to the canonical square
//! - `quality`: Capture quality assessment (contrast, brightness, sharpness)
//! - `types`: Shared types

pub mod normalize;
pub mod quality;
pub mod types;

// Re-export commonly used types and functions for convenience
pub use normalize::Preprocessor;
pub use quality::assess_capture_quality;
pub use types::{CanonicalImage, CaptureQuality, QualityGrade};
