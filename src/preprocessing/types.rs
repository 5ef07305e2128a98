//! # Shared Types for Image Preprocessing
//!
//! This module contains the types produced by normalization and quality
//! assessment and consumed by feature extraction.

use image::{GrayImage, ImageFormat, RgbImage};
use serde::Serialize;

/// A captured photo normalized to the fixed square RGB8 shape feature
/// extractors expect.
#[derive(Debug, Clone)]
pub struct CanonicalImage {
    image: RgbImage,
    source_format: Option<ImageFormat>,
    original_dimensions: (u32, u32),
}

impl CanonicalImage {
    pub(crate) fn new(
        image: RgbImage,
        source_format: Option<ImageFormat>,
        original_dimensions: (u32, u32),
    ) -> Self {
        Self {
            image,
            source_format,
            original_dimensions,
        }
    }

    /// Normalized RGB pixels
    pub fn pixels(&self) -> &RgbImage {
        &self.image
    }

    /// Grayscale (Rec. 709 luma) copy of the pixels
    pub fn luma(&self) -> GrayImage {
        image::imageops::grayscale(&self.image)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Encoding detected from the raw bytes
    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    /// Width and height of the decoded capture before resizing
    pub fn original_dimensions(&self) -> (u32, u32) {
        self.original_dimensions
    }
}

/// Capture quality classifications.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    /// Well lit, contrasted and in focus
    High,
    /// Usable, results may be less reliable
    Medium,
    /// Dark, washed out or blurry; a retake is advisable
    Low,
}

/// Result of capture quality assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureQuality {
    /// Overall quality classification
    pub grade: QualityGrade,
    /// Contrast ratio (0.0-1.0, higher is better)
    pub contrast: f32,
    /// Brightness level (0.0-1.0, 0.5 is optimal)
    pub brightness: f32,
    /// Sharpness score (0.0-1.0, higher is sharper)
    pub sharpness: f32,
}
