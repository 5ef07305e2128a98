//! # Capture Quality Assessment Module
//!
//! Grades a canonical capture by contrast, brightness and sharpness so callers
//! can suggest a retake. The grade is advisory: classification runs regardless.

use super::types::{CanonicalImage, CaptureQuality, QualityGrade};
use crate::features::stats;

/// Assesses the quality of a canonical capture.
///
/// # Examples
///
/// ```no_run
/// use fieldscan::capture::RawImage;
/// use fieldscan::preprocessing::{assess_capture_quality, Preprocessor, QualityGrade};
///
/// # fn example(raw: RawImage) -> Result<(), fieldscan::scan_errors::ScanError> {
/// let canonical = Preprocessor::default().normalize(&raw)?;
/// match assess_capture_quality(&canonical).grade {
///     QualityGrade::High => println!("Good capture"),
///     QualityGrade::Medium => println!("Usable capture"),
///     QualityGrade::Low => println!("Consider retaking the photo"),
/// }
/// # Ok(())
/// # }
/// ```
pub fn assess_capture_quality(image: &CanonicalImage) -> CaptureQuality {
    let start_time = std::time::Instant::now();
    let gray = image.luma();

    let contrast = stats::contrast_range(&gray);
    let brightness = stats::mean_luma(&gray);
    let sharpness = stats::laplacian_variance(&gray);
    let grade = classify_quality(contrast, brightness, sharpness);

    tracing::debug!(
        "Quality assessment completed in {}ms: grade={:?}, contrast={:.3}, brightness={:.3}, sharpness={:.3}",
        start_time.elapsed().as_millis(),
        grade,
        contrast,
        brightness,
        sharpness
    );

    CaptureQuality {
        grade,
        contrast,
        brightness,
        sharpness,
    }
}

/// Weighted combination of the metrics; contrast and sharpness dominate.
fn classify_quality(contrast: f32, brightness: f32, sharpness: f32) -> QualityGrade {
    let brightness_score = 1.0 - (brightness - 0.5).abs() * 2.0; // Closer to 0.5 is better
    let score = (contrast * 0.4) + (brightness_score * 0.2) + (sharpness * 0.4);

    if score >= 0.7 {
        QualityGrade::High
    } else if score >= 0.4 {
        QualityGrade::Medium
    } else {
        QualityGrade::Low
    }
}
