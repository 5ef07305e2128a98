//! # Image Normalization Module
//!
//! Turns the raw bytes delivered by a capture device into a [`CanonicalImage`]:
//! format detection and size limits, decoding, then an exact resize to the
//! canonical square in RGB8.

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use super::types::CanonicalImage;
use crate::capture::RawImage;
use crate::capture_config::CaptureConfig;
use crate::scan_errors::ScanError;

/// Normalizes raw captures for feature extraction.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: CaptureConfig,
}

impl Preprocessor {
    /// Build a preprocessor from a capture configuration.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Config` if the configuration does not validate,
    /// including a canonical size other than 224.
    pub fn new(config: CaptureConfig) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Normalizes a raw image into the canonical shape.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::ImageDecode` if the image is empty, exceeds the
    /// byte limit for its format, cannot be decoded, or decodes to an empty
    /// raster. The failure is final for this capture.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldscan::capture::RawImage;
    /// use fieldscan::preprocessing::Preprocessor;
    ///
    /// let preprocessor = Preprocessor::default();
    /// let result = preprocessor.normalize(&RawImage::new(b"not an image".to_vec()));
    /// assert!(result.is_err());
    /// ```
    pub fn normalize(&self, raw: &RawImage) -> Result<CanonicalImage, ScanError> {
        let start_time = std::time::Instant::now();

        if raw.is_empty() {
            return Err(ScanError::ImageDecode("image is empty".to_string()));
        }

        // Unknown formats fall through to the decoder, which rejects them
        let format = image::guess_format(raw.bytes()).ok();
        let byte_limit = self.config.byte_limit(format);
        let size = raw.len() as u64;
        if size > byte_limit {
            return Err(ScanError::ImageDecode(format!(
                "image too large for {:?} format: {} bytes (maximum allowed: {} bytes)",
                format, size, byte_limit
            )));
        }

        let decoded = image::load_from_memory(raw.bytes())?;
        let original_dimensions = decoded.dimensions();
        if original_dimensions.0 == 0 || original_dimensions.1 == 0 {
            return Err(ScanError::ImageDecode(format!(
                "decoded image has no pixels ({}x{})",
                original_dimensions.0, original_dimensions.1
            )));
        }

        let canonical = self.resize(&decoded);

        debug!(
            "Normalization completed in {}ms: {}x{} {:?} -> {}x{}",
            start_time.elapsed().as_millis(),
            original_dimensions.0,
            original_dimensions.1,
            format,
            self.config.canonical_size,
            self.config.canonical_size
        );
        if original_dimensions.0 < self.config.canonical_size
            || original_dimensions.1 < self.config.canonical_size
        {
            info!(
                source = ?raw.source(),
                width = original_dimensions.0,
                height = original_dimensions.1,
                "Capture is smaller than the canonical size and was upscaled"
            );
        }

        Ok(CanonicalImage::new(canonical, format, original_dimensions))
    }

    fn resize(&self, image: &DynamicImage) -> image::RgbImage {
        let size = self.config.canonical_size;
        // Catmull-Rom keeps lesion edges crisp when downscaling camera photos
        image
            .resize_exact(size, size, image::imageops::FilterType::CatmullRom)
            .to_rgb8()
    }
}
