//! # Capture Configuration Module
//!
//! This module defines configuration structures for image capture and
//! normalization, including format-specific size limits.

// Constants for capture configuration
pub const CANONICAL_SIZE: u32 = 224;
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024; // 10MB limit for captured photos

/// Format-specific byte limits for different image formats
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSizeLimits {
    /// PNG format limit (higher due to lossless compression)
    pub png_max: u64,
    /// JPEG format limit (camera default)
    pub jpeg_max: u64,
    /// BMP format limit (lower due to uncompressed nature)
    pub bmp_max: u64,
    /// TIFF format limit (can be large, multi-page support)
    pub tiff_max: u64,
    /// WebP format limit
    pub webp_max: u64,
}

impl Default for FormatSizeLimits {
    fn default() -> Self {
        Self {
            png_max: 15 * 1024 * 1024,  // 15MB for PNG
            jpeg_max: 10 * 1024 * 1024, // 10MB for JPEG
            bmp_max: 5 * 1024 * 1024,   // 5MB for BMP
            tiff_max: 20 * 1024 * 1024, // 20MB for TIFF
            webp_max: 10 * 1024 * 1024, // 10MB for WebP
        }
    }
}

impl FormatSizeLimits {
    /// Byte limit for a detected format, `None` when the format has no specific limit
    pub fn limit_for(&self, format: image::ImageFormat) -> Option<u64> {
        match format {
            image::ImageFormat::Png => Some(self.png_max),
            image::ImageFormat::Jpeg => Some(self.jpeg_max),
            image::ImageFormat::Bmp => Some(self.bmp_max),
            image::ImageFormat::Tiff => Some(self.tiff_max),
            image::ImageFormat::WebP => Some(self.webp_max),
            _ => None,
        }
    }

    /// Validate format size limits
    pub fn validate(&self) -> crate::errors::AppResult<()> {
        let limits = [
            ("png_max", self.png_max),
            ("jpeg_max", self.jpeg_max),
            ("bmp_max", self.bmp_max),
            ("tiff_max", self.tiff_max),
            ("webp_max", self.webp_max),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(crate::errors::AppError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.bmp_max > self.png_max {
            return Err(crate::errors::AppError::Config(format!(
                "bmp_max ({}) should not exceed png_max ({})",
                self.bmp_max, self.png_max
            )));
        }

        Ok(())
    }
}

/// Configuration for capture validation and normalization
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Maximum accepted size of a captured image in bytes (general limit)
    pub max_image_bytes: u64,
    /// Format-specific size limits
    pub format_limits: FormatSizeLimits,
    /// Edge length of the canonical square image handed to feature extraction
    pub canonical_size: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: MAX_IMAGE_BYTES,
            format_limits: FormatSizeLimits::default(),
            canonical_size: CANONICAL_SIZE,
        }
    }
}

impl CaptureConfig {
    /// Effective byte limit for an image of the given (possibly unknown) format
    pub fn byte_limit(&self, format: Option<image::ImageFormat>) -> u64 {
        format
            .and_then(|f| self.format_limits.limit_for(f))
            .unwrap_or(self.max_image_bytes)
    }

    /// Validate capture configuration parameters
    pub fn validate(&self) -> crate::errors::AppResult<()> {
        if self.max_image_bytes == 0 {
            return Err(crate::errors::AppError::Config(
                "max_image_bytes must be greater than 0".to_string(),
            ));
        }
        // Feature extractors are calibrated against this size
        if self.canonical_size != CANONICAL_SIZE {
            return Err(crate::errors::AppError::Config(format!(
                "canonical_size must be {} (got {})",
                CANONICAL_SIZE, self.canonical_size
            )));
        }

        self.format_limits.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_config_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(config.canonical_size, 224);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_byte_limit_uses_format_specific_value() {
        let config = CaptureConfig::default();
        assert_eq!(
            config.byte_limit(Some(image::ImageFormat::Png)),
            15 * 1024 * 1024
        );
        assert_eq!(
            config.byte_limit(Some(image::ImageFormat::Bmp)),
            5 * 1024 * 1024
        );
        assert_eq!(config.byte_limit(None), config.max_image_bytes);
        assert_eq!(
            config.byte_limit(Some(image::ImageFormat::Gif)),
            config.max_image_bytes
        );
    }

    #[test]
    #[allow(unused_assignments)]
    fn test_capture_config_validation() {
        let mut config = CaptureConfig::default();

        config.max_image_bytes = 0;
        assert!(config.validate().is_err());
        config.max_image_bytes = MAX_IMAGE_BYTES;

        config.canonical_size = 256;
        assert!(config.validate().is_err());
        config.canonical_size = CANONICAL_SIZE;

        config.format_limits.jpeg_max = 0;
        assert!(config.validate().is_err());
        config.format_limits.jpeg_max = 10 * 1024 * 1024;

        // BMP limit above PNG limit
        config.format_limits.bmp_max = 20 * 1024 * 1024;
        assert!(config.validate().is_err());
        config.format_limits.bmp_max = 5 * 1024 * 1024;

        assert!(config.validate().is_ok());
    }
}
