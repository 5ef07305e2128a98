//! # Unified Application Configuration
//!
//! Consolidates capture, classifier and observability settings into one
//! structured object, loaded from environment variables and validated at
//! startup.

use crate::capture_config::CaptureConfig;
use crate::errors::{AppError, AppResult};
use crate::labels::{DiseaseLabel, Label, SoilLabel};
use crate::observability_config::ObservabilityConfig;
use std::collections::HashMap;
use std::env;

/// Per-label threshold overrides for the two classifiers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierConfig {
    /// Disease label key -> threshold
    pub disease: HashMap<String, f32>,
    /// Soil label key -> threshold
    pub soil: HashMap<String, f32>,
}

fn validate_overrides<L: Label>(overrides: &HashMap<String, f32>) -> AppResult<()> {
    for (key, value) in overrides {
        if L::from_key(key).is_none() {
            let known: Vec<&str> = L::ALL.iter().map(|label| label.key()).collect();
            return Err(AppError::Config(format!(
                "Unknown {} label '{}' in threshold overrides, expected one of: {}",
                L::PIPELINE,
                key,
                known.join(", ")
            )));
        }
        if !(0.0..=1.0).contains(value) {
            return Err(AppError::Config(format!(
                "Threshold override for '{}' must be between 0.0 and 1.0, got {}",
                key, value
            )));
        }
    }
    Ok(())
}

impl ClassifierConfig {
    /// Validate classifier overrides
    pub fn validate(&self) -> AppResult<()> {
        validate_overrides::<DiseaseLabel>(&self.disease)?;
        validate_overrides::<SoilLabel>(&self.soil)?;
        Ok(())
    }
}

/// Parse threshold overrides.
/// Format: "label1=value1,label2=value2"
pub fn parse_overrides(raw: &str) -> AppResult<HashMap<String, f32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let mut parts = pair.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) if !key.trim().is_empty() => {
                    let threshold = value.trim().parse::<f32>().map_err(|_| {
                        AppError::Config(format!(
                            "Threshold for '{}' must be a number, got '{}'",
                            key.trim(),
                            value.trim()
                        ))
                    })?;
                    Ok((key.trim().to_lowercase(), threshold))
                }
                _ => Err(AppError::Config(format!(
                    "Invalid threshold override '{}', expected 'label=value'",
                    pair
                ))),
            }
        })
        .collect()
}

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    /// Capture validation and normalization
    pub capture: CaptureConfig,
    /// Classifier threshold overrides
    pub classifier: ClassifierConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("MAX_IMAGE_BYTES") {
            config.capture.max_image_bytes = raw.trim().parse().map_err(|_| {
                AppError::Config("MAX_IMAGE_BYTES must be a valid number".to_string())
            })?;
        }

        if let Ok(raw) = env::var("DISEASE_THRESHOLD_OVERRIDES") {
            config.classifier.disease = parse_overrides(&raw)?;
        }
        if let Ok(raw) = env::var("SOIL_THRESHOLD_OVERRIDES") {
            config.classifier.soil = parse_overrides(&raw)?;
        }

        config.observability = ObservabilityConfig::from_env();

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.capture.validate()?;
        self.classifier.validate()?;
        self.observability.validate()?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: environment={}, max_image_bytes={}, canonical_size={}, disease_overrides={}, soil_overrides={}, metrics_enabled={}",
            self.observability.environment,
            self.capture.max_image_bytes,
            self.capture.canonical_size,
            self.classifier.disease.len(),
            self.classifier.soil.len(),
            self.observability.enable_metrics
        )
    }
}
