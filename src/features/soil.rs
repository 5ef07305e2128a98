//! Heuristic soil feature extractor.

use super::{stats, FeatureExtractor, FeatureLayout, FeatureVector, SOIL_LAYOUT};
use crate::preprocessing::CanonicalImage;

/// Placeholder statistics standing in for a trained soil model.
///
/// Dry sandy soil photographs light and grainy, wet clay dark and smooth.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoilFeatureExtractor;

impl FeatureExtractor for SoilFeatureExtractor {
    fn layout(&self) -> &'static FeatureLayout {
        &SOIL_LAYOUT
    }

    fn extract(&self, image: &CanonicalImage) -> FeatureVector {
        let gray = image.luma();

        let brightness = stats::mean_luma(&gray);
        let granularity = stats::laplacian_variance(&gray);
        let saturation = stats::mean_saturation(image.pixels());
        let moisture = stats::dark_fraction(&gray);

        tracing::debug!(
            brightness, granularity, saturation, moisture,
            "Soil features extracted"
        );

        FeatureVector::new(
            &SOIL_LAYOUT,
            vec![brightness, granularity, saturation, moisture],
        )
        .unwrap_or_else(|_| FeatureVector::zeroed(&SOIL_LAYOUT))
    }
}
