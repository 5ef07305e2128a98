//! Heuristic leaf feature extractor.

use super::{stats, FeatureExtractor, FeatureLayout, FeatureVector, DISEASE_LAYOUT};
use crate::preprocessing::CanonicalImage;

/// Lesion coverage at which `spot_density` saturates
const LESION_SATURATION: f32 = 0.25;

/// Placeholder statistics standing in for a trained leaf model.
///
/// - `spot_density`: dark, non-green pixel coverage, saturating at 25%
/// - `color`: mean whiteness (powdery coatings)
/// - `texture`: normalized Laplacian variance
/// - `edges`: Sobel edge density
#[derive(Debug, Clone, Copy, Default)]
pub struct DiseaseFeatureExtractor;

impl FeatureExtractor for DiseaseFeatureExtractor {
    fn layout(&self) -> &'static FeatureLayout {
        &DISEASE_LAYOUT
    }

    fn extract(&self, image: &CanonicalImage) -> FeatureVector {
        let rgb = image.pixels();
        let gray = image.luma();

        let spot_density = stats::lesion_fraction(rgb, &gray) / LESION_SATURATION;
        let color = stats::mean_whiteness(rgb);
        let texture = stats::laplacian_variance(&gray);
        let edges = stats::edge_density(&gray);

        tracing::debug!(
            spot_density, color, texture, edges,
            "Leaf features extracted"
        );

        FeatureVector::new(&DISEASE_LAYOUT, vec![spot_density, color, texture, edges])
            .unwrap_or_else(|_| FeatureVector::zeroed(&DISEASE_LAYOUT))
    }
}
