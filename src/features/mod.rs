//! # Feature Extraction Module
//!
//! Converts a canonical image into a fixed-length vector of normalized scalars.
//! The [`FeatureExtractor`] trait is the seam where a trained model replaces the
//! heuristic extractors shipped here; callers rely only on the layout and the
//! 0.0-1.0 value range.
//!
//! - `stats`: pixel statistics shared with quality assessment
//! - `disease`: leaf extractor (spot density, color, texture, edges)
//! - `soil`: soil extractor (brightness, granularity, saturation, moisture)

pub mod disease;
pub mod soil;
pub mod stats;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::labels::PipelineKind;
use crate::preprocessing::CanonicalImage;
use crate::scan_errors::ScanError;

pub use disease::DiseaseFeatureExtractor;
pub use soil::SoilFeatureExtractor;

/// Named, ordered feature axes of one pipeline
#[derive(Debug, PartialEq, Eq)]
pub struct FeatureLayout {
    pub pipeline: PipelineKind,
    pub axes: &'static [&'static str],
}

impl FeatureLayout {
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn index_of(&self, axis: &str) -> Option<usize> {
        self.axes.iter().position(|candidate| *candidate == axis)
    }
}

pub static DISEASE_LAYOUT: FeatureLayout = FeatureLayout {
    pipeline: PipelineKind::Disease,
    axes: &["spot_density", "color", "texture", "edges"],
};

pub static SOIL_LAYOUT: FeatureLayout = FeatureLayout {
    pipeline: PipelineKind::Soil,
    axes: &["brightness", "granularity", "saturation", "moisture"],
};

/// Fixed-length feature values bound to their layout.
///
/// Values are always in 0.0-1.0: construction clamps out-of-range values and
/// maps NaN to 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    layout: &'static FeatureLayout,
    values: Vec<f32>,
}

fn sanitize(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl FeatureVector {
    /// Build a vector from values in axis order.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::FeatureShape` if the value count differs from the layout.
    pub fn new(layout: &'static FeatureLayout, values: Vec<f32>) -> Result<Self, ScanError> {
        if values.len() != layout.len() {
            return Err(ScanError::FeatureShape {
                expected: layout.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            layout,
            values: values.into_iter().map(sanitize).collect(),
        })
    }

    /// Build a vector from `(axis, value)` pairs; axes not mentioned are 0.0.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldscan::features::{FeatureVector, DISEASE_LAYOUT};
    ///
    /// let features = FeatureVector::from_named(
    ///     &DISEASE_LAYOUT,
    ///     &[("spot_density", 0.9), ("color", 0.5)],
    /// ).unwrap();
    /// assert_eq!(features.get("spot_density"), Some(0.9));
    /// assert_eq!(features.get("edges"), Some(0.0));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Config` for an axis the layout does not declare.
    pub fn from_named(
        layout: &'static FeatureLayout,
        pairs: &[(&str, f32)],
    ) -> Result<Self, ScanError> {
        let mut values = vec![0.0; layout.len()];
        for (axis, value) in pairs {
            let index = layout.index_of(axis).ok_or_else(|| {
                ScanError::Config(format!(
                    "unknown feature axis '{}' for the {} pipeline",
                    axis, layout.pipeline
                ))
            })?;
            values[index] = *value;
        }
        Self::new(layout, values)
    }

    /// All-zero vector; extractors fall back to it if their value count drifts
    pub(crate) fn zeroed(layout: &'static FeatureLayout) -> Self {
        Self {
            layout,
            values: vec![0.0; layout.len()],
        }
    }

    pub fn layout(&self) -> &'static FeatureLayout {
        self.layout
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    pub fn get(&self, axis: &str) -> Option<f32> {
        self.layout.index_of(axis).and_then(|index| self.value(index))
    }

    /// `(axis, value)` pairs in layout order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        self.layout.axes.iter().copied().zip(self.values.iter().copied())
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (axis, value) in self.iter() {
            map.serialize_entry(axis, &value)?;
        }
        map.end()
    }
}

/// Converts a canonical image into the pipeline's feature vector.
pub trait FeatureExtractor: Send + Sync {
    /// Layout of every vector this extractor returns
    fn layout(&self) -> &'static FeatureLayout;

    /// Extract features; never fails on a canonical image
    fn extract(&self, image: &CanonicalImage) -> FeatureVector;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_have_four_axes() {
        assert_eq!(DISEASE_LAYOUT.len(), 4);
        assert_eq!(SOIL_LAYOUT.len(), 4);
        assert_eq!(DISEASE_LAYOUT.index_of("texture"), Some(2));
        assert_eq!(SOIL_LAYOUT.index_of("texture"), None);
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = FeatureVector::new(&DISEASE_LAYOUT, vec![0.1, 0.2]);
        assert_eq!(
            result.unwrap_err(),
            ScanError::FeatureShape {
                expected: 4,
                actual: 2
            }
        );
    }

    #[test]
    fn test_new_clamps_and_replaces_nan() {
        let features = FeatureVector::new(&SOIL_LAYOUT, vec![-0.5, 1.7, f32::NAN, 0.3]).unwrap();
        assert_eq!(features.values(), &[0.0, 1.0, 0.0, 0.3]);
    }

    #[test]
    fn test_from_named_rejects_unknown_axis() {
        let result = FeatureVector::from_named(&SOIL_LAYOUT, &[("spot_density", 0.9)]);
        assert!(matches!(result, Err(ScanError::Config(msg)) if msg.contains("spot_density")));
    }

    #[test]
    fn test_serializes_as_axis_map() {
        let features =
            FeatureVector::from_named(&DISEASE_LAYOUT, &[("color", 0.5), ("edges", 0.25)]).unwrap();
        let json = serde_json::to_value(&features).unwrap();
        assert_eq!(json["color"], 0.5);
        assert_eq!(json["edges"], 0.25);
        assert_eq!(json["spot_density"], 0.0);
    }
}
