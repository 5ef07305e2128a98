//! # Threshold Classifier Module
//!
//! Maps a feature vector to exactly one label through an ordered list of
//! `axis > threshold -> label` rules. The first matching rule wins; when none
//! matches the classifier falls back to the label set's default, so the result
//! is always a member of the closed set.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::features::{FeatureLayout, FeatureVector, DISEASE_LAYOUT, SOIL_LAYOUT};
use crate::labels::{DiseaseLabel, Label, SoilLabel};
use crate::scan_errors::ScanError;

/// One `axis > threshold -> label` rule, as declared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRule<L: Label> {
    pub axis: &'static str,
    pub threshold: f32,
    pub label: L,
}

impl<L: Label> ThresholdRule<L> {
    pub const fn new(axis: &'static str, threshold: f32, label: L) -> Self {
        Self {
            axis,
            threshold,
            label,
        }
    }
}

/// Rule with its axis resolved against the layout
#[derive(Debug, Clone, Copy)]
struct CompiledRule<L: Label> {
    axis_index: usize,
    rule: ThresholdRule<L>,
}

/// Ordered threshold classifier bound to one feature layout.
#[derive(Debug, Clone)]
pub struct Classifier<L: Label> {
    layout: &'static FeatureLayout,
    rules: Vec<CompiledRule<L>>,
    default: L,
}

fn check_threshold(value: f32, context: &str) -> Result<(), ScanError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ScanError::Config(format!(
            "threshold {} for {} must be between 0.0 and 1.0",
            value, context
        )));
    }
    Ok(())
}

impl<L: Label> Classifier<L> {
    /// Build a classifier, rejecting rules that cannot be evaluated.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Config` if the layout belongs to another pipeline, a
    /// rule names an axis the layout does not declare, or a threshold lies
    /// outside 0.0-1.0.
    pub fn new(
        layout: &'static FeatureLayout,
        rules: &[ThresholdRule<L>],
        default: L,
    ) -> Result<Self, ScanError> {
        if layout.pipeline != L::PIPELINE {
            return Err(ScanError::Config(format!(
                "{} labels cannot be bound to the {} feature layout",
                L::PIPELINE,
                layout.pipeline
            )));
        }

        let compiled = rules
            .iter()
            .map(|rule| {
                let axis_index = layout.index_of(rule.axis).ok_or_else(|| {
                    ScanError::Config(format!(
                        "rule for '{}' references unknown axis '{}'",
                        rule.label, rule.axis
                    ))
                })?;
                check_threshold(rule.threshold, &format!("rule '{}'", rule.label))?;
                Ok(CompiledRule {
                    axis_index,
                    rule: *rule,
                })
            })
            .collect::<Result<Vec<_>, ScanError>>()?;

        debug!(
            pipeline = %L::PIPELINE,
            rule_count = compiled.len(),
            default = %default,
            "Classifier constructed"
        );

        Ok(Self {
            layout,
            rules: compiled,
            default,
        })
    }

    /// Replace thresholds per label key, keeping rule order.
    ///
    /// Every rule targeting an overridden label takes the new threshold.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Config` for a key that is not a label of this
    /// pipeline or a value outside 0.0-1.0.
    pub fn with_overrides(mut self, overrides: &HashMap<String, f32>) -> Result<Self, ScanError> {
        for (key, threshold) in overrides {
            let label = L::from_key(key).ok_or_else(|| {
                ScanError::Config(format!(
                    "threshold override '{}' is not a {} label",
                    key,
                    L::PIPELINE
                ))
            })?;
            check_threshold(*threshold, &format!("override '{}'", key))?;

            let mut applied = 0;
            for compiled in self.rules.iter_mut().filter(|c| c.rule.label == label) {
                compiled.rule.threshold = *threshold;
                applied += 1;
            }
            if applied == 0 {
                warn!(
                    pipeline = %L::PIPELINE,
                    label = %label,
                    "Threshold override targets a label with no rules"
                );
            }
        }
        Ok(self)
    }

    /// Classify a feature vector. Deterministic and total.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldscan::classifier::disease_classifier;
    /// use fieldscan::features::{FeatureVector, DISEASE_LAYOUT};
    /// use fieldscan::labels::DiseaseLabel;
    ///
    /// let classifier = disease_classifier().unwrap();
    /// let features = FeatureVector::from_named(
    ///     &DISEASE_LAYOUT,
    ///     &[("spot_density", 0.9), ("color", 0.5), ("texture", 0.2), ("edges", 0.1)],
    /// ).unwrap();
    /// assert_eq!(classifier.classify(&features), DiseaseLabel::LeafSpots);
    /// ```
    pub fn classify(&self, features: &FeatureVector) -> L {
        if features.layout() != self.layout {
            warn!(
                pipeline = %L::PIPELINE,
                vector_pipeline = %features.layout().pipeline,
                "Feature vector layout does not match classifier, using default label"
            );
            return self.default;
        }

        self.rules
            .iter()
            .find(|compiled| {
                features
                    .value(compiled.axis_index)
                    .is_some_and(|value| value > compiled.rule.threshold)
            })
            .map(|compiled| compiled.rule.label)
            .unwrap_or(self.default)
    }

    pub fn layout(&self) -> &'static FeatureLayout {
        self.layout
    }

    pub fn default_label(&self) -> L {
        self.default
    }

    /// Rules in priority order
    pub fn rules(&self) -> impl Iterator<Item = &ThresholdRule<L>> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }
}

/// Leaf rules, highest priority first
pub fn disease_rules() -> [ThresholdRule<DiseaseLabel>; 3] {
    [
        ThresholdRule::new("spot_density", 0.7, DiseaseLabel::LeafSpots),
        ThresholdRule::new("color", 0.8, DiseaseLabel::PowderyMildew),
        ThresholdRule::new("texture", 0.75, DiseaseLabel::Blight),
    ]
}

/// Soil rules, highest priority first
pub fn soil_rules() -> [ThresholdRule<SoilLabel>; 3] {
    [
        ThresholdRule::new("granularity", 0.65, SoilLabel::Sandy),
        ThresholdRule::new("moisture", 0.55, SoilLabel::Clay),
        ThresholdRule::new("brightness", 0.7, SoilLabel::Sandy),
    ]
}

pub fn disease_classifier() -> Result<Classifier<DiseaseLabel>, ScanError> {
    Classifier::new(&DISEASE_LAYOUT, &disease_rules(), DiseaseLabel::DEFAULT)
}

pub fn soil_classifier() -> Result<Classifier<SoilLabel>, ScanError> {
    Classifier::new(&SOIL_LAYOUT, &soil_rules(), SoilLabel::DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disease(pairs: &[(&str, f32)]) -> FeatureVector {
        FeatureVector::from_named(&DISEASE_LAYOUT, pairs).unwrap()
    }

    fn soil(pairs: &[(&str, f32)]) -> FeatureVector {
        FeatureVector::from_named(&SOIL_LAYOUT, pairs).unwrap()
    }

    #[test]
    fn test_disease_rule_priority() {
        let classifier = disease_classifier().unwrap();
        assert_eq!(
            classifier.classify(&disease(&[("spot_density", 0.9), ("color", 0.9)])),
            DiseaseLabel::LeafSpots
        );
        assert_eq!(
            classifier.classify(&disease(&[("spot_density", 0.2), ("color", 0.85)])),
            DiseaseLabel::PowderyMildew
        );
        assert_eq!(
            classifier.classify(&disease(&[("texture", 0.8)])),
            DiseaseLabel::Blight
        );
        assert_eq!(classifier.classify(&disease(&[])), DiseaseLabel::Healthy);
    }

    #[test]
    fn test_threshold_is_strict() {
        let classifier = disease_classifier().unwrap();
        assert_eq!(
            classifier.classify(&disease(&[("spot_density", 0.7)])),
            DiseaseLabel::Healthy
        );
    }

    #[test]
    fn test_soil_rule_priority() {
        let classifier = soil_classifier().unwrap();
        assert_eq!(
            classifier.classify(&soil(&[("granularity", 0.7), ("moisture", 0.9)])),
            SoilLabel::Sandy
        );
        assert_eq!(
            classifier.classify(&soil(&[("moisture", 0.6), ("brightness", 0.9)])),
            SoilLabel::Clay
        );
        assert_eq!(
            classifier.classify(&soil(&[("brightness", 0.75)])),
            SoilLabel::Sandy
        );
        assert_eq!(
            classifier.classify(&soil(&[("saturation", 1.0)])),
            SoilLabel::Loamy
        );
    }

    #[test]
    fn test_empty_rule_set_returns_default() {
        let classifier = Classifier::new(&SOIL_LAYOUT, &[], SoilLabel::Loamy).unwrap();
        assert_eq!(
            classifier.classify(&soil(&[("granularity", 1.0)])),
            SoilLabel::Loamy
        );
    }

    #[test]
    fn test_rejects_unknown_axis() {
        let rules = [ThresholdRule::new("moisture", 0.5, DiseaseLabel::Blight)];
        let result = Classifier::new(&DISEASE_LAYOUT, &rules, DiseaseLabel::Healthy);
        assert!(matches!(result, Err(ScanError::Config(msg)) if msg.contains("moisture")));
    }

    #[test]
    fn test_rejects_threshold_out_of_range() {
        let rules = [ThresholdRule::new("color", 1.5, DiseaseLabel::PowderyMildew)];
        assert!(Classifier::new(&DISEASE_LAYOUT, &rules, DiseaseLabel::Healthy).is_err());
        let rules = [ThresholdRule::new("color", f32::NAN, DiseaseLabel::PowderyMildew)];
        assert!(Classifier::new(&DISEASE_LAYOUT, &rules, DiseaseLabel::Healthy).is_err());
    }

    #[test]
    fn test_rejects_foreign_layout() {
        let result = Classifier::<SoilLabel>::new(&DISEASE_LAYOUT, &[], SoilLabel::Loamy);
        assert!(matches!(result, Err(ScanError::Config(_))));
    }

    #[test]
    fn test_overrides_replace_thresholds_in_place() {
        let mut overrides = HashMap::new();
        overrides.insert("sandy".to_string(), 0.9);
        let classifier = soil_classifier().unwrap().with_overrides(&overrides).unwrap();

        let thresholds: Vec<(SoilLabel, f32)> =
            classifier.rules().map(|r| (r.label, r.threshold)).collect();
        assert_eq!(
            thresholds,
            vec![
                (SoilLabel::Sandy, 0.9),
                (SoilLabel::Clay, 0.55),
                (SoilLabel::Sandy, 0.9)
            ]
        );
        assert_eq!(
            classifier.classify(&soil(&[("brightness", 0.75)])),
            SoilLabel::Loamy
        );
    }

    #[test]
    fn test_overrides_reject_unknown_label_and_range() {
        let mut overrides = HashMap::new();
        overrides.insert("rust".to_string(), 0.5);
        assert!(disease_classifier().unwrap().with_overrides(&overrides).is_err());

        let mut overrides = HashMap::new();
        overrides.insert("blight".to_string(), -0.1);
        assert!(disease_classifier().unwrap().with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_mismatched_vector_falls_back_to_default() {
        let classifier = disease_classifier().unwrap();
        assert_eq!(
            classifier.classify(&soil(&[("brightness", 1.0)])),
            DiseaseLabel::Healthy
        );
    }
}
