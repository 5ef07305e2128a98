//! Closed label sets for the two scan pipelines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which pipeline instance a component belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// Plant leaf disease detection
    Disease,
    /// Soil type analysis
    Soil,
}

impl PipelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Disease => "disease",
            PipelineKind::Soil => "soil",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disease" | "plant" | "leaf" => Ok(PipelineKind::Disease),
            "soil" => Ok(PipelineKind::Soil),
            other => Err(format!(
                "unknown pipeline '{}', expected 'disease' or 'soil'",
                other
            )),
        }
    }
}

/// A classification outcome from a closed, pipeline-specific set.
///
/// `ALL` lists every member in declaration order and `index` is the member's
/// position in it, so per-label tables can be plain vectors.
pub trait Label: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Every label of the set, in declaration order
    const ALL: &'static [Self];
    /// Pipeline the set belongs to
    const PIPELINE: PipelineKind;
    /// Label returned when no classifier rule matches
    const DEFAULT: Self;

    /// Stable snake_case key
    fn key(self) -> &'static str;

    /// Position in `ALL`
    fn index(self) -> usize;

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|label| label.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseLabel {
    LeafSpots,
    PowderyMildew,
    Blight,
    Healthy,
}

impl Label for DiseaseLabel {
    const ALL: &'static [Self] = &[
        DiseaseLabel::LeafSpots,
        DiseaseLabel::PowderyMildew,
        DiseaseLabel::Blight,
        DiseaseLabel::Healthy,
    ];
    const PIPELINE: PipelineKind = PipelineKind::Disease;
    const DEFAULT: Self = DiseaseLabel::Healthy;

    fn key(self) -> &'static str {
        match self {
            DiseaseLabel::LeafSpots => "leaf_spots",
            DiseaseLabel::PowderyMildew => "powdery_mildew",
            DiseaseLabel::Blight => "blight",
            DiseaseLabel::Healthy => "healthy",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DiseaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilLabel {
    Clay,
    Sandy,
    Loamy,
}

impl Label for SoilLabel {
    const ALL: &'static [Self] = &[SoilLabel::Clay, SoilLabel::Sandy, SoilLabel::Loamy];
    const PIPELINE: PipelineKind = PipelineKind::Soil;
    // Loam is the balanced soil: nothing about the sample stood out
    const DEFAULT: Self = SoilLabel::Loamy;

    fn key(self) -> &'static str {
        match self {
            SoilLabel::Clay => "clay",
            SoilLabel::Sandy => "sandy",
            SoilLabel::Loamy => "loamy",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SoilLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
