//! # Analysis Pipeline Module
//!
//! The Analyzing unit of work: normalize, extract features, classify, look up
//! the advisory. Runs sequentially and synchronously; the controller moves it
//! onto the blocking pool.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::capture::RawImage;
use crate::classifier::{disease_classifier, soil_classifier, Classifier};
use crate::config::AppConfig;
use crate::errors::error_logging;
use crate::features::{DiseaseFeatureExtractor, FeatureExtractor, FeatureVector, SoilFeatureExtractor};
use crate::knowledge_base::{disease_knowledge_base, soil_knowledge_base, AdvisoryRecord, KnowledgeBase};
use crate::labels::{DiseaseLabel, Label, PipelineKind, SoilLabel};
use crate::observability::{record_label, record_scan_metrics, scan_span};
use crate::preprocessing::{assess_capture_quality, CaptureQuality, Preprocessor};
use crate::scan_errors::ScanError;

/// Everything the presenter shows for a successful scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    pub pipeline: PipelineKind,
    /// Stable label key, e.g. `powdery_mildew`
    pub label: &'static str,
    /// Display name from the advisory record
    pub name: String,
    pub features: FeatureVector,
    pub record: AdvisoryRecord,
    /// Advisory capture diagnostics; never affects the label
    pub quality: CaptureQuality,
    pub processing_time_ms: u64,
    /// When the analyzed image was taken
    pub captured_at: DateTime<Utc>,
}

/// Object-safe view of a pipeline, independent of its label set.
pub trait Analyzer: Send + Sync {
    fn kind(&self) -> PipelineKind;

    /// Run the full analysis on one captured image.
    ///
    /// Only preprocessing can fail; extraction and classification are total.
    fn analyze(&self, image: &RawImage) -> Result<ScanOutcome, ScanError>;
}

/// Preprocessor, extractor, classifier and knowledge base for one label set.
pub struct Pipeline<L: Label> {
    preprocessor: Preprocessor,
    extractor: Box<dyn FeatureExtractor>,
    classifier: Classifier<L>,
    knowledge_base: Arc<KnowledgeBase<L>>,
}

impl<L: Label> Pipeline<L> {
    /// Assemble a pipeline from its stages.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Config` if the extractor and classifier disagree on
    /// the feature layout.
    pub fn new(
        preprocessor: Preprocessor,
        extractor: Box<dyn FeatureExtractor>,
        classifier: Classifier<L>,
        knowledge_base: Arc<KnowledgeBase<L>>,
    ) -> Result<Self, ScanError> {
        if extractor.layout() != classifier.layout() {
            return Err(ScanError::Config(format!(
                "extractor produces {} features but the classifier expects {} features",
                extractor.layout().pipeline,
                classifier.layout().pipeline
            )));
        }
        Ok(Self {
            preprocessor,
            extractor,
            classifier,
            knowledge_base,
        })
    }

    pub fn knowledge_base(&self) -> &Arc<KnowledgeBase<L>> {
        &self.knowledge_base
    }

    pub fn classifier(&self) -> &Classifier<L> {
        &self.classifier
    }

    /// Typed analysis: the label plus the outcome built from it
    pub fn classify_image(&self, image: &RawImage) -> Result<(L, ScanOutcome), ScanError> {
        let start_time = Instant::now();

        let canonical = {
            let _span = scan_span(L::PIPELINE, "preprocess").entered();
            self.preprocessor.normalize(image)
        };
        let canonical = match canonical {
            Ok(canonical) => canonical,
            Err(e) => {
                error_logging::log_scan_error(&e, L::PIPELINE, "preprocess", None);
                record_scan_metrics(L::PIPELINE, false, start_time.elapsed());
                return Err(e);
            }
        };

        let quality = assess_capture_quality(&canonical);

        let features = {
            let _span = scan_span(L::PIPELINE, "extract").entered();
            self.extractor.extract(&canonical)
        };

        let label = {
            let _span = scan_span(L::PIPELINE, "classify").entered();
            self.classifier.classify(&features)
        };

        let record = self.knowledge_base.lookup(label).clone();
        let elapsed = start_time.elapsed();

        record_scan_metrics(L::PIPELINE, true, elapsed);
        record_label(L::PIPELINE, label.key());
        debug!(
            pipeline = %L::PIPELINE,
            features = ?features.values(),
            quality = ?quality.grade,
            "Analysis details"
        );
        info!(
            pipeline = %L::PIPELINE,
            label = %label,
            duration_ms = elapsed.as_millis() as u64,
            source = ?image.source(),
            "Analysis completed"
        );

        let outcome = ScanOutcome {
            pipeline: L::PIPELINE,
            label: label.key(),
            name: record.name().to_string(),
            features,
            record,
            quality,
            processing_time_ms: elapsed.as_millis() as u64,
            captured_at: image.captured_at(),
        };
        Ok((label, outcome))
    }
}

impl<L: Label> Analyzer for Pipeline<L> {
    fn kind(&self) -> PipelineKind {
        L::PIPELINE
    }

    fn analyze(&self, image: &RawImage) -> Result<ScanOutcome, ScanError> {
        self.classify_image(image).map(|(_, outcome)| outcome)
    }
}

impl Pipeline<DiseaseLabel> {
    /// Plant disease pipeline with configured threshold overrides
    pub fn disease(config: &AppConfig) -> Result<Self, ScanError> {
        let classifier = disease_classifier()?.with_overrides(&config.classifier.disease)?;
        Self::new(
            Preprocessor::new(config.capture.clone())?,
            Box::new(DiseaseFeatureExtractor),
            classifier,
            disease_knowledge_base()?,
        )
    }
}

impl Pipeline<SoilLabel> {
    /// Soil type pipeline with configured threshold overrides
    pub fn soil(config: &AppConfig) -> Result<Self, ScanError> {
        let classifier = soil_classifier()?.with_overrides(&config.classifier.soil)?;
        Self::new(
            Preprocessor::new(config.capture.clone())?,
            Box::new(SoilFeatureExtractor),
            classifier,
            soil_knowledge_base()?,
        )
    }
}

/// Build the analyzer for `kind`; fails at startup on integrity or config errors.
pub fn build_analyzer(kind: PipelineKind, config: &AppConfig) -> Result<Arc<dyn Analyzer>, ScanError> {
    let analyzer: Arc<dyn Analyzer> = match kind {
        PipelineKind::Disease => Arc::new(Pipeline::disease(config)?),
        PipelineKind::Soil => Arc::new(Pipeline::soil(config)?),
    };
    Ok(analyzer)
}
