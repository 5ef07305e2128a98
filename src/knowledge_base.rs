//! # Knowledge Base Module
//!
//! Static advisory tables mapping every label of a pipeline to its advisory
//! record. Tables are embedded at compile time, validated once at startup and
//! shared read-only afterwards.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::labels::{DiseaseLabel, Label, PipelineKind, SoilLabel};
use crate::scan_errors::ScanError;

const DISEASE_TABLE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/data/disease_advisories.json"
));
const SOIL_TABLE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/data/soil_advisories.json"
));

/// Advice for a detected plant condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseAdvisory {
    pub name: String,
    pub cause: String,
    pub symptoms: String,
    pub treatment: String,
    pub prevention: String,
}

/// Advice for a detected soil type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilAdvisory {
    pub name: String,
    pub characteristics: String,
    pub fertility: String,
    pub water_retention: String,
    pub best_crops: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Advisory content shown for a classification result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdvisoryRecord {
    Disease(DiseaseAdvisory),
    Soil(SoilAdvisory),
}

fn require(field: &'static str, value: &str, missing: &mut Vec<&'static str>) {
    if value.trim().is_empty() {
        missing.push(field);
    }
}

fn require_list(field: &'static str, values: &[String], missing: &mut Vec<&'static str>) {
    if values.is_empty() || values.iter().any(|v| v.trim().is_empty()) {
        missing.push(field);
    }
}

impl AdvisoryRecord {
    /// Display name of the condition or soil type
    pub fn name(&self) -> &str {
        match self {
            AdvisoryRecord::Disease(advisory) => &advisory.name,
            AdvisoryRecord::Soil(advisory) => &advisory.name,
        }
    }

    pub fn pipeline(&self) -> PipelineKind {
        match self {
            AdvisoryRecord::Disease(_) => PipelineKind::Disease,
            AdvisoryRecord::Soil(_) => PipelineKind::Soil,
        }
    }

    /// Names of required fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self {
            AdvisoryRecord::Disease(advisory) => {
                require("name", &advisory.name, &mut missing);
                require("cause", &advisory.cause, &mut missing);
                require("symptoms", &advisory.symptoms, &mut missing);
                require("treatment", &advisory.treatment, &mut missing);
                require("prevention", &advisory.prevention, &mut missing);
            }
            AdvisoryRecord::Soil(advisory) => {
                require("name", &advisory.name, &mut missing);
                require("characteristics", &advisory.characteristics, &mut missing);
                require("fertility", &advisory.fertility, &mut missing);
                require("water_retention", &advisory.water_retention, &mut missing);
                require_list("best_crops", &advisory.best_crops, &mut missing);
                require_list("recommendations", &advisory.recommendations, &mut missing);
            }
        }
        missing
    }
}

#[derive(Debug, Deserialize)]
struct AdvisoryTable {
    entries: Vec<TableEntry>,
}

#[derive(Debug, Deserialize)]
struct TableEntry {
    label: String,
    record: AdvisoryRecord,
}

/// Read-only advisory lookup, total over the label set `L`.
#[derive(Debug)]
pub struct KnowledgeBase<L: Label> {
    // Indexed by `Label::index`
    records: Vec<AdvisoryRecord>,
    _labels: std::marker::PhantomData<L>,
}

impl<L: Label> KnowledgeBase<L> {
    /// Build a knowledge base from `(label, record)` entries.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::KnowledgeBaseIntegrity` if a label has no record,
    /// a label has more than one record, a record belongs to the other
    /// pipeline, or a required field is blank.
    pub fn build<I>(entries: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = (L, AdvisoryRecord)>,
    {
        let mut slots: Vec<Option<AdvisoryRecord>> = vec![None; L::ALL.len()];

        for (label, record) in entries {
            if record.pipeline() != L::PIPELINE {
                return Err(ScanError::KnowledgeBaseIntegrity(format!(
                    "record for '{}' is a {} advisory, expected {}",
                    label,
                    record.pipeline(),
                    L::PIPELINE
                )));
            }
            let missing = record.missing_fields();
            if !missing.is_empty() {
                return Err(ScanError::KnowledgeBaseIntegrity(format!(
                    "record for '{}' has empty fields: {}",
                    label,
                    missing.join(", ")
                )));
            }
            let slot = &mut slots[label.index()];
            if slot.is_some() {
                return Err(ScanError::KnowledgeBaseIntegrity(format!(
                    "duplicate record for '{}'",
                    label
                )));
            }
            *slot = Some(record);
        }

        let missing: Vec<&str> = L::ALL
            .iter()
            .filter(|label| slots[label.index()].is_none())
            .map(|label| label.key())
            .collect();
        if !missing.is_empty() {
            return Err(ScanError::KnowledgeBaseIntegrity(format!(
                "no {} record for: {}",
                L::PIPELINE,
                missing.join(", ")
            )));
        }

        Ok(Self {
            records: slots.into_iter().flatten().collect(),
            _labels: std::marker::PhantomData,
        })
    }

    /// Parse and build from a JSON advisory table.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::KnowledgeBaseIntegrity` for malformed JSON, unknown
    /// label keys and every integrity violation [`KnowledgeBase::build`] reports.
    pub fn from_json(table: &str) -> Result<Self, ScanError> {
        let table: AdvisoryTable = serde_json::from_str(table).map_err(|e| {
            ScanError::KnowledgeBaseIntegrity(format!("malformed advisory table: {}", e))
        })?;

        let entries = table
            .entries
            .into_iter()
            .map(|entry| {
                let label = L::from_key(&entry.label).ok_or_else(|| {
                    ScanError::KnowledgeBaseIntegrity(format!(
                        "unknown {} label '{}'",
                        L::PIPELINE,
                        entry.label
                    ))
                })?;
                Ok((label, entry.record))
            })
            .collect::<Result<Vec<_>, ScanError>>()?;

        let knowledge_base = Self::build(entries)?;
        info!(
            pipeline = %L::PIPELINE,
            records = knowledge_base.records.len(),
            "Knowledge base loaded"
        );
        Ok(knowledge_base)
    }

    /// Advisory for `label`; never fails once built.
    pub fn lookup(&self, label: L) -> &AdvisoryRecord {
        &self.records[label.index()]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(label, record)` pairs in label declaration order
    pub fn iter(&self) -> impl Iterator<Item = (L, &AdvisoryRecord)> {
        L::ALL.iter().copied().zip(self.records.iter())
    }
}

/// Embedded plant disease advisories
pub fn disease_knowledge_base() -> Result<Arc<KnowledgeBase<DiseaseLabel>>, ScanError> {
    KnowledgeBase::from_json(DISEASE_TABLE).map(Arc::new)
}

/// Embedded soil advisories
pub fn soil_knowledge_base() -> Result<Arc<KnowledgeBase<SoilLabel>>, ScanError> {
    KnowledgeBase::from_json(SOIL_TABLE).map(Arc::new)
}
