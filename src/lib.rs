//! # FieldScan
//!
//! On-device capture → analysis → advisory pipelines for plant disease
//! detection and soil type identification. A photo is normalized, reduced to
//! a small feature vector, classified by ordered threshold rules and mapped to
//! static advice, all driven by a per-pipeline session state machine.

pub mod capture;
pub mod capture_config;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod errors;
pub mod features;
pub mod knowledge_base;
pub mod labels;
pub mod observability;
pub mod observability_config;
pub mod pipeline;
pub mod preprocessing;
pub mod scan_errors;
pub mod session;

// Re-export types for easier access
pub use controller::ScanController;
pub use labels::{DiseaseLabel, Label, PipelineKind, SoilLabel};
pub use pipeline::{build_analyzer, Analyzer, Pipeline, ScanOutcome};
pub use scan_errors::ScanError;
pub use session::{ScanSession, SessionSnapshot, SessionState};
