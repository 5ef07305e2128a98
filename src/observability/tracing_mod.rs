//! Tracing and logging setup module.
//!
//! This module provides:
//! - Structured logging configuration
//! - Tracing span creation utilities

use anyhow::Result;
use tracing_subscriber::prelude::*;

use crate::labels::PipelineKind;
use crate::observability_config::ObservabilityConfig;

/// Initialize structured logging with tracing and configuration
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("fieldscan={}", config.log_level).parse()?);

    // Pretty formatting for development, JSON otherwise
    if config.use_pretty_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Create a span for one stage of a scan
pub fn scan_span(pipeline: PipelineKind, stage: &str) -> tracing::Span {
    tracing::info_span!(
        "scan_stage",
        pipeline = pipeline.as_str(),
        stage = stage,
        component = "scan"
    )
}

/// Create a span for session commands
pub fn session_span(pipeline: PipelineKind, command: &str, generation: u64) -> tracing::Span {
    tracing::info_span!(
        "session_command",
        pipeline = pipeline.as_str(),
        command = command,
        generation = generation,
        component = "session"
    )
}
