//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Scan stage and session spans
//! - Metrics collection with on-demand Prometheus rendering

pub mod metrics;
pub mod tracing_mod;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::observability_config::ObservabilityConfig;

pub use self::metrics::{
    init_metrics_with_config, record_label, record_scan_metrics, record_stale_result,
    record_transition,
};
pub use tracing_mod::{init_tracing_with_config, scan_span, session_span};

/// Initialize logging and, when enabled, metrics.
///
/// Returns the Prometheus handle if a recorder was installed.
pub fn init_observability_with_config(
    config: &ObservabilityConfig,
) -> Result<Option<PrometheusHandle>> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    init_tracing_with_config(config)?;
    let handle = init_metrics_with_config(config)?;

    tracing::info!(
        environment = %config.environment,
        metrics_enabled = handle.is_some(),
        "Observability stack initialized successfully"
    );
    Ok(handle)
}
