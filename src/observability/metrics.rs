//! Metrics collection and Prometheus export module.
//!
//! Recording functions go through the `metrics` facade and are no-ops until a
//! recorder is installed, so library code calls them unconditionally.

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::labels::PipelineKind;
use crate::observability_config::ObservabilityConfig;

/// Install the Prometheus recorder when metrics are enabled.
///
/// Returns `None` when disabled. Rendering is on demand through the handle;
/// no HTTP endpoint is exposed.
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<Option<PrometheusHandle>> {
    if !config.enable_metrics {
        tracing::debug!("Metrics collection disabled");
        return Ok(None);
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!(environment = %config.environment, "Metrics collection initialized");
    Ok(Some(handle))
}

/// Record the outcome of one analysis run
pub fn record_scan_metrics(pipeline: PipelineKind, success: bool, duration: std::time::Duration) {
    metrics::counter!(
        "scan_operations_total",
        "pipeline" => pipeline.as_str(),
        "result" => if success { "success" } else { "failure" }
    )
    .increment(1);
    metrics::histogram!("scan_duration_seconds", "pipeline" => pipeline.as_str())
        .record(duration.as_secs_f64());
}

/// Record a classification result by label key
pub fn record_label(pipeline: PipelineKind, label: &str) {
    metrics::counter!(
        "scan_labels_total",
        "pipeline" => pipeline.as_str(),
        "label" => label.to_string()
    )
    .increment(1);
}

/// Record an accepted session transition
pub fn record_transition(from: &'static str, to: &'static str) {
    metrics::counter!("scan_session_transitions_total", "from" => from, "to" => to).increment(1);
}

/// Record an analysis result dropped because the session moved on
pub fn record_stale_result(pipeline: PipelineKind) {
    metrics::counter!("scan_stale_results_total", "pipeline" => pipeline.as_str()).increment(1);
}
