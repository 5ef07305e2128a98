//! FieldScan command line
//!
//! Runs the capture → analyze → advise flow over image files, one session per
//! invocation, treating each file as a photo taken by the camera.
//!
//! # Usage
//!
//! ```bash
//! fieldscan --pipeline disease leaf1.jpg leaf2.png
//! fieldscan --pipeline soil --json sample.jpg
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use fieldscan::capture::{FileCaptureDevice, PermissionStatus};
use fieldscan::config::AppConfig;
use fieldscan::controller::ScanController;
use fieldscan::errors::error_logging;
use fieldscan::knowledge_base::AdvisoryRecord;
use fieldscan::labels::PipelineKind;
use fieldscan::observability;
use fieldscan::pipeline::{build_analyzer, ScanOutcome};
use fieldscan::scan_errors::ScanError;
use fieldscan::session::{SessionSnapshot, SessionState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line arguments
#[derive(Parser)]
#[command(name = "fieldscan")]
#[command(about = "Identify plant diseases and soil types from photos")]
struct Args {
    /// Pipeline to run: disease or soil
    #[arg(short, long, default_value = "disease")]
    pipeline: PipelineKind,

    /// Image files to scan, in order
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Print session snapshots as JSON
    #[arg(long)]
    json: bool,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    metrics: bool,

    /// Simulate a user refusing camera access
    #[arg(long)]
    deny_permission: bool,
}

fn render_outcome(outcome: &ScanOutcome) -> String {
    let mut lines = vec![format!(
        "{} ({}) captured {}",
        outcome.name,
        outcome.label,
        outcome.captured_at.format("%Y-%m-%d %H:%M:%S UTC")
    )];
    match &outcome.record {
        AdvisoryRecord::Disease(advisory) => {
            lines.push(format!("  Cause:      {}", advisory.cause));
            lines.push(format!("  Symptoms:   {}", advisory.symptoms));
            lines.push(format!("  Treatment:  {}", advisory.treatment));
            lines.push(format!("  Prevention: {}", advisory.prevention));
        }
        AdvisoryRecord::Soil(advisory) => {
            lines.push(format!("  Characteristics: {}", advisory.characteristics));
            lines.push(format!("  Fertility:       {}", advisory.fertility));
            lines.push(format!("  Water retention: {}", advisory.water_retention));
            lines.push(format!("  Best crops:      {}", advisory.best_crops.join(", ")));
            lines.push("  Recommendations:".to_string());
            for recommendation in &advisory.recommendations {
                lines.push(format!("    - {}", recommendation));
            }
        }
    }
    let features: Vec<String> = outcome
        .features
        .iter()
        .map(|(axis, value)| format!("{}={:.2}", axis, value))
        .collect();
    lines.push(format!("  Features:   {}", features.join(" ")));
    lines.push(format!(
        "  Capture:    {:?} quality, analyzed in {}ms",
        outcome.quality.grade, outcome.processing_time_ms
    ));
    lines.join("\n")
}

fn print_snapshot(path: &std::path::Path, snapshot: &SessionSnapshot, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?
        );
        return Ok(());
    }

    println!("== {} ==", path.display());
    match (&snapshot.result, &snapshot.failure) {
        (Some(outcome), _) => println!("{}", render_outcome(outcome)),
        (None, Some(failure)) => println!("Scan failed: {}", failure),
        (None, None) => println!("No result ({})", snapshot.state),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if args.metrics {
        config.observability.enable_metrics = true;
    }
    config.validate().context("Invalid configuration")?;

    let metrics_handle = observability::init_observability_with_config(&config.observability)?;
    info!("{}", config.summary());

    let analyzer = build_analyzer(args.pipeline, &config).map_err(|e| {
        error_logging::log_scan_error(&e, args.pipeline, "startup", None);
        anyhow::anyhow!("Failed to build the {} pipeline: {}", args.pipeline, e)
    })?;

    let permission = if args.deny_permission {
        PermissionStatus::Denied
    } else {
        PermissionStatus::Granted
    };
    let device = Arc::new(FileCaptureDevice::new(args.images.clone()).with_permission(permission));
    let controller = ScanController::new(device, analyzer);

    controller
        .start_capture()
        .context("Cannot open the camera")?;

    for path in &args.images {
        if controller.snapshot().state != SessionState::AwaitingCapture {
            controller.new_scan()?;
        }

        match controller.capture().await {
            Ok(_) | Err(ScanError::Capture(_)) => {}
            Err(e) => warn!(error = %e, path = %path.display(), "Scan did not complete"),
        }
        print_snapshot(path, &controller.snapshot(), args.json)?;
    }

    if let Some(handle) = metrics_handle {
        println!("{}", handle.render());
    }

    Ok(())
}
