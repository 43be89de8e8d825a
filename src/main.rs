use std::process::ExitCode;

use serde::Serialize;
use stress_scan::config::Config;
use stress_scan::logging::{init_tracing, LogConfig};
use stress_scan::record::ScanRecord;
use stress_scan::scan::{run_scan, ScanController, ScanEvent, StressResult, TokioClock};
use stress_scan::sim::{SyntheticCamera, SyntheticFace};
use tokio::sync::{broadcast, mpsc};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanOutput<'a> {
    result: &'a StressResult,
    record: &'a ScanRecord,
    headline: &'static str,
    recommendation: &'static str,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    if let Err(e) = init_tracing(&LogConfig::from(&config)) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    tracing::info!(
        platform = %config.scan.platform,
        duration_secs = config.scan.duration_secs,
        tick_ms = config.scan.tick_ms,
        "Starting stress-scan"
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(4);
    tokio::spawn(shutdown_signal(shutdown_tx));

    let (event_tx, event_rx) = mpsc::unbounded_channel::<ScanEvent>();
    let event_logger = tokio::spawn(log_events(event_rx));

    let clock = TokioClock::new();
    let camera = SyntheticCamera::new(clock, config.sim.heart_rate_bpm)
        .with_noise(config.sim.seed, 0.5);
    let duration_ms = config.scan.duration_secs.saturating_mul(1_000);
    let blinks = (config.sim.blinks_per_min.max(0.0) * duration_ms as f64 / 60_000.0).round();
    let face = SyntheticFace::evenly_spaced(blinks as u32, duration_ms);

    let mut controller =
        match ScanController::new(config.scan_config(), camera, face, clock, event_tx) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Invalid scan configuration");
                return ExitCode::FAILURE;
            }
        };

    let outcome = run_scan(&mut controller, shutdown_rx).await;
    drop(controller);
    if let Err(e) = event_logger.await {
        tracing::debug!(error = %e, "Event logger task ended abnormally");
    }

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "Scan did not complete");
            return ExitCode::FAILURE;
        }
    };

    let record = ScanRecord::now(&result);
    if let Err(reason) = record.validate() {
        tracing::warn!(reason, "Scan record failed validation");
    }

    let output = ScanOutput {
        result: &result,
        record: &record,
        headline: result.stress_level.headline(),
        recommendation: result.stress_level.recommendation(),
    };
    match serde_json::to_string_pretty(&output) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize scan output");
            ExitCode::FAILURE
        }
    }
}

async fn log_events(mut rx: mpsc::UnboundedReceiver<ScanEvent>) {
    let mut last_decile = 0;
    while let Some(event) = rx.recv().await {
        match event {
            ScanEvent::Telemetry(t) => {
                let decile = (t.progress_percent / 10.0).floor() as u32;
                if decile > last_decile {
                    last_decile = decile;
                    tracing::info!(
                        progress = decile * 10,
                        blink_count = t.blink_count,
                        blink_rate = t.blink_rate,
                        heart_rate = ?t.heart_rate,
                        hrv_ms = ?t.hrv_ms,
                        "Scan progress"
                    );
                }
            }
            ScanEvent::HrvReading(r) => {
                tracing::debug!(
                    heart_rate = r.heart_rate,
                    hrv_ms = r.hrv_ms,
                    rr_count = r.rr_count,
                    "HRV reading"
                );
            }
            ScanEvent::CameraAccessDenied(reason) => {
                tracing::error!(%reason, "Camera access denied");
            }
            _ => {}
        }
    }
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
