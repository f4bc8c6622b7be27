//! VoroSim Monitor - Main Entry Point
//!
//! Usage: `vorosim-monitor [settings.toml]`

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;
use telemetry_stream::{init_logging, MonitorSettings, SessionConfig, StreamController, StreamStatus, StreamWorker};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = MonitorSettings::load(settings_path.as_deref())?;
    init_logging(settings.log_dir.as_deref())?;

    info!("=== VoroSim Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let (status_tx, mut status_rx) = mpsc::channel(32);
    let worker = StreamWorker::new(settings.read_period(), status_tx);
    let stop = worker.stop_handle();

    let ctrl_c_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            ctrl_c_stop.store(true, Ordering::Relaxed);
        }
    });

    let mut controller = StreamController::new(settings.provider_settings(), settings.max_points);
    let target = controller.target();
    while let Err(e) = controller.select_target(target) {
        if stop.load(Ordering::Relaxed) {
            return Ok(());
        }
        warn!("Waiting for telemetry on '{}': {}", settings.tagname, e);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    if let Some(session) = SessionConfig::autoload(&settings.session_path()) {
        controller.apply_session(&session)?;
    }

    if controller.plots().all(|(_, plot)| plot.is_empty()) {
        let signals = if settings.signals.is_empty() {
            controller.available_signals()?
        } else {
            settings.signals.clone()
        };
        let added = controller.add_signals_to_plot("top", &signals)?;
        info!("Plotting {} signals", added);
    }

    tokio::spawn(async move {
        while let Some(status) = status_rx.recv().await {
            match status {
                StreamStatus::Error(reason) => warn!("Stream error: {}", reason),
                other => info!("Stream status: {:?}", other),
            }
        }
    });

    let latest = worker.subscribe();
    let report_period = settings.report_period();
    let reporter = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(report_period);
        loop {
            ticker.tick().await;
            if let Some(tick) = latest.borrow().as_ref() {
                let mut values: Vec<_> = tick.frame.iter().collect();
                values.sort_by(|a, b| a.0.cmp(b.0));
                info!("Frame {} @ {:.3}: {:?}", tick.counter, tick.timestamp, values);
            }
        }
    });

    let reads = worker.run(&mut controller).await?;
    reporter.abort();

    info!("Monitor exited after {} reads", reads);
    for (key, plot) in controller.plots() {
        for name in plot.signal_names() {
            if let Some(stats) = plot.stats(&name) {
                info!("[{}] {}: min={:?} max={:?}", key, name, stats.min_val, stats.max_val);
            }
        }
    }
    Ok(())
}
