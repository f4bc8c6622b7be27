//! VoroSim Telemetry Emulator - Main Entry Point
//!
//! Usage: `vorosim-emulator [settings.toml]`

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use telemetry_emulator::{init_logging, Emulator, EmulatorConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== VoroSim Emulator v{} ===", env!("CARGO_PKG_VERSION"));

    let settings_path = std::env::args().nth(1).map(PathBuf::from);
    let config = EmulatorConfig::load(settings_path.as_deref())?;
    if config.csv_path.is_some() && config.replay_path().is_none() {
        warn!("Replay file {:?} not found, falling back to synthetic signals", config.csv_path);
    }

    let emulator = Emulator::start(config)?;

    let stop = Arc::new(AtomicBool::new(false));
    let ctrl_c_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            ctrl_c_stop.store(true, Ordering::Relaxed);
        }
    });

    let frames = emulator.run(stop).await?;
    info!("Emulator exited after {} frames", frames);
    Ok(())
}
