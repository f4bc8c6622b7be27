//! Emulator Publish Loop

use crate::config::EmulatorConfig;
use crate::error::EmulatorError;
use crate::source::ValueSource;
use shm_transport::{TelemetryWriter, TransportError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// A running telemetry producer: one writer fed by one value source
pub struct Emulator {
    config: EmulatorConfig,
    writer: TelemetryWriter,
    source: ValueSource,
}

impl Emulator {
    /// Load the configured source, then create and populate the region
    ///
    /// Source errors surface before the region exists.
    pub fn start(config: EmulatorConfig) -> Result<Self, EmulatorError> {
        let source = ValueSource::from_config(&config)?;
        Self::with_source(config, source)
    }

    /// Create the region and register the configured signals in slots 0..
    pub fn with_source(config: EmulatorConfig, source: ValueSource) -> Result<Self, EmulatorError> {
        let mut writer = TelemetryWriter::initialize(&config.tagname, config.capacity)?;
        for (index, name) in config.signals.iter().enumerate() {
            writer.register_signal(index, name)?;
        }

        info!(
            "Emulator ready on '{}': {} signals at {} Hz ({})",
            config.tagname,
            config.signals.len(),
            config.hz.max(1.0),
            if source.is_replay() { "replay" } else { "synthetic" }
        );

        Ok(Self {
            config,
            writer,
            source,
        })
    }

    /// Publish the next frame, returning the new counter
    pub fn step(&mut self) -> Result<u64, TransportError> {
        let values = self.source.next_values(&self.config.signals);
        self.writer.publish(&values)?;
        Ok(self.writer.counter())
    }

    /// Publish at the configured rate until `stop` is set
    ///
    /// The region is released on every exit path. A publish failure ends the
    /// loop and is returned; otherwise the number of frames published.
    pub async fn run(mut self, stop: Arc<AtomicBool>) -> Result<u64, TransportError> {
        let mut ticker = tokio::time::interval(self.config.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Starting publish loop");
        while !stop.load(Ordering::Relaxed) {
            ticker.tick().await;

            match self.step() {
                Ok(counter) if counter % 600 == 0 => debug!("Published frame {}", counter),
                Ok(_) => {}
                Err(e) => {
                    error!("Publish failed at frame {}: {}", self.writer.counter() + 1, e);
                    self.writer.close();
                    return Err(e);
                }
            }
        }

        let frames = self.writer.counter();
        info!("Publish loop stopped after {} frames", frames);
        self.writer.close();
        Ok(frames)
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Frames published so far
    pub fn counter(&self) -> u64 {
        self.writer.counter()
    }

    /// Stop publishing and release the region
    pub fn shutdown(self) {
        self.writer.close();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::source::{ReplaySource, SyntheticSource};
    use shm_transport::TelemetryReader;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    static NEXT: AtomicUsize = AtomicUsize::new(0);

    fn unique_tag(prefix: &str) -> String {
        format!("vse_{}_{}_{}", prefix, std::process::id(), NEXT.fetch_add(1, Ordering::Relaxed))
    }

    fn config(tag: &str, signals: &[&str]) -> EmulatorConfig {
        EmulatorConfig {
            tagname: tag.to_string(),
            capacity: 8,
            hz: 60.0,
            csv_path: None,
            signals: signals.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_replay_rows_published_cyclically() {
        let tag = unique_tag("replay");
        let replay = ReplaySource::from_reader("engine.rpm,throttle\n0,0.1\n1,0.2\n2,0.3\n".as_bytes()).unwrap();
        let mut emulator =
            Emulator::with_source(config(&tag, &["engine.rpm", "throttle"]), ValueSource::Replay(replay)).unwrap();

        let mut reader = TelemetryReader::new(&tag, 8);
        reader.connect().unwrap();

        for (i, expected) in [0.0, 1.0, 2.0, 0.0, 1.0, 2.0].into_iter().enumerate() {
            let counter = emulator.step().unwrap();
            assert_eq!(counter, i as u64 + 1);
            assert_eq!(reader.read_frame().unwrap()["engine.rpm"], expected);
        }
        assert_eq!(reader.read_header().unwrap().0, 6);
    }

    #[test]
    fn test_signals_occupy_leading_slots() {
        let tag = unique_tag("slots");
        let emulator = Emulator::with_source(
            config(&tag, &["vehicle.speed_kmh", "engine.rpm", "steer"]),
            ValueSource::Synthetic(SyntheticSource::new()),
        )
        .unwrap();

        let mut reader = TelemetryReader::new(&tag, 1);
        reader.connect().unwrap();
        assert_eq!(reader.capacity(), 8);
        assert_eq!(reader.list_signals().unwrap(), vec!["engine.rpm", "steer", "vehicle.speed_kmh"]);
        emulator.shutdown();
    }

    #[test]
    fn test_too_many_signals_for_capacity() {
        let tag = unique_tag("full");
        let mut cfg = config(&tag, &["a", "b", "c"]);
        cfg.capacity = 2;
        let result = Emulator::with_source(cfg, ValueSource::Synthetic(SyntheticSource::new()));
        assert!(matches!(
            result,
            Err(EmulatorError::Transport(TransportError::SlotOutOfRange { index: 2, .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_flag_and_releases_region() {
        let tag = unique_tag("run");
        let emulator = Emulator::with_source(config(&tag, &["brake"]), ValueSource::Synthetic(SyntheticSource::new())).unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(emulator.run(stop.clone()));

        tokio::time::sleep(Duration::from_millis(200)).await;
        stop.store(true, Ordering::Relaxed);
        let frames = handle.await.unwrap().unwrap();

        assert!(frames >= 2);
        let mut reader = TelemetryReader::new(&tag, 8);
        assert!(matches!(reader.connect(), Err(TransportError::NotFound(_))));
    }
}
