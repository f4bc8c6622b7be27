//! Async Polling Worker

use crate::controller::{FrameTick, StreamController, TickOutcome};
use crate::error::StreamError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Lifecycle events reported by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Connecting,
    Streaming,
    Error(String),
    Stopped,
}

/// Drives a controller at a fixed rate until stopped
pub struct StreamWorker {
    period: Duration,
    stop: Arc<AtomicBool>,
    status_tx: mpsc::Sender<StreamStatus>,
    latest_tx: watch::Sender<Option<FrameTick>>,
}

impl StreamWorker {
    /// Poll once per `period` (see `MonitorSettings::read_period`)
    pub fn new(period: Duration, status_tx: mpsc::Sender<StreamStatus>) -> Self {
        let (latest_tx, _) = watch::channel(None);
        Self {
            period,
            stop: Arc::new(AtomicBool::new(false)),
            status_tx,
            latest_tx,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Receiver that always holds the most recent successful read
    pub fn subscribe(&self) -> watch::Receiver<Option<FrameTick>> {
        self.latest_tx.subscribe()
    }

    /// Flag that ends `run` at its next iteration when set
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    fn report(&self, status: StreamStatus) {
        // Non-blocking: a slow status consumer must not stall polling
        let _ = self.status_tx.try_send(status);
    }

    /// Start the stream and poll until the stop flag is set
    ///
    /// Read failures are reported once per failure streak and retried on the
    /// next tick. The controller is stopped and disconnected on exit. Returns
    /// the number of successful reads.
    pub async fn run(&self, controller: &mut StreamController) -> Result<u64, StreamError> {
        self.report(StreamStatus::Connecting);
        if let Err(e) = controller.start_stream() {
            self.report(StreamStatus::Error(e.to_string()));
            self.report(StreamStatus::Stopped);
            return Err(e);
        }
        self.report(StreamStatus::Streaming);
        info!("Stream worker polling every {:?}", self.period);

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut reads = 0u64;
        let mut failing = false;

        while !self.stop.load(Ordering::Relaxed) {
            ticker.tick().await;

            match controller.tick() {
                TickOutcome::Frame(tick) => {
                    reads += 1;
                    if failing {
                        info!("Stream recovered");
                        failing = false;
                        self.report(StreamStatus::Streaming);
                    }
                    self.latest_tx.send_replace(Some(tick));
                }
                TickOutcome::Failed(reason) => {
                    if !failing {
                        failing = true;
                        self.report(StreamStatus::Error(reason));
                    }
                }
                TickOutcome::Idle => {
                    warn!("Controller went idle, stopping worker");
                    break;
                }
            }
        }

        controller.stop_stream(true);
        self.report(StreamStatus::Stopped);
        info!("Stream worker stopped after {} reads", reads);
        Ok(reads)
    }
}
