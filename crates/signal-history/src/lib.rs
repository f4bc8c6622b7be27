//! Signal History Buffers
//!
//! Keeps a sliding window of recent `(x, y)` samples per signal plus the
//! lifetime minimum and maximum, for plotting and stats displays. Buffers are
//! single-consumer: all mutation goes through `&mut self`.

mod history;
mod set;

pub use history::{SignalHistory, DEFAULT_MAX_POINTS};
pub use set::HistorySet;

use serde::{Deserialize, Serialize};

/// One sample: x is the shared axis (frame counter), y the signal value
pub type Point = (f64, f64);

/// Read-only snapshot of a signal's buffered samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryExport {
    pub name: String,
    pub points: Vec<Point>,
}

/// Lifetime extrema of a signal; both unset until the first sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub min_val: Option<f64>,
    pub max_val: Option<f64>,
}
