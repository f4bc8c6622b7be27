//! VoroSim Streaming Consumer
//!
//! Headless counterpart of the plotting front end: a controller that polls a
//! telemetry provider, fans each frame out to plot models backed by bounded
//! signal histories, and persists plot layouts as a JSON session file.

pub mod controller;
pub mod error;
pub mod logging;
pub mod plot;
pub mod session;
pub mod settings;
pub mod worker;

pub use controller::{FrameTick, StreamController, TickOutcome, DEFAULT_PLOTS};
pub use error::StreamError;
pub use logging::{init_logging, log_file_name};
pub use plot::{normalize_color, PlotConfig, PlotModel, Series, SignalConfig, StatsUpdate, DEFAULT_COLOR};
pub use session::{SessionConfig, DEFAULT_SESSION_FILE};
pub use settings::{MonitorSettings, ENV_PREFIX};
pub use worker::{StreamStatus, StreamWorker};
