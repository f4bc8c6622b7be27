//! Stream Controller
//!
//! Owns the selected provider and the plot models. Each `tick` reads one
//! header and frame and fans the frame out to every plot, using the frame
//! counter as the shared x coordinate.

use crate::error::StreamError;
use crate::plot::{PlotModel, StatsUpdate};
use crate::session::SessionConfig;
use shm_transport::{Frame, ProviderKind, ProviderSettings, TelemetryProvider};
use signal_history::DEFAULT_MAX_POINTS;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Plots created by `StreamController::new`
pub const DEFAULT_PLOTS: [(&str, &str); 2] = [("top", "Graph 1"), ("bottom", "Graph 2")];

/// One successful read, as fed to the plots
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTick {
    pub counter: u64,
    pub timestamp: f64,
    pub frame: Frame,
    /// False when the counter has not moved since the previous tick
    pub fresh: bool,
    /// Extrema changes keyed by plot
    pub stats: Vec<(String, StatsUpdate)>,
}

/// Result of one poll
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Not streaming or no connected provider
    Idle,
    /// Read succeeded and plots were updated
    Frame(FrameTick),
    /// Read failed; the next tick retries
    Failed(String),
}

/// Provider selection, stream state and plots
pub struct StreamController {
    target: ProviderKind,
    settings: ProviderSettings,
    provider: Option<Box<dyn TelemetryProvider>>,
    plots: BTreeMap<String, PlotModel>,
    max_points: usize,
    running: bool,
    last_counter: Option<u64>,
}

impl StreamController {
    /// Controller with the default "top" and "bottom" plots and no provider
    pub fn new(settings: ProviderSettings, max_points: usize) -> Self {
        let plots = DEFAULT_PLOTS
            .iter()
            .map(|(key, title)| (key.to_string(), PlotModel::new(*title, max_points)))
            .collect();

        Self {
            target: ProviderKind::default(),
            settings,
            provider: None,
            plots,
            max_points,
            running: false,
            last_counter: None,
        }
    }

    pub fn target(&self) -> ProviderKind {
        self.target
    }

    /// Switch provider backend and connect to it
    ///
    /// The previous provider is disconnected first. If the new one fails to
    /// connect no provider is left selected and the error is returned.
    pub fn select_target(&mut self, kind: ProviderKind) -> Result<(), StreamError> {
        if let Some(mut old) = self.provider.take() {
            old.disconnect();
        }
        self.target = kind;
        self.last_counter = None;

        let mut provider = kind.build(&self.settings);
        match provider.connect() {
            Ok(()) => {
                info!("Switched provider to: {}", kind);
                self.provider = Some(provider);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to connect provider {}: {}", kind, e);
                Err(e.into())
            }
        }
    }

    /// Begin feeding plots on `tick`, connecting first if needed
    pub fn start_stream(&mut self) -> Result<(), StreamError> {
        if self.running {
            return Ok(());
        }

        if self.provider.is_none() {
            self.provider = Some(self.target.build(&self.settings));
        }
        let provider = self.provider.as_mut().ok_or(StreamError::NoProvider)?;

        if !provider.is_connected() {
            if let Err(e) = provider.connect() {
                warn!("Failed to connect provider {}: {}", self.target, e);
                return Err(e.into());
            }
        }

        self.running = true;
        info!("Streaming started");
        Ok(())
    }

    /// Stop feeding plots, optionally releasing the provider's mapping
    pub fn stop_stream(&mut self, disconnect: bool) {
        if self.running {
            info!("Streaming stopped");
        }
        self.running = false;

        if disconnect {
            if let Some(provider) = self.provider.as_mut() {
                provider.disconnect();
            }
            self.last_counter = None;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_connected(&self) -> bool {
        self.provider.as_ref().is_some_and(|p| p.is_connected())
    }

    /// Read one frame and feed it to every plot
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        let provider = match self.provider.as_mut() {
            Some(p) if p.is_connected() => p,
            _ => return TickOutcome::Idle,
        };

        let read = provider
            .read_header()
            .and_then(|(counter, timestamp)| provider.read_frame().map(|frame| (counter, timestamp, frame)));
        let (counter, timestamp, frame) = match read {
            Ok(read) => read,
            Err(e) => {
                warn!("Read failed: {}", e);
                return TickOutcome::Failed(e.to_string());
            }
        };

        let fresh = self.last_counter != Some(counter);
        self.last_counter = Some(counter);

        let x = counter as f64;
        let mut stats = Vec::new();
        for (key, plot) in self.plots.iter_mut() {
            for update in plot.tick(&frame, x) {
                stats.push((key.clone(), update));
            }
        }

        TickOutcome::Frame(FrameTick {
            counter,
            timestamp,
            frame,
            fresh,
            stats,
        })
    }

    /// Signals the connected provider currently publishes, sorted
    pub fn available_signals(&mut self) -> Result<Vec<String>, StreamError> {
        let provider = self.provider.as_mut().ok_or(StreamError::NoProvider)?;
        Ok(provider.list_signals()?)
    }

    /// Add tracks to a plot, skipping ones already present
    ///
    /// Returns how many were added.
    pub fn add_signals_to_plot(&mut self, plot: &str, signals: &[String]) -> Result<usize, StreamError> {
        let plot = self
            .plots
            .get_mut(plot)
            .ok_or_else(|| StreamError::UnknownPlot(plot.to_string()))?;

        let mut added = 0;
        for signal in signals {
            if plot.add_signal(signal, None)? {
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn plot(&self, key: &str) -> Option<&PlotModel> {
        self.plots.get(key)
    }

    pub fn plot_mut(&mut self, key: &str) -> Option<&mut PlotModel> {
        self.plots.get_mut(key)
    }

    /// Plots keyed by name, in key order
    pub fn plots(&self) -> impl Iterator<Item = (&str, &PlotModel)> {
        self.plots.iter().map(|(k, p)| (k.as_str(), p))
    }

    /// Snapshot of the target and plot layouts
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            selected_target: Some(self.target.display_name().to_string()),
            plots: self
                .plots
                .iter()
                .map(|(key, plot)| (key.clone(), plot.export_config()))
                .collect(),
            ..Default::default()
        }
    }

    /// Restore a saved session
    ///
    /// A running stream is paused while the session is applied and resumed
    /// afterwards. Unknown targets are logged and the current one kept; plots
    /// missing from this controller are created.
    pub fn apply_session(&mut self, session: &SessionConfig) -> Result<(), StreamError> {
        let was_running = self.running;
        if was_running {
            self.stop_stream(false);
        }

        if let Some(name) = session.selected_target.as_deref().filter(|n| !n.is_empty()) {
            match ProviderKind::from_name(name) {
                Some(kind) if kind == self.target && self.is_connected() => {}
                Some(kind) => {
                    if let Err(e) = self.select_target(kind) {
                        debug!("Session target not connected yet: {}", e);
                    }
                }
                None => warn!("Target '{}' not found. Keeping current.", name),
            }
        }

        for (key, config) in &session.plots {
            let max_points = self.max_points;
            self.plots
                .entry(key.clone())
                .or_insert_with(|| PlotModel::new(key.clone(), max_points))
                .import_config(config);
        }

        if was_running {
            self.start_stream()?;
        }
        Ok(())
    }

    /// Stop and disconnect
    pub fn shutdown(&mut self) {
        self.stop_stream(true);
        self.provider = None;
    }
}

impl Default for StreamController {
    fn default() -> Self {
        Self::new(ProviderSettings::default(), DEFAULT_MAX_POINTS)
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.as_mut() {
            provider.disconnect();
        }
    }
}
