//! Headless Plot Model
//!
//! A plot is an ordered set of tracks. Each track pairs a signal history with
//! the display style a renderer needs (color and visibility). The model is
//! fed one shared frame per tick and can round-trip its track list through
//! the session config.

use crate::error::StreamError;
use serde::{Deserialize, Serialize};
use shm_transport::Frame;
use signal_history::{HistorySet, Point, Stats};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Color given to tracks added without one
pub const DEFAULT_COLOR: &str = "#ffffff";

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_visible() -> bool {
    true
}

/// Persisted form of one track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalConfig {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

/// Persisted form of a plot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub signals: Vec<SignalConfig>,
}

/// Extrema change to push to a stats display
#[derive(Debug, Clone, PartialEq)]
pub struct StatsUpdate {
    pub signal: String,
    pub stats: Stats,
}

/// Everything a renderer needs to draw one track
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: String,
    pub visible: bool,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone)]
struct TrackStyle {
    color: String,
    visible: bool,
}

/// A plot's tracks and their histories
#[derive(Debug, Clone)]
pub struct PlotModel {
    title: String,
    histories: HistorySet,
    styles: HashMap<String, TrackStyle>,
}

impl PlotModel {
    /// Create an empty plot whose tracks keep `max_points` samples
    pub fn new(title: impl Into<String>, max_points: usize) -> Self {
        Self {
            title: title.into(),
            histories: HistorySet::new(max_points),
            styles: HashMap::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Add a track; returns false if the signal is already plotted
    pub fn add_signal(&mut self, signal: &str, color: Option<&str>) -> Result<bool, StreamError> {
        let color = match color {
            Some(c) => normalize_color(c)?,
            None => default_color(),
        };

        if !self.histories.track(signal) {
            return Ok(false);
        }

        debug!("Plot '{}': added signal '{}'", self.title, signal);
        self.styles.insert(signal.to_string(), TrackStyle { color, visible: true });
        Ok(true)
    }

    /// Remove a track and its data
    pub fn remove_signal(&mut self, signal: &str) -> bool {
        self.styles.remove(signal);
        self.histories.remove(signal).is_some()
    }

    /// Remove every track
    pub fn clear_signals(&mut self) {
        let names: Vec<String> = self.histories.names().map(str::to_string).collect();
        for name in names {
            self.remove_signal(&name);
        }
    }

    /// Drop samples and extrema but keep the tracks
    pub fn reset_data(&mut self) {
        self.histories.clear_all();
    }

    pub fn set_signal_visible(&mut self, signal: &str, visible: bool) -> bool {
        match self.styles.get_mut(signal) {
            Some(style) => {
                style.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn set_signal_color(&mut self, signal: &str, color: &str) -> Result<bool, StreamError> {
        let color = normalize_color(color)?;
        Ok(match self.styles.get_mut(signal) {
            Some(style) => {
                style.color = color;
                true
            }
            None => false,
        })
    }

    /// Feed one frame at shared x position `x`
    ///
    /// Tracks whose signal is missing from the frame are skipped. Returns the
    /// extrema changes in track order.
    pub fn tick(&mut self, frame: &Frame, x: f64) -> Vec<StatsUpdate> {
        self.histories
            .tick(frame, x)
            .into_iter()
            .map(|signal| {
                let stats = self.histories.stats(&signal).unwrap_or_default();
                StatsUpdate { signal, stats }
            })
            .collect()
    }

    /// Tracks ready for drawing, in insertion order
    pub fn series(&self) -> Vec<Series> {
        self.histories
            .iter()
            .map(|history| {
                let style = &self.styles[history.name()];
                Series {
                    name: history.name().to_string(),
                    color: style.color.clone(),
                    visible: style.visible,
                    points: history.points().copied().collect(),
                }
            })
            .collect()
    }

    pub fn stats(&self, signal: &str) -> Option<Stats> {
        self.histories.stats(signal)
    }

    /// Plotted signal names in insertion order
    pub fn signal_names(&self) -> Vec<String> {
        self.histories.names().map(str::to_string).collect()
    }

    pub fn contains(&self, signal: &str) -> bool {
        self.histories.contains(signal)
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// Track list for the session config
    pub fn export_config(&self) -> PlotConfig {
        PlotConfig {
            title: self.title.clone(),
            signals: self
                .histories
                .names()
                .map(|name| {
                    let style = &self.styles[name];
                    SignalConfig {
                        name: name.to_string(),
                        color: style.color.clone(),
                        visible: style.visible,
                    }
                })
                .collect(),
        }
    }

    /// Replace the track list from a session config
    ///
    /// Entries without a name are skipped; unusable colors fall back to
    /// white. The title is kept unless the config carries one.
    pub fn import_config(&mut self, config: &PlotConfig) {
        self.clear_signals();
        if !config.title.is_empty() {
            self.title = config.title.clone();
        }

        for entry in &config.signals {
            if entry.name.is_empty() {
                continue;
            }

            if self.add_signal(&entry.name, Some(&entry.color)).is_err() {
                warn!(
                    "Plot '{}': invalid color '{}' for '{}', using {}",
                    self.title, entry.color, entry.name, DEFAULT_COLOR
                );
                // Cannot fail: the default color is valid
                let _ = self.add_signal(&entry.name, None);
            }
            self.set_signal_visible(&entry.name, entry.visible);
        }
    }
}

/// Validate `#RRGGBB` and lowercase it
pub fn normalize_color(color: &str) -> Result<String, StreamError> {
    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(StreamError::InvalidColor(color.to_string()));
    }
    Ok(format!("#{}", hex.to_ascii_lowercase()))
}
