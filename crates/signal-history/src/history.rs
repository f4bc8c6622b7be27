//! Per-Signal History Buffer

use crate::{HistoryExport, Point, Stats};
use std::collections::VecDeque;

/// Default window length (samples kept per signal)
pub const DEFAULT_MAX_POINTS: usize = 1000;

/// Bounded FIFO of samples for one signal
#[derive(Debug, Clone)]
pub struct SignalHistory {
    name: String,
    max_points: usize,
    points: VecDeque<Point>,
    /// Lifetime extrema; survive eviction, reset by `clear`
    stats: Stats,
}

impl SignalHistory {
    /// Create an empty history keeping at most `max_points` samples
    ///
    /// A window of zero is raised to one.
    pub fn new(name: impl Into<String>, max_points: usize) -> Self {
        let max_points = max_points.max(1);
        Self {
            name: name.into(),
            max_points,
            points: VecDeque::with_capacity(max_points.min(DEFAULT_MAX_POINTS)),
            stats: Stats::default(),
        }
    }

    /// Create a history with the default window
    pub fn with_default_window(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_MAX_POINTS)
    }

    /// Append a sample, returning true if min or max changed
    ///
    /// The first sample after creation or `clear` always reports a change.
    /// NaN samples are buffered but never become an extremum.
    pub fn observe(&mut self, x: f64, y: f64) -> bool {
        let mut changed = self.points.is_empty();

        if !y.is_nan() {
            if self.stats.min_val.map_or(true, |min| y < min) {
                self.stats.min_val = Some(y);
                changed = true;
            }
            if self.stats.max_val.map_or(true, |max| y > max) {
                self.stats.max_val = Some(y);
                changed = true;
            }
        }

        self.points.push_back((x, y));
        self.evict();
        changed
    }

    /// Snapshot of the buffered samples
    pub fn export(&self) -> HistoryExport {
        HistoryExport {
            name: self.name.clone(),
            points: self.points.iter().copied().collect(),
        }
    }

    /// Drop all samples and reset the extrema
    pub fn clear(&mut self) {
        self.points.clear();
        self.stats = Stats::default();
    }

    /// Change the window, evicting immediately if it shrank
    pub fn set_max_points(&mut self, max_points: usize) {
        self.max_points = max_points.max(1);
        self.evict();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Lifetime `(min_val, max_val)`
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<Point> {
        self.points.back().copied()
    }

    /// Buffered samples, oldest first
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// Drop the oldest samples in one pass
    fn evict(&mut self) {
        let excess = self.points.len().saturating_sub(self.max_points);
        if excess > 0 {
            self.points.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_eviction_keeps_newest() {
        let mut history = SignalHistory::new("speed", 3);
        for (i, y) in [1.0, 2.0, 3.0, 4.0, 5.0].into_iter().enumerate() {
            history.observe(i as f64, y);
        }

        let ys: Vec<f64> = history.points().map(|p| p.1).collect();
        assert_eq!(ys, vec![3.0, 4.0, 5.0]);

        // Extrema are lifetime, not windowed
        let stats = history.stats();
        assert_eq!(stats.min_val, Some(1.0));
        assert_eq!(stats.max_val, Some(5.0));
    }

    #[test]
    fn test_stats_change_flag() {
        let mut history = SignalHistory::new("rpm", 10);
        assert!(history.observe(0.0, 10.0));
        assert!(history.observe(1.0, 20.0));
        assert!(!history.observe(2.0, 15.0));
        assert!(!history.observe(3.0, 20.0)); // equal to max is not new
        assert!(history.observe(4.0, 5.0));
    }

    #[test]
    fn test_clear_resets_data_not_name() {
        let mut history = SignalHistory::new("brake", 5);
        history.observe(0.0, 0.3);
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.stats(), Stats::default());
        assert_eq!(history.name(), "brake");
        assert!(history.observe(1.0, 0.9));
    }

    #[test]
    fn test_export_snapshot() {
        let mut history = SignalHistory::new("steer", 4);
        history.observe(10.0, -0.5);
        history.observe(11.0, 0.25);

        let export = history.export();
        assert_eq!(export.name, "steer");
        assert_eq!(export.points, vec![(10.0, -0.5), (11.0, 0.25)]);
    }

    #[test]
    fn test_nan_never_becomes_extremum() {
        let mut history = SignalHistory::new("noise", 4);
        history.observe(0.0, 1.0);
        assert!(!history.observe(1.0, f64::NAN));
        assert_eq!(history.len(), 2);
        assert_eq!(history.stats().min_val, Some(1.0));
        assert_eq!(history.stats().max_val, Some(1.0));
    }

    #[test]
    fn test_first_sample_always_reports_change() {
        let mut history = SignalHistory::new("noise", 3);
        assert!(history.observe(0.0, f64::NAN));
        assert_eq!(history.stats(), Stats::default());

        assert!(history.observe(1.0, 2.0));
        assert_eq!(history.stats().min_val, Some(2.0));
        assert_eq!(history.stats().max_val, Some(2.0));

        history.clear();
        assert!(history.observe(2.0, f64::NAN));
    }

    #[test]
    fn test_shrinking_window_evicts() {
        let mut history = SignalHistory::new("throttle", 10);
        for i in 0..10 {
            history.observe(i as f64, i as f64);
        }
        history.set_max_points(4);
        assert_eq!(history.len(), 4);
        assert_eq!(history.latest(), Some((9.0, 9.0)));
        assert_eq!(history.points().next(), Some(&(6.0, 6.0)));
    }

    #[test]
    fn test_zero_window_raised_to_one() {
        let mut history = SignalHistory::new("x", 0);
        history.observe(0.0, 1.0);
        history.observe(1.0, 2.0);
        assert_eq!(history.max_points(), 1);
        assert_eq!(history.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_window_never_exceeded(
            max_points in 1usize..50,
            ys in proptest::collection::vec(-1e6f64..1e6, 0..200),
        ) {
            let mut history = SignalHistory::new("p", max_points);
            for (i, y) in ys.iter().enumerate() {
                history.observe(i as f64, *y);
                prop_assert!(history.len() <= max_points);
            }

            if let Some(min) = ys.iter().cloned().reduce(f64::min) {
                prop_assert_eq!(history.stats().min_val, Some(min));
            }
            if let Some(max) = ys.iter().cloned().reduce(f64::max) {
                prop_assert_eq!(history.stats().max_val, Some(max));
            }
        }
    }
}
