//! Keyed Collection of Signal Histories

use crate::history::{SignalHistory, DEFAULT_MAX_POINTS};
use crate::{HistoryExport, Stats};
use std::collections::HashMap;
use tracing::debug;

/// Histories keyed by signal name, in first-observation order
#[derive(Debug, Clone)]
pub struct HistorySet {
    max_points: usize,
    histories: Vec<SignalHistory>,
    index: HashMap<String, usize>,
}

impl HistorySet {
    /// Create an empty set whose histories keep `max_points` samples
    pub fn new(max_points: usize) -> Self {
        Self {
            max_points,
            histories: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Start tracking `signal` without observing a sample; returns false if
    /// it was already tracked
    pub fn track(&mut self, signal: &str) -> bool {
        if self.index.contains_key(signal) {
            return false;
        }
        debug!("Tracking signal '{}'", signal);
        self.index.insert(signal.to_string(), self.histories.len());
        self.histories.push(SignalHistory::new(signal, self.max_points));
        true
    }

    /// Append a sample for `signal`, creating its history on first sight
    pub fn observe(&mut self, signal: &str, x: f64, y: f64) -> bool {
        self.track(signal);
        let i = self.index[signal];
        self.histories[i].observe(x, y)
    }

    /// Observe every tracked signal present in `frame`
    ///
    /// Returns the names whose extrema changed. Frame entries for untracked
    /// signals are ignored.
    pub fn tick(&mut self, frame: &HashMap<String, f64>, x: f64) -> Vec<String> {
        let mut changed = Vec::new();
        for history in &mut self.histories {
            if let Some(&y) = frame.get(history.name()) {
                if history.observe(x, y) {
                    changed.push(history.name().to_string());
                }
            }
        }
        changed
    }

    /// Snapshot of one signal
    pub fn export(&self, signal: &str) -> Option<HistoryExport> {
        self.get(signal).map(SignalHistory::export)
    }

    /// Snapshots of all signals in tracking order
    pub fn export_all(&self) -> Vec<HistoryExport> {
        self.histories.iter().map(SignalHistory::export).collect()
    }

    /// Drop one signal's data but keep tracking it
    pub fn clear(&mut self, signal: &str) -> bool {
        match self.get_mut(signal) {
            Some(history) => {
                history.clear();
                true
            }
            None => false,
        }
    }

    /// Drop every signal's data
    pub fn clear_all(&mut self) {
        for history in &mut self.histories {
            history.clear();
        }
    }

    /// Stop tracking a signal
    pub fn remove(&mut self, signal: &str) -> Option<SignalHistory> {
        let i = self.index.remove(signal)?;
        let removed = self.histories.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        debug!("Stopped tracking signal '{}'", signal);
        Some(removed)
    }

    /// Stats of one signal
    pub fn stats(&self, signal: &str) -> Option<Stats> {
        self.get(signal).map(SignalHistory::stats)
    }

    pub fn get(&self, signal: &str) -> Option<&SignalHistory> {
        self.index.get(signal).map(|&i| &self.histories[i])
    }

    pub fn get_mut(&mut self, signal: &str) -> Option<&mut SignalHistory> {
        match self.index.get(signal) {
            Some(&i) => Some(&mut self.histories[i]),
            None => None,
        }
    }

    pub fn contains(&self, signal: &str) -> bool {
        self.index.contains_key(signal)
    }

    /// Tracked names in tracking order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.histories.iter().map(SignalHistory::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignalHistory> {
        self.histories.iter()
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }
}

impl Default for HistorySet {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_observe_creates_on_first_sight() {
        let mut set = HistorySet::new(10);
        assert!(set.observe("rpm", 1.0, 900.0));
        assert!(set.contains("rpm"));
        assert_eq!(set.export("rpm").unwrap().points, vec![(1.0, 900.0)]);
    }

    #[test]
    fn test_tick_feeds_tracked_only() {
        let mut set = HistorySet::new(10);
        set.track("speed");
        set.track("rpm");

        let changed = set.tick(&frame(&[("speed", 50.0), ("brake", 1.0)]), 7.0);
        assert_eq!(changed, vec!["speed"]);
        assert!(!set.contains("brake"));
        assert!(set.get("rpm").unwrap().is_empty());
        assert_eq!(set.get("speed").unwrap().latest(), Some((7.0, 50.0)));
    }

    #[test]
    fn test_remove_keeps_order_of_rest() {
        let mut set = HistorySet::new(10);
        for name in ["a", "b", "c"] {
            set.track(name);
        }
        assert!(set.remove("a").is_some());
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["b", "c"]);
        set.observe("c", 0.0, 1.0);
        assert_eq!(set.get("c").unwrap().len(), 1);
        assert!(set.remove("a").is_none());
    }

    #[test]
    fn test_clear_keeps_registration() {
        let mut set = HistorySet::new(10);
        set.observe("steer", 0.0, 0.1);
        assert!(set.clear("steer"));
        assert!(set.contains("steer"));
        assert_eq!(set.stats("steer"), Some(Stats::default()));
        assert!(!set.clear("missing"));
    }
}
