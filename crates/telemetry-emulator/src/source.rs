//! Frame Value Sources
//!
//! The emulator either replays rows from a CSV file, looping forever, or
//! generates smooth synthetic waveforms from the time since start.

use crate::config::EmulatorConfig;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One replay row: column name to value
pub type Row = HashMap<String, f64>;

/// Looping replay of pre-loaded rows
#[derive(Debug, Clone)]
pub struct ReplaySource {
    rows: Vec<Row>,
    cursor: usize,
}

impl ReplaySource {
    /// Load a CSV file with a header row
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let source = Self::from_reader(BufReader::new(file))?;
        info!("Loaded {} rows from {}", source.len(), path.display());
        Ok(source)
    }

    /// Parse CSV text
    ///
    /// Cells that are missing or do not parse as numbers become 0.0; extra
    /// cells beyond the header are ignored and blank lines skipped. Rows that
    /// are not valid UTF-8 are decoded lossily, so their broken cells also
    /// read as 0.0. Quoted fields may contain commas and doubled quotes but
    /// not line breaks.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ConfigError> {
        let mut lines = reader.split(b'\n').enumerate().map(|(number, raw)| {
            raw.map(|bytes| match String::from_utf8(bytes) {
                Ok(line) => line,
                Err(e) => {
                    warn!("Replay line {} is not valid UTF-8, decoding lossily", number + 1);
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            })
        });

        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(ConfigError::NoHeaderRow),
        };
        let header = header.strip_prefix('\u{feff}').unwrap_or(&header);
        if header.trim().is_empty() {
            return Err(ConfigError::NoHeaderRow);
        }
        let columns = split_record(header);

        let mut rows = Vec::new();
        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let cells = split_record(&line);
            let row: Row = columns
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    let value = cells.get(i).map(|cell| parse_cell(cell)).unwrap_or(0.0);
                    (column.clone(), value)
                })
                .collect();
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ConfigError::EmptySource);
        }

        debug!("Replay columns: {:?}", columns);
        Ok(Self { rows, cursor: 0 })
    }

    /// Values of `signals` from the current row, then advance (wrapping)
    pub fn next_values(&mut self, signals: &[String]) -> HashMap<String, f64> {
        let row = &self.rows[self.cursor];
        let values = signals
            .iter()
            .map(|name| (name.clone(), row.get(name).copied().unwrap_or(0.0)))
            .collect();

        self.cursor = (self.cursor + 1) % self.rows.len();
        values
    }

    /// Index of the row the next publish will use
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Closed-form waveforms of time since start
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    started: Instant,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Values of `signals` at the current elapsed time
    pub fn next_values(&mut self, signals: &[String]) -> HashMap<String, f64> {
        Self::values_at(signals, self.started.elapsed().as_secs_f64())
    }

    /// Values of `signals` at `t` seconds after start
    pub fn values_at(signals: &[String], t: f64) -> HashMap<String, f64> {
        signals
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), Self::waveform(i, name, t)))
            .collect()
    }

    fn waveform(index: usize, name: &str, t: f64) -> f64 {
        match name {
            "vehicle.speed_kmh" => 100.0 + 20.0 * (t * 0.5).sin(),
            "engine.rpm" => 2000.0 + 1500.0 * (0.5 + 0.5 * (t * 1.2).sin()),
            "throttle" => (t * 0.8).sin().max(0.0),
            "brake" => (t * 0.8 + PI).sin().max(0.0),
            "steer" => (t * 0.7).sin(),
            // Unknown signals get a distinct slow sine each
            _ => (t * (0.3 + 0.1 * index as f64)).sin(),
        }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

/// The value source selected by configuration
#[derive(Debug, Clone)]
pub enum ValueSource {
    Replay(ReplaySource),
    Synthetic(SyntheticSource),
}

impl ValueSource {
    /// Replay if a CSV file is configured and exists, synthetic otherwise
    pub fn from_config(config: &EmulatorConfig) -> Result<Self, ConfigError> {
        match config.replay_path() {
            Some(path) => Ok(ValueSource::Replay(ReplaySource::load(path)?)),
            None => {
                info!("Running in synthetic signal mode");
                Ok(ValueSource::Synthetic(SyntheticSource::new()))
            }
        }
    }

    /// Values for the next frame
    pub fn next_values(&mut self, signals: &[String]) -> HashMap<String, f64> {
        match self {
            ValueSource::Replay(source) => source.next_values(signals),
            ValueSource::Synthetic(source) => source.next_values(signals),
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, ValueSource::Replay(_))
    }
}

/// Split one CSV record, honouring double-quoted fields
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            '\r' if !in_quotes && chars.peek().is_none() => {}
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

fn parse_cell(cell: &str) -> f64 {
    cell.trim().parse().unwrap_or(0.0)
}
