//! Session summary and export functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// How a recording session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    /// Every character was visited
    Completed,
    /// The typist confirmed quitting early
    Cancelled,
}

/// A character that got fewer trigrams than requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortBatch {
    pub ch: char,
    pub requested: usize,
    pub found: usize,
}

/// Totals for one recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session start (RFC 3339)
    pub started_at: String,
    /// Application version
    pub version: String,
    /// Wall-clock duration in seconds
    pub elapsed_secs: f64,
    pub outcome: SessionOutcome,
    /// Characters configured
    pub chars_total: usize,
    /// Characters fully visited (skipped ones included)
    pub chars_processed: usize,
    /// Trigram lines written
    pub trigrams_recorded: usize,
    /// Timings written across all lines
    pub repetitions_recorded: usize,
    /// Characters for which no trigram could be generated
    pub skipped_chars: Vec<char>,
    pub short_batches: Vec<ShortBatch>,
}

impl SessionSummary {
    /// Start an empty summary for a session beginning now
    pub fn begin(chars_total: usize) -> Self {
        let now: DateTime<Utc> = Utc::now();
        Self {
            started_at: now.to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            elapsed_secs: 0.0,
            outcome: SessionOutcome::Completed,
            chars_total,
            chars_processed: 0,
            trigrams_recorded: 0,
            repetitions_recorded: 0,
            skipped_chars: Vec::new(),
            short_batches: Vec::new(),
        }
    }

    /// Stamp the final duration and outcome
    pub fn finish(mut self, start_time: Instant, outcome: SessionOutcome) -> Self {
        self.elapsed_secs = start_time.elapsed().as_secs_f64();
        self.outcome = outcome;
        self
    }

    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed_secs / 60.0
    }

    /// Export summary to JSON file
    pub fn export_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Export summary to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_summary_is_empty() {
        let summary = SessionSummary::begin(30);
        assert_eq!(summary.chars_total, 30);
        assert_eq!(summary.trigrams_recorded, 0);
        assert_eq!(summary.outcome, SessionOutcome::Completed);
        assert!(!summary.version.is_empty());
        assert!(DateTime::parse_from_rfc3339(&summary.started_at).is_ok());
    }

    #[test]
    fn finish_sets_outcome() {
        let summary = SessionSummary::begin(1).finish(Instant::now(), SessionOutcome::Cancelled);
        assert_eq!(summary.outcome, SessionOutcome::Cancelled);
        assert!(summary.elapsed_secs >= 0.0);
    }

    #[test]
    fn json_contains_totals() {
        let mut summary = SessionSummary::begin(2);
        summary.skipped_chars.push('q');
        let json = summary.to_json().unwrap();
        assert!(json.contains("\"chars_total\": 2"));
        assert!(json.contains("\"outcome\": \"completed\""));
        assert!(json.contains("\"q\""));
    }

    #[test]
    fn export_json_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        SessionSummary::begin(3).export_json(&path).unwrap();
        let loaded: SessionSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.chars_total, 3);
    }
}
