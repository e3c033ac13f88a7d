//! Reading raw record files back for analysis

use crate::recording::{RecordLineError, TimingSample, Trigram};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A trigram and its fastest timings, ascending
#[derive(Debug, Clone, PartialEq)]
pub struct TrigramRecord {
    pub trigram: Trigram,
    pub timings: Vec<f64>,
}

impl TrigramRecord {
    pub fn mean(&self) -> Option<f64> {
        if self.timings.is_empty() {
            return None;
        }
        Some(self.timings.iter().sum::<f64>() / self.timings.len() as f64)
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: RecordLineError,
    },
}

/// Parses record files, keeping the `n_best` fastest timings per line
pub struct RecordReader {
    n_best: usize,
}

impl RecordReader {
    pub fn new(n_best: usize) -> Self {
        Self { n_best }
    }

    pub fn read(&self, path: &Path) -> Result<Vec<TrigramRecord>, ReadError> {
        let io_err = |source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        let records = self.parse(BufReader::new(file)).map_err(|e| match e {
            ReadError::Io { source, .. } => io_err(source),
            other => other,
        })?;
        log::debug!("Read {} trigram records from {}", records.len(), path.display());
        Ok(records)
    }

    /// Parse records from any reader; blank lines are skipped
    pub fn parse<R: BufRead>(&self, reader: R) -> Result<Vec<TrigramRecord>, ReadError> {
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ReadError::Io {
                path: PathBuf::new(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let sample =
                TimingSample::parse_line(&line).map_err(|source| ReadError::Line { line: idx + 1, source })?;

            let mut timings = sample.timings;
            timings.sort_by(|a, b| a.total_cmp(b));
            timings.truncate(self.n_best);
            records.push(TrigramRecord {
                trigram: sample.trigram,
                timings,
            });
        }
        Ok(records)
    }
}
