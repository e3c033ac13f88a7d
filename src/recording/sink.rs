//! Append-only destination for timing samples

use super::TimingSample;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("cannot write samples to {target}: {source}")]
pub struct SinkWriteError {
    pub target: String,
    #[source]
    pub source: io::Error,
}

/// Where finished samples go
pub trait SampleSink {
    /// Append one sample; either the whole line lands or nothing does
    fn write_sample(&mut self, sample: &TimingSample) -> Result<(), SinkWriteError>;
}

/// Raw record file, opened and closed around every append
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    /// Prepare `path` for a new session.
    ///
    /// Refuses to reuse an existing file unless `force` is set, in which case
    /// the old file is removed. Parent directories are created as needed.
    pub fn create(path: impl Into<PathBuf>, force: bool) -> Result<Self, SinkWriteError> {
        let path = path.into();
        let fail = |source: io::Error| SinkWriteError {
            target: path.display().to_string(),
            source,
        };

        if path.exists() {
            if !force {
                return Err(fail(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "file already exists (use --force to overwrite)",
                )));
            }
            fs::remove_file(&path).map_err(fail)?;
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(fail)?;
        }
        // Touch the file so an unwritable destination fails before recording starts
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(fail)?;

        Ok(Self { path })
    }

    /// Append to an existing file without any checks
    pub fn open_existing(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSink for RecordFile {
    fn write_sample(&mut self, sample: &TimingSample) -> Result<(), SinkWriteError> {
        let line = sample.to_line();
        let write = || -> io::Result<()> {
            let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            file.write_all(line.as_bytes())?;
            file.flush()
        };
        write().map_err(|source| SinkWriteError {
            target: self.path.display().to_string(),
            source,
        })?;
        log::debug!("Appended {} to {}", sample.trigram, self.path.display());
        Ok(())
    }
}

/// In-memory sink, handy for dry runs and tests
impl SampleSink for Vec<TimingSample> {
    fn write_sample(&mut self, sample: &TimingSample) -> Result<(), SinkWriteError> {
        self.push(sample.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::Trigram;

    fn sample(t: &str, timings: &[f64]) -> TimingSample {
        TimingSample::new(t.parse().unwrap(), timings.to_vec())
    }

    #[test]
    fn appends_whole_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw").join("record.txt");
        let mut file = RecordFile::create(&path, false).unwrap();

        file.write_sample(&sample("der", &[0.25, 0.5])).unwrap();
        file.write_sample(&sample("sef", &[0.125])).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "der 0.25 0.5\nsef 0.125\n");
    }

    #[test]
    fn existing_file_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.txt");
        fs::write(&path, "old 1\n").unwrap();

        let err = RecordFile::create(&path, false).unwrap_err();
        assert_eq!(err.source.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path).unwrap(), "old 1\n");

        RecordFile::create(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn unwritable_destination_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        let mut file = RecordFile::open_existing(dir.path());
        let err = file.write_sample(&sample("abc", &[0.1])).unwrap_err();
        assert!(err.to_string().contains("cannot write samples"));
    }

    #[test]
    fn vec_sink_collects_samples() {
        let mut sink: Vec<TimingSample> = Vec::new();
        sink.write_sample(&TimingSample::new(Trigram::new('a', 'b', 'c'), vec![1.0]))
            .unwrap();
        assert_eq!(sink.len(), 1);
    }
}
