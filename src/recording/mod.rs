//! Trigram recording: sampling, the timing state machine, and sessions

mod capture;
mod counter;
mod generator;
pub mod machine;
mod session;
mod sink;
mod trigram;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use capture::{Capture, CaptureOutcome, CaptureRequest, KeyboardCapture};
pub use counter::SessionCounter;
pub use generator::{generate, InsufficientTrigrams, TrigramBatch, ATTEMPT_BUDGET};
pub use machine::{CaptureTarget, RecordingState, Signal, TimingMachine};
pub use session::{shuffled_order, visitation_order, Session, SessionSettings};
pub use sink::{RecordFile, SampleSink, SinkWriteError};
pub use trigram::{RecordLineError, TimingSample, Trigram};

use crate::keyboard::SourceError;
use thiserror::Error;

/// Failures that end a recording session
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Sink(#[from] SinkWriteError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("console I/O failed: {0}")]
    Console(#[from] std::io::Error),
}
