//! Offline analysis of recorded trigram timings

mod calibrate;
mod color;
mod effort;
mod records;

pub use calibrate::estimate_bias;
pub use color::ColorScale;
pub use effort::{AnalysisError, CharEffort, EffortMode, EffortReport, HandEfforts};
pub use records::{ReadError, RecordReader, TrigramRecord};
