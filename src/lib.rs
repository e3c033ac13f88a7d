//! Effort Grid - measure how much effort each key takes to type
//!
//! Records how long it takes to type short trigrams around every configured
//! character, one hand at a time, and turns the recorded timings into a
//! per-character effort grid.

pub mod analysis;
pub mod config;
pub mod fingers;
pub mod keyboard;
pub mod recording;
pub mod report;

pub use config::Config;
