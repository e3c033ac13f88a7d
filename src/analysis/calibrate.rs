//! Estimating the per-hand overhead of the ready sequences

use crate::fingers::Hand;
use crate::recording::{Capture, CaptureOutcome, CaptureRequest, RecordError};

/// Time the ready sequence of `hand` as its own target `repetitions` times.
///
/// Each capture spans two ready sequences, so half of its elapsed time is the
/// overhead of one. Returns the mean overhead in seconds, or `None` when the
/// typist quit before any capture finished.
pub fn estimate_bias<C: Capture>(
    capture: &mut C,
    hand: Hand,
    ready: &str,
    repetitions: usize,
) -> Result<Option<f64>, RecordError> {
    let mut halves = Vec::with_capacity(repetitions);

    'reps: for i in 0..repetitions {
        let request = CaptureRequest {
            target: ready.to_string(),
            ready: ready.to_string(),
            hand,
            progress: format!("({}/{})", i + 1, repetitions),
        };
        loop {
            match capture.capture(&request)? {
                CaptureOutcome::Elapsed(elapsed) => {
                    halves.push(elapsed.as_secs_f64() / 2.0);
                    break;
                }
                CaptureOutcome::Cancelled => {
                    if capture.confirm_quit()? {
                        break 'reps;
                    }
                }
            }
        }
    }

    if halves.is_empty() {
        return Ok(None);
    }
    let bias = halves.iter().sum::<f64>() / halves.len() as f64;
    log::info!("Estimated {} hand bias {:.4} s over {} captures", hand, bias, halves.len());
    Ok(Some(bias))
}
