//! Session orchestration: visit every character, record its trigrams

use super::{
    generate, Capture, CaptureOutcome, CaptureRequest, RecordError, SampleSink, SessionCounter,
    TimingSample,
};
use crate::config::Config;
use crate::fingers::{Finger, Hand, HandFingerMap, KeySlot};
use crate::report::{SessionOutcome, SessionSummary, ShortBatch};
use crossterm::style::Stylize;
use itertools::{EitherOrBoth, Itertools};
use rand::seq::SliceRandom;
use rand::Rng;
use std::io::Write;
use std::time::Instant;

/// Knobs of one recording session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub trigrams_per_char: usize,
    pub repeats_per_trigram: usize,
    pub ready_left: String,
    pub ready_right: String,
    /// Shown in the intro, e.g. `Ctrl+C`
    pub cancel_hint: String,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            trigrams_per_char: config.session.trigrams_per_char,
            repeats_per_trigram: config.session.trigram_repeat_times,
            ready_left: config.ready.left.clone(),
            ready_right: config.ready.right.clone(),
            cancel_hint: format!(
                "{}+{}",
                config.ready.cancel_modifier.name(),
                config.ready.cancel_key.to_ascii_uppercase()
            ),
        }
    }

    pub fn ready(&self, hand: Hand) -> &str {
        match hand {
            Hand::Left => &self.ready_left,
            Hand::Right => &self.ready_right,
        }
    }
}

/// Every configured character, finger by finger, right hand first within a
/// finger, alternating hands while both still have characters left.
pub fn visitation_order(map: &HandFingerMap) -> Vec<KeySlot> {
    let mut slots = Vec::with_capacity(map.total_chars());
    for finger in Finger::ALL {
        let left = map.chars(Hand::Left, finger);
        let right = map.chars(Hand::Right, finger);
        for pair in left.iter().zip_longest(right.iter()) {
            let (l, r) = match pair {
                EitherOrBoth::Both(l, r) => (Some(l), Some(r)),
                EitherOrBoth::Left(l) => (Some(l), None),
                EitherOrBoth::Right(r) => (None, Some(r)),
            };
            if let Some(&ch) = r {
                slots.push(KeySlot { finger, hand: Hand::Right, ch });
            }
            if let Some(&ch) = l {
                slots.push(KeySlot { finger, hand: Hand::Left, ch });
            }
        }
    }
    slots
}

/// Shuffle the even and odd positions of `slots` separately, then weave them
/// back together. Hands keep alternating roughly while neither hand's order
/// can be predicted.
pub fn shuffled_order<R: Rng + ?Sized>(rng: &mut R, slots: &[KeySlot]) -> Vec<KeySlot> {
    let mut evens: Vec<KeySlot> = slots.iter().step_by(2).copied().collect();
    let mut odds: Vec<KeySlot> = slots.iter().skip(1).step_by(2).copied().collect();
    evens.shuffle(rng);
    odds.shuffle(rng);
    itertools::interleave(evens, odds).collect()
}

/// One recording session over a hand-finger map
pub struct Session {
    settings: SessionSettings,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    fn print_intro<W: Write>(&self, out: &mut W, counter: &SessionCounter) -> std::io::Result<()> {
        writeln!(
            out,
            "Recording {} characters, {} trigrams each, {} repetitions per trigram ({} captures).",
            counter.chars_total(),
            counter.trigrams_per_char(),
            counter.repeats_per_trigram(),
            counter.total_repeats()
        )?;
        writeln!(out, "Left hand ready sequence:  {}", self.settings.ready_left.as_str().bold())?;
        writeln!(out, "Right hand ready sequence: {}", self.settings.ready_right.as_str().bold())?;
        writeln!(
            out,
            "Tip: press {} to stop; everything recorded so far is kept.",
            self.settings.cancel_hint
        )?;
        out.flush()
    }

    /// Record the whole map.
    ///
    /// Each trigram's line reaches `sink` only once all of its repetitions are
    /// captured. A failing sink aborts the session; a confirmed cancellation
    /// ends it early with [`SessionOutcome::Cancelled`].
    pub fn run<R, C, K, W>(
        &self,
        map: &HandFingerMap,
        rng: &mut R,
        capture: &mut C,
        sink: &mut K,
        out: &mut W,
    ) -> Result<SessionSummary, RecordError>
    where
        R: Rng + ?Sized,
        C: Capture,
        K: SampleSink,
        W: Write,
    {
        let start_time = Instant::now();
        let order = shuffled_order(rng, &visitation_order(map));
        let mut counter = SessionCounter::new(
            order.len(),
            self.settings.trigrams_per_char,
            self.settings.repeats_per_trigram,
        );
        let mut summary = SessionSummary::begin(order.len());

        log::info!(
            "Starting session: {} chars, {} trigrams per char, {} repeats",
            counter.chars_total(),
            counter.trigrams_per_char(),
            counter.repeats_per_trigram()
        );
        self.print_intro(out, &counter)?;

        for (i, slot) in order.iter().enumerate() {
            writeln!(
                out,
                "\n(Char {}/{}) {} {}: {}",
                i + 1,
                order.len(),
                slot.hand,
                slot.finger,
                slot.ch.to_string().bold()
            )?;

            let others = map.other_fingers(slot.hand, slot.finger);
            let batch = generate(
                rng,
                slot.ch,
                slot.hand,
                slot.finger,
                &others,
                self.settings.trigrams_per_char,
            );

            if let Some(shortfall) = &batch.shortfall {
                log::warn!("{}", shortfall);
                writeln!(out, "{} {}", "Warning:".yellow(), shortfall)?;
                if shortfall.found == 0 {
                    summary.skipped_chars.push(slot.ch);
                } else {
                    summary.short_batches.push(ShortBatch {
                        ch: slot.ch,
                        requested: shortfall.requested,
                        found: shortfall.found,
                    });
                }
            }

            let ready = self.settings.ready(slot.hand);
            for trigram in &batch.trigrams {
                let mut timings = Vec::with_capacity(self.settings.repeats_per_trigram);
                for _ in 0..self.settings.repeats_per_trigram {
                    counter.increment();
                    let request = CaptureRequest {
                        target: trigram.to_string(),
                        ready: ready.to_string(),
                        hand: slot.hand,
                        progress: format!("({}/{})", counter.repeats_done(), counter.total_repeats()),
                    };
                    let elapsed = loop {
                        match capture.capture(&request)? {
                            CaptureOutcome::Elapsed(elapsed) => break elapsed,
                            CaptureOutcome::Cancelled => {
                                if capture.confirm_quit()? {
                                    log::info!("Session cancelled after {} trigrams", summary.trigrams_recorded);
                                    summary.chars_processed = counter.chars_done();
                                    return Ok(summary.finish(start_time, SessionOutcome::Cancelled));
                                }
                                log::debug!("Quit not confirmed, retrying {}", trigram);
                            }
                        }
                    };
                    timings.push(elapsed.as_secs_f64());
                }

                let sample = TimingSample::new(*trigram, timings);
                sink.write_sample(&sample)?;
                summary.trigrams_recorded += 1;
                summary.repetitions_recorded += sample.timings.len();
                counter.finish_trigram();
            }

            if let Some(shortfall) = &batch.shortfall {
                counter.skip_trigrams(shortfall.requested - shortfall.found);
            }
            counter.finish_char();
        }

        summary.chars_processed = counter.chars_done();
        log::info!(
            "Session complete: {} trigrams, {} repetitions",
            summary.trigrams_recorded,
            summary.repetitions_recorded
        );
        Ok(summary.finish(start_time, SessionOutcome::Completed))
    }
}
