//! Trigram sampling around a target character
//!
//! Flanking characters always come from two different fingers of the target's
//! hand, neither of which is the target's own finger, so a generated trigram
//! never contains a same-finger bigram.

use super::Trigram;
use crate::fingers::{Finger, Hand};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;

/// Upper bound on sampling attempts for one batch
pub const ATTEMPT_BUDGET: usize = 100_000;

/// Requested more distinct trigrams than could be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsufficientTrigrams {
    pub target: char,
    pub requested: usize,
    pub found: usize,
}

impl fmt::Display for InsufficientTrigrams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could only generate {} of {} trigrams for '{}'",
            self.found, self.requested, self.target
        )
    }
}

/// Result of one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrigramBatch {
    pub trigrams: Vec<Trigram>,
    /// Set when fewer than the requested number were found
    pub shortfall: Option<InsufficientTrigrams>,
}

impl TrigramBatch {
    pub fn is_complete(&self) -> bool {
        self.shortfall.is_none()
    }
}

/// Generate up to `count` distinct trigrams with `target` in the middle.
///
/// `others` lists the other fingers of the target's hand with their
/// characters; it must not contain the target's finger. Fingers without
/// characters are never sampled.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    target: char,
    hand: Hand,
    finger: Finger,
    others: &[(Finger, &[char])],
    count: usize,
) -> TrigramBatch {
    debug_assert!(others.iter().all(|(f, _)| *f != finger));

    let pool: Vec<&[char]> = others
        .iter()
        .filter(|(f, chars)| *f != finger && !chars.is_empty())
        .map(|(_, chars)| *chars)
        .collect();

    let mut trigrams = Vec::with_capacity(count);
    let mut seen = HashSet::with_capacity(count);

    if pool.len() >= 2 {
        for _ in 0..ATTEMPT_BUDGET {
            if trigrams.len() >= count {
                break;
            }
            let mut fingers = pool.choose_multiple(rng, 2);
            let (Some(first), Some(last)) = (fingers.next(), fingers.next()) else {
                break;
            };
            let (Some(&c1), Some(&c3)) = (first.choose(rng), last.choose(rng)) else {
                continue;
            };
            let trigram = Trigram::new(c1, target, c3);
            if seen.insert(trigram) {
                trigrams.push(trigram);
            }
        }
    } else {
        log::debug!(
            "'{}' ({} {}) has fewer than two other fingers with characters",
            target,
            hand,
            finger
        );
    }

    let shortfall = (trigrams.len() < count).then(|| InsufficientTrigrams {
        target,
        requested: count,
        found: trigrams.len(),
    });

    TrigramBatch { trigrams, shortfall }
}
