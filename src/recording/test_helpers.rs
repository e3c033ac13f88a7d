//! Shared test utilities for the recording modules
//!
//! Builds key event streams with deterministic, strictly increasing timestamps.

use crate::keyboard::{KeyCode, KeyEvent, KeyEventType};
use std::time::{Duration, Instant};

/// Gap between consecutive synthetic events
pub const STEP: Duration = Duration::from_millis(10);

/// Synthetic clock handing out a new timestamp per event
pub struct Clock {
    now: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self { now: Instant::now() }
    }

    /// Timestamp of the most recent event
    pub fn last(&self) -> Instant {
        self.now
    }

    fn tick(&mut self) -> Instant {
        self.now += STEP;
        self.now
    }

    pub fn press(&mut self, key: KeyCode) -> KeyEvent {
        let at = self.tick();
        KeyEvent::new(key, KeyEventType::Press, at)
    }

    pub fn release(&mut self, key: KeyCode) -> KeyEvent {
        let at = self.tick();
        KeyEvent::new(key, KeyEventType::Release, at)
    }
}

/// Key code typing `c`; panics for characters without a key
pub fn key(c: char) -> KeyCode {
    KeyCode::for_char(c).unwrap_or_else(|| panic!("no key for {:?}", c))
}

/// Press and release each character of `text` in turn
pub fn tap_at(clock: &mut Clock, text: &str) -> Vec<KeyEvent> {
    text.chars()
        .flat_map(|c| {
            let code = key(c);
            [clock.press(code), clock.release(code)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_produces_press_release_pairs() {
        let mut clock = Clock::new();
        let events = tap_at(&mut clock, "jf");
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].event_type, KeyEventType::Press);
        assert_eq!(events[1].event_type, KeyEventType::Release);
        assert_eq!(events[2].key, KeyCode(33));
    }

    #[test]
    fn timestamps_strictly_increase() {
        let mut clock = Clock::new();
        let events = tap_at(&mut clock, "der");
        for pair in events.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, STEP);
        }
        assert_eq!(clock.last(), events[5].timestamp);
    }
}
