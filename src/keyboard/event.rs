//! Keyboard event types and the device_query polling listener

use super::KeyCode;
use device_query::{DeviceQuery, DeviceState};
use std::sync::mpsc;
use std::time::Instant;

/// Type of keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventType {
    /// Key was pressed down
    Press,
    /// Key was released
    Release,
}

/// A keyboard event with timing information
#[derive(Debug, Clone)]
pub struct KeyEvent {
    /// The key code
    pub key: KeyCode,
    /// Type of event (press/release)
    pub event_type: KeyEventType,
    /// When the event happened
    pub timestamp: Instant,
}

impl KeyEvent {
    pub fn new(key: KeyCode, event_type: KeyEventType, timestamp: Instant) -> Self {
        Self {
            key,
            event_type,
            timestamp,
        }
    }
}

/// Keyboard listener that polls the global key state for changes
pub struct KeyboardListener {
    device_state: DeviceState,
    last_keys: Vec<device_query::Keycode>,
    event_tx: mpsc::Sender<KeyEvent>,
}

impl KeyboardListener {
    /// Create a new keyboard listener
    pub fn new(event_tx: mpsc::Sender<KeyEvent>) -> Self {
        Self {
            device_state: DeviceState::new(),
            last_keys: Vec::new(),
            event_tx,
        }
    }

    /// Poll for keyboard state changes.
    ///
    /// Returns `None` once the receiving side has hung up, otherwise the
    /// number of events forwarded.
    pub fn poll(&mut self) -> Option<usize> {
        let now = Instant::now();

        let current_keys = self.device_state.get_keys();
        let mut event_count = 0;

        // Releases first so a fast key change on the same poll keeps its order
        for key in &self.last_keys {
            if !current_keys.contains(key) {
                let event = KeyEvent::new(KeyCode::from(*key), KeyEventType::Release, now);
                self.event_tx.send(event).ok()?;
                event_count += 1;
            }
        }

        for key in &current_keys {
            if !self.last_keys.contains(key) {
                let event = KeyEvent::new(KeyCode::from(*key), KeyEventType::Press, now);
                self.event_tx.send(event).ok()?;
                event_count += 1;
            }
        }

        self.last_keys = current_keys;
        Some(event_count)
    }
}
