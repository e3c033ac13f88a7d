//! Key event state machine for timing one trigram
//!
//! The typist enters the ready sequence, the target string, then the ready
//! sequence again. The clock runs from the release that completes the first
//! ready sequence to the release that completes the second one, so only the
//! target string is measured.
//!
//! [`transition`] is a pure function over [`MachineState`]; [`TimingMachine`]
//! owns one state for the duration of a single capture.

use crate::keyboard::{get_key_info, KeyCode, KeyEvent, KeyEventType, Modifier};
use std::fmt;
use std::time::{Duration, Instant};

/// What one capture is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    #[default]
    NotStarted,
    AwaitingStartSequence,
    AwaitingTrigram { started_at: Instant },
    AwaitingEndSequence { started_at: Instant },
    Completed { elapsed: Duration },
    Cancelled,
}

impl RecordingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Cancelled)
    }
}

/// The sequence being typed when a mismatch happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    StartSequence,
    Target,
    EndSequence,
}

/// A key that diverged from the expected sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMismatch {
    pub phase: Phase,
    pub typed: String,
    pub expected: String,
}

impl KeyMismatch {
    /// Whether the capture went back to the start sequence
    pub fn restarts_capture(&self) -> bool {
        self.phase != Phase::StartSequence
    }
}

impl fmt::Display for KeyMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "typed \"{}\", expecting \"{}\"", self.typed, self.expected)
    }
}

/// Outcome of feeding one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Nothing to report
    Idle,
    /// Character accepted as the next key of the current sequence
    Typed(char),
    /// Start sequence complete, clock running
    ClockStarted,
    /// Target string complete, waiting for the end sequence
    TargetTyped,
    /// Wrong key; buffer reset
    Mismatch(KeyMismatch),
    /// Non-printable key, ignored
    SpecialKey(KeyCode),
    /// End sequence complete
    Completed(Duration),
    /// Cancel combination pressed
    Cancelled,
}

/// What a capture expects the typist to enter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTarget {
    target: Vec<char>,
    ready: Vec<char>,
    cancel_modifier: Modifier,
    cancel_key: char,
}

impl CaptureTarget {
    pub fn new(target: &str, ready: &str, cancel_modifier: Modifier, cancel_key: char) -> Self {
        Self {
            target: target.chars().flat_map(char::to_lowercase).collect(),
            ready: ready.chars().flat_map(char::to_lowercase).collect(),
            cancel_modifier,
            cancel_key: cancel_key.to_ascii_lowercase(),
        }
    }

    pub fn target(&self) -> String {
        self.target.iter().collect()
    }

    pub fn ready(&self) -> String {
        self.ready.iter().collect()
    }

    pub fn cancel_combo(&self) -> String {
        format!("{}+{}", self.cancel_modifier.name(), self.cancel_key.to_ascii_uppercase())
    }

    fn expected(&self, state: &RecordingState) -> (&[char], Phase) {
        match state {
            RecordingState::AwaitingTrigram { .. } => (&self.target, Phase::Target),
            RecordingState::AwaitingEndSequence { .. } => (&self.ready, Phase::EndSequence),
            _ => (&self.ready, Phase::StartSequence),
        }
    }
}

/// Full machine state: phase, pending keys, and the cancel modifier
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MachineState {
    pub state: RecordingState,
    pub buffer: Vec<char>,
    pub modifier_held: bool,
}

/// Advance the machine by one key event
pub fn transition(
    plan: &CaptureTarget,
    mut current: MachineState,
    event: &KeyEvent,
) -> (MachineState, Signal) {
    if current.state.is_terminal() {
        return (current, Signal::Idle);
    }
    if current.state == RecordingState::NotStarted {
        current.state = RecordingState::AwaitingStartSequence;
        current.buffer.clear();
    }

    let is_cancel_modifier = event.key.modifier() == Some(plan.cancel_modifier);

    match event.event_type {
        KeyEventType::Press => {
            if is_cancel_modifier {
                current.modifier_held = true;
                return (current, Signal::Idle);
            }
            let Some(ch) = event.key.to_char() else {
                return (current, Signal::SpecialKey(event.key));
            };
            if current.modifier_held && ch == plan.cancel_key {
                current.state = RecordingState::Cancelled;
                current.buffer.clear();
                return (current, Signal::Cancelled);
            }

            current.buffer.push(ch);
            let (expected, phase) = plan.expected(&current.state);
            if expected.starts_with(&current.buffer) {
                return (current, Signal::Typed(ch));
            }

            let mismatch = KeyMismatch {
                phase,
                typed: current.buffer.iter().collect(),
                expected: expected.iter().collect(),
            };
            current.buffer.clear();
            current.state = RecordingState::AwaitingStartSequence;
            (current, Signal::Mismatch(mismatch))
        }
        KeyEventType::Release => {
            if is_cancel_modifier {
                current.modifier_held = false;
            }
            let (expected, _) = plan.expected(&current.state);
            if current.buffer != expected {
                return (current, Signal::Idle);
            }

            current.buffer.clear();
            let at = event.timestamp;
            let (next, signal) = match current.state {
                RecordingState::AwaitingStartSequence => (
                    RecordingState::AwaitingTrigram { started_at: at },
                    Signal::ClockStarted,
                ),
                RecordingState::AwaitingTrigram { started_at } => (
                    RecordingState::AwaitingEndSequence { started_at },
                    Signal::TargetTyped,
                ),
                RecordingState::AwaitingEndSequence { started_at } => {
                    let elapsed = at.saturating_duration_since(started_at);
                    (RecordingState::Completed { elapsed }, Signal::Completed(elapsed))
                }
                other => (other, Signal::Idle),
            };
            current.state = next;
            (current, signal)
        }
    }
}

/// One capture's worth of state, discarded after a terminal state
pub struct TimingMachine {
    plan: CaptureTarget,
    current: MachineState,
}

impl TimingMachine {
    pub fn new(plan: CaptureTarget) -> Self {
        Self {
            plan,
            current: MachineState::default(),
        }
    }

    pub fn plan(&self) -> &CaptureTarget {
        &self.plan
    }

    pub fn state(&self) -> RecordingState {
        self.current.state
    }

    /// Enter the start sequence phase without waiting for a key
    pub fn begin(&mut self) {
        if self.current.state == RecordingState::NotStarted {
            self.current.state = RecordingState::AwaitingStartSequence;
        }
    }

    pub fn feed(&mut self, event: &KeyEvent) -> Signal {
        let current = std::mem::take(&mut self.current);
        let (next, signal) = transition(&self.plan, current, event);
        self.current = next;
        signal
    }

    pub fn is_finished(&self) -> bool {
        self.current.state.is_terminal()
    }
}

/// Name used when warning about an unexpected special key
pub fn special_key_name(key: KeyCode) -> &'static str {
    get_key_info(key).name
}
