//! Driving the timing machine from a live key event source

use super::machine::{special_key_name, CaptureTarget, Signal, TimingMachine};
use super::RecordError;
use crate::fingers::Hand;
use crate::keyboard::{KeyEventSource, Modifier};
use crossterm::style::Stylize;
use crossterm::terminal;
use std::io::{BufRead, Write};
use std::time::Duration;

/// What to capture next
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// String whose typing time is measured
    pub target: String,
    /// Sequence typed before and after the target
    pub ready: String,
    pub hand: Hand,
    /// Progress label shown with the prompt, e.g. `(4/90)`
    pub progress: String,
}

/// Result of one capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Elapsed(Duration),
    Cancelled,
}

/// Something that can time a typed string and confirm quitting.
///
/// Implemented by [`KeyboardCapture`] for live sessions and by scripted fakes
/// in tests.
pub trait Capture {
    fn capture(&mut self, request: &CaptureRequest) -> Result<CaptureOutcome, RecordError>;

    /// Ask whether a requested cancellation should end the session
    fn confirm_quit(&mut self) -> Result<bool, RecordError>;
}

/// Puts the terminal in raw mode for the lifetime of the guard so typed keys
/// are neither echoed nor turned into signals.
struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    fn enable(wanted: bool) -> Self {
        let active = wanted && terminal::enable_raw_mode().is_ok();
        Self { active }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            // Keys typed during the capture are still queued on stdin
            while crossterm::event::poll(Duration::ZERO).unwrap_or(false) {
                if crossterm::event::read().is_err() {
                    break;
                }
            }
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Live capture over a key event source, prompting on `out` and reading the
/// quit confirmation from `input`.
pub struct KeyboardCapture<S, I, W> {
    source: S,
    input: I,
    out: W,
    cancel_modifier: Modifier,
    cancel_key: char,
    confirm_word: String,
    raw_mode: bool,
}

impl<S: KeyEventSource, I: BufRead, W: Write> KeyboardCapture<S, I, W> {
    pub fn new(
        source: S,
        input: I,
        out: W,
        cancel_modifier: Modifier,
        cancel_key: char,
        confirm_word: impl Into<String>,
    ) -> Self {
        Self {
            source,
            input,
            out,
            cancel_modifier,
            cancel_key,
            confirm_word: confirm_word.into(),
            raw_mode: false,
        }
    }

    /// Switch the terminal to raw mode while a capture is running
    pub fn with_raw_mode(mut self, raw_mode: bool) -> Self {
        self.raw_mode = raw_mode;
        self
    }

    pub fn into_parts(self) -> (S, I, W) {
        (self.source, self.input, self.out)
    }

    fn prompt_start(&mut self, request: &CaptureRequest) -> std::io::Result<()> {
        write!(
            self.out,
            "\r\n{} Trigram: {} -- Type \"{}\" with {} hand to start the timer.\r\n",
            request.progress,
            request.target.as_str().bold(),
            request.ready,
            request.hand.name().to_uppercase()
        )?;
        self.out.flush()
    }

    fn run(&mut self, request: &CaptureRequest) -> Result<CaptureOutcome, RecordError> {
        let plan = CaptureTarget::new(
            &request.target,
            &request.ready,
            self.cancel_modifier,
            self.cancel_key,
        );
        let mut machine = TimingMachine::new(plan);

        let stale = self.source.drain();
        if stale > 0 {
            log::debug!("Dropped {} key events queued before the capture", stale);
        }

        machine.begin();
        self.prompt_start(request)?;

        loop {
            let event = self.source.recv()?;
            match machine.feed(&event) {
                Signal::Idle => {}
                Signal::Typed(ch) => {
                    write!(self.out, "{}", ch)?;
                    self.out.flush()?;
                }
                Signal::ClockStarted => {
                    write!(self.out, "\r\nType: \"{}\":\r\n", request.target.as_str().bold())?;
                    self.out.flush()?;
                }
                Signal::TargetTyped => {
                    write!(self.out, "\r\nType \"{}\" to stop the timer\r\n", request.ready)?;
                    self.out.flush()?;
                }
                Signal::Mismatch(mismatch) => {
                    log::debug!("Key mismatch: {}", mismatch);
                    if mismatch.restarts_capture() {
                        write!(
                            self.out,
                            " {} {}\r\n",
                            "Pressed wrong key!".red(),
                            mismatch
                        )?;
                        self.prompt_start(request)?;
                    }
                }
                Signal::SpecialKey(key) => {
                    log::warn!(
                        "Special key '{}' pressed! If you did not press a special key, something is wrong.",
                        special_key_name(key)
                    );
                }
                Signal::Completed(elapsed) => {
                    write!(
                        self.out,
                        "\r\n {} ({:.0} ms)\r\n",
                        "OK!".green(),
                        elapsed.as_secs_f64() * 1000.0
                    )?;
                    self.out.flush()?;
                    return Ok(CaptureOutcome::Elapsed(elapsed));
                }
                Signal::Cancelled => {
                    write!(
                        self.out,
                        "\r\n{} pressed, stopping...\r\n",
                        machine.plan().cancel_combo()
                    )?;
                    self.out.flush()?;
                    return Ok(CaptureOutcome::Cancelled);
                }
            }
        }
    }
}

impl<S: KeyEventSource, I: BufRead, W: Write> Capture for KeyboardCapture<S, I, W> {
    fn capture(&mut self, request: &CaptureRequest) -> Result<CaptureOutcome, RecordError> {
        let _raw = RawModeGuard::enable(self.raw_mode);
        self.run(request)
    }

    fn confirm_quit(&mut self) -> Result<bool, RecordError> {
        writeln!(
            self.out,
            "Type \"{}\" + Enter to confirm quitting. Type anything else + Enter to continue:",
            self.confirm_word
        )?;
        self.out.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            // No more input: nobody is there to continue the session
            return Ok(true);
        }
        Ok(answer.trim() == self.confirm_word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::{ChannelSource, KeyCode, KeyEvent};
    use crate::recording::test_helpers::{tap_at, Clock};
    use std::io::Cursor;
    use std::sync::mpsc;

    fn request() -> CaptureRequest {
        CaptureRequest {
            target: "der".to_string(),
            ready: "jf".to_string(),
            hand: Hand::Left,
            progress: "(1/1)".to_string(),
        }
    }

    fn capture_with(
        events: Vec<KeyEvent>,
        input: &str,
    ) -> KeyboardCapture<ChannelSource, Cursor<Vec<u8>>, Vec<u8>> {
        let (tx, rx) = mpsc::channel();
        let source = ChannelSource::new(rx);
        // Queue from a thread so drain() at capture start does not eat them
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            for e in events {
                if tx.send(e).is_err() {
                    break;
                }
            }
        });
        KeyboardCapture::new(
            source,
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
            Modifier::Ctrl,
            'c',
            "quit",
        )
    }

    #[test]
    fn capture_reports_elapsed_time() {
        let mut clock = Clock::new();
        let mut events = tap_at(&mut clock, "jf");
        let start = clock.last();
        events.extend(tap_at(&mut clock, "derjf"));
        let expected = clock.last() - start;

        let mut capture = capture_with(events, "");
        let outcome = capture.capture(&request()).unwrap();
        assert_eq!(outcome, CaptureOutcome::Elapsed(expected));

        let (_, _, out) = capture.into_parts();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Type \"jf\" with LEFT hand"));
        assert!(out.contains("OK!"));
    }

    #[test]
    fn capture_reprompts_after_wrong_key() {
        let mut clock = Clock::new();
        let mut events = tap_at(&mut clock, "jfdx");
        events.extend(tap_at(&mut clock, "jfderjf"));

        let mut capture = capture_with(events, "");
        let outcome = capture.capture(&request()).unwrap();
        assert!(matches!(outcome, CaptureOutcome::Elapsed(_)));

        let (_, _, out) = capture.into_parts();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("typed \"dx\", expecting \"der\""));
        assert_eq!(out.matches("to start the timer").count(), 2);
    }

    #[test]
    fn capture_reports_cancellation() {
        let mut clock = Clock::new();
        let mut events = tap_at(&mut clock, "jfd");
        events.push(clock.press(KeyCode(29)));
        events.push(clock.press(KeyCode(46)));

        let mut capture = capture_with(events, "");
        assert_eq!(capture.capture(&request()).unwrap(), CaptureOutcome::Cancelled);
    }

    #[test]
    fn closed_source_is_an_error() {
        let (tx, rx) = mpsc::channel::<KeyEvent>();
        drop(tx);
        let mut capture = KeyboardCapture::new(
            ChannelSource::new(rx),
            Cursor::new(Vec::new()),
            Vec::new(),
            Modifier::Ctrl,
            'c',
            "quit",
        );
        assert!(matches!(
            capture.capture(&request()),
            Err(RecordError::Source(_))
        ));
    }

    #[test]
    fn confirm_quit_requires_exact_word() {
        let mut capture = capture_with(Vec::new(), "quit\n");
        assert!(capture.confirm_quit().unwrap());

        let mut capture = capture_with(Vec::new(), "no\n");
        assert!(!capture.confirm_quit().unwrap());

        let mut capture = capture_with(Vec::new(), "");
        assert!(capture.confirm_quit().unwrap());
    }
}
