//! Key event sources consumed by the recording machinery
//!
//! Listeners run on a background thread and forward every transition over a
//! channel; the recorder blocks on the receiving end, one event at a time.

use super::{KeyEvent, KeyboardListener};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, RecvError};
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[cfg(target_os = "linux")]
use super::EvdevListener;

/// Which listener implementation feeds the recorder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListenerBackend {
    /// Raw evdev on Linux when accessible, device_query otherwise
    #[default]
    Auto,
    /// Poll the global key state with device_query
    DeviceQuery,
    /// Read /dev/input directly (Linux only)
    Evdev,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("keyboard listener stopped delivering events")]
    ListenerClosed,
    #[error("evdev listener unavailable: {0}")]
    EvdevUnavailable(String),
}

impl From<RecvError> for SourceError {
    fn from(_: RecvError) -> Self {
        SourceError::ListenerClosed
    }
}

/// A blocking, ordered stream of key events
pub trait KeyEventSource {
    /// Block until the next event arrives
    fn recv(&mut self) -> Result<KeyEvent, SourceError>;

    /// Discard everything queued so far, returning how many events were dropped
    fn drain(&mut self) -> usize;
}

/// Event source backed by an mpsc channel
pub struct ChannelSource {
    rx: Receiver<KeyEvent>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<KeyEvent>) -> Self {
        Self { rx }
    }
}

impl KeyEventSource for ChannelSource {
    fn recv(&mut self) -> Result<KeyEvent, SourceError> {
        Ok(self.rx.recv()?)
    }

    fn drain(&mut self) -> usize {
        self.rx.try_iter().count()
    }
}

/// Start a listener thread for `backend` and return the receiving end.
///
/// The thread exits on its own once the returned source is dropped.
pub fn spawn_listener(
    backend: ListenerBackend,
    poll_interval: Duration,
) -> Result<ChannelSource, SourceError> {
    let (event_tx, event_rx) = mpsc::channel::<KeyEvent>();

    #[cfg(target_os = "linux")]
    {
        if backend != ListenerBackend::DeviceQuery {
            match EvdevListener::new(event_tx.clone()) {
                Ok(mut evdev) => {
                    log::info!("Using evdev listener on {} device(s)", evdev.device_count());
                    thread::spawn(move || {
                        while evdev.poll().is_some() {
                            thread::sleep(poll_interval);
                        }
                    });
                    return Ok(ChannelSource::new(event_rx));
                }
                Err(e) if backend == ListenerBackend::Evdev => {
                    return Err(SourceError::EvdevUnavailable(e.to_string()));
                }
                Err(e) => {
                    log::warn!("Evdev unavailable ({}), falling back to device_query", e);
                }
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    {
        if backend == ListenerBackend::Evdev {
            return Err(SourceError::EvdevUnavailable(
                "evdev is only available on Linux".to_string(),
            ));
        }
    }

    log::info!("Using device_query listener");
    thread::spawn(move || {
        let mut listener = KeyboardListener::new(event_tx);
        while listener.poll().is_some() {
            thread::sleep(poll_interval);
        }
    });

    Ok(ChannelSource::new(event_rx))
}
