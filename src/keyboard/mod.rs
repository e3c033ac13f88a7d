//! Keyboard event capture

mod event;
pub mod keymap;
mod source;

#[cfg(target_os = "linux")]
mod evdev_listener;

pub use event::{KeyEvent, KeyEventType, KeyboardListener};
pub use keymap::{get_key_info, KeyCode, KeyInfo, Modifier, KEYMAP};
pub use source::{spawn_listener, ChannelSource, KeyEventSource, ListenerBackend, SourceError};

#[cfg(target_os = "linux")]
pub use evdev_listener::{evdev_status, EvdevError, EvdevListener};
