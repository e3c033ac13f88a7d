//! Raw evdev-based keyboard listener for Linux
//!
//! Reads `/dev/input/event*` keyboard devices directly. Compared to polling
//! the global key state this sees every transition, even two changes of the
//! same key between polls, which matters for fast trigram typing.

use super::{KeyCode, KeyEvent, KeyEventType};
use nix::libc;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Error type for evdev operations
#[derive(Debug)]
pub enum EvdevError {
    /// No keyboard devices found
    NoDevices,
    /// Permission denied accessing device
    PermissionDenied(String),
    /// IO error
    Io(io::Error),
    /// Device enumeration failed
    EnumerationFailed(String),
}

impl std::fmt::Display for EvdevError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvdevError::NoDevices => write!(f, "No keyboard devices found"),
            EvdevError::PermissionDenied(path) => {
                write!(f, "Permission denied accessing {}", path)
            }
            EvdevError::Io(e) => write!(f, "IO error: {}", e),
            EvdevError::EnumerationFailed(msg) => write!(f, "Device enumeration failed: {}", msg),
        }
    }
}

impl std::error::Error for EvdevError {}

impl From<io::Error> for EvdevError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::PermissionDenied {
            EvdevError::PermissionDenied("device".to_string())
        } else {
            EvdevError::Io(e)
        }
    }
}

/// A raw input event from the kernel
#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct InputEvent {
    tv_sec: i64,
    tv_usec: i64,
    event_type: u16,
    code: u16,
    value: i32,
}

const EV_KEY: u16 = 0x01;
const KEY_VALUE_RELEASE: i32 = 0;
const KEY_VALUE_REPEAT: i32 = 2;
const INPUT_EVENT_SIZE: usize = std::mem::size_of::<InputEvent>();

/// Map the kernel's wall-clock event time onto the monotonic clock.
///
/// `now` and `wall_now` are sampled together at the start of a poll; the
/// event is placed as far before `now` as its age. Events stamped in the
/// future (clock adjustments) collapse onto `now`.
fn kernel_instant(now: Instant, wall_now: SystemTime, event: &InputEvent) -> Instant {
    let (Ok(secs), Ok(usecs)) = (u64::try_from(event.tv_sec), u64::try_from(event.tv_usec)) else {
        return now;
    };
    let happened = UNIX_EPOCH + Duration::from_secs(secs) + Duration::from_micros(usecs);
    let age = wall_now.duration_since(happened).unwrap_or(Duration::ZERO);
    now.checked_sub(age).unwrap_or(now)
}

/// Find all keyboard input devices
fn find_keyboard_devices() -> Result<Vec<PathBuf>, EvdevError> {
    let input_dir = PathBuf::from("/dev/input");
    if !input_dir.exists() {
        return Err(EvdevError::EnumerationFailed(
            "/dev/input does not exist".to_string(),
        ));
    }

    let keyboards: Vec<PathBuf> = fs::read_dir(&input_dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with("event"))
        })
        .filter(|path| is_keyboard_device(path))
        .collect();

    if keyboards.is_empty() {
        return Err(EvdevError::NoDevices);
    }

    Ok(keyboards)
}

/// Check if a device is a keyboard by examining /sys/class/input
fn is_keyboard_device(device_path: &Path) -> bool {
    let Some(name) = device_path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    // Key capability bitmap; a real keyboard advertises well over 50 keys
    let caps_path = format!("/sys/class/input/{}/device/capabilities/key", name);
    if let Ok(caps) = fs::read_to_string(&caps_path) {
        let trimmed = caps.trim();
        if !trimmed.is_empty() && trimmed != "0" {
            let total_bits: u32 = trimmed
                .split_whitespace()
                .filter_map(|hex| u64::from_str_radix(hex, 16).ok())
                .map(|n| n.count_ones())
                .sum();
            return total_bits > 50;
        }
    }

    let name_path = format!("/sys/class/input/{}/device/name", name);
    if let Ok(dev_name) = fs::read_to_string(&name_path) {
        let dev_name_lower = dev_name.to_lowercase();
        return dev_name_lower.contains("keyboard") || dev_name_lower.contains("kbd");
    }
    false
}

/// Evdev-based keyboard listener
pub struct EvdevListener {
    devices: Vec<File>,
    pressed_keys: HashSet<u16>,
    event_tx: mpsc::Sender<KeyEvent>,
    buffer: Vec<u8>,
}

impl EvdevListener {
    /// Open every accessible keyboard device in non-blocking mode
    pub fn new(event_tx: mpsc::Sender<KeyEvent>) -> Result<Self, EvdevError> {
        let device_paths = find_keyboard_devices()?;
        let mut devices = Vec::new();

        for path in &device_paths {
            match File::open(path) {
                Ok(file) => {
                    let fd = file.as_raw_fd();
                    unsafe {
                        let flags = libc::fcntl(fd, libc::F_GETFL);
                        libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
                    }
                    log::debug!("Listening on {}", path.display());
                    devices.push(file);
                }
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => continue,
                Err(e) => return Err(EvdevError::Io(e)),
            }
        }

        if devices.is_empty() {
            return Err(EvdevError::PermissionDenied(
                "Cannot access any keyboard devices. Try running with sudo or add user to 'input' group.".to_string(),
            ));
        }

        Ok(Self {
            devices,
            pressed_keys: HashSet::new(),
            event_tx,
            buffer: vec![0u8; INPUT_EVENT_SIZE * 64],
        })
    }

    /// Get the number of opened devices
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Drain pending kernel events.
    ///
    /// Returns `None` once the receiving side has hung up, otherwise the
    /// number of events forwarded.
    pub fn poll(&mut self) -> Option<usize> {
        let now = Instant::now();
        let wall_now = SystemTime::now();

        let mut event_count = 0;

        for device in &mut self.devices {
            loop {
                let bytes_read = match device.read(&mut self.buffer) {
                    Ok(n) if n >= INPUT_EVENT_SIZE => n,
                    Ok(_) => break,
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) => {
                        log::warn!("Reading keyboard device failed: {}", e);
                        break;
                    }
                };

                for chunk in self.buffer[..bytes_read].chunks_exact(INPUT_EVENT_SIZE) {
                    let input_event: InputEvent =
                        unsafe { std::ptr::read_unaligned(chunk.as_ptr() as *const InputEvent) };

                    if input_event.event_type != EV_KEY || input_event.value == KEY_VALUE_REPEAT {
                        continue;
                    }

                    let scancode = input_event.code;
                    let event_type = if input_event.value == KEY_VALUE_RELEASE {
                        if !self.pressed_keys.remove(&scancode) {
                            continue;
                        }
                        KeyEventType::Release
                    } else {
                        if !self.pressed_keys.insert(scancode) {
                            continue;
                        }
                        KeyEventType::Press
                    };

                    let at = kernel_instant(now, wall_now, &input_event);
                    let event = KeyEvent::new(KeyCode::new(scancode), event_type, at);
                    self.event_tx.send(event).ok()?;
                    event_count += 1;
                }
            }
        }

        Some(event_count)
    }
}

/// Get a status message about evdev availability
pub fn evdev_status() -> String {
    match find_keyboard_devices() {
        Ok(devices) => format!("{} keyboard device(s) found", devices.len()),
        Err(EvdevError::NoDevices) => "No keyboard devices found".to_string(),
        Err(EvdevError::PermissionDenied(_)) => {
            "Permission denied - run with sudo or add user to 'input' group".to_string()
        }
        Err(e) => format!("Error: {}", e),
    }
}
