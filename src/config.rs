//! Configuration management for Effort Grid
//!
//! The configuration holds the hand-finger character assignment together with
//! recording and analysis settings. It is read from a TOML file; when no path
//! is given the platform config directory is used.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/effort-grid/config.toml` |
//! | macOS | `~/Library/Application Support/effort-grid/config.toml` |
//! | Windows | `%APPDATA%\effort-grid\config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use effort_grid::Config;
//!
//! let config = Config::load().unwrap_or_default();
//! let map = config.hand_finger_map().expect("invalid finger assignment");
//! println!("{} characters configured", map.total_chars());
//! ```

use crate::fingers::{DuplicateChar, Finger, FingerChars, Hand, HandFingerMap};
use crate::keyboard::{KeyCode, Modifier, ListenerBackend};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to determine config directory
    NoConfigDir,
    /// IO error reading or writing config file
    Io(io::Error),
    /// Failed to parse config file
    Parse(toml::de::Error),
    /// Failed to serialize config
    Serialize(toml::ser::Error),
    /// A character is assigned to more than one finger
    DuplicateChar(DuplicateChar),
    /// A configured character cannot be typed as a single key
    UnsupportedChar { hand: Hand, finger: Finger, ch: char },
    /// A setting has a value outside its valid range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoConfigDir => write!(f, "Could not determine config directory"),
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Serialize(e) => write!(f, "Serialize error: {}", e),
            ConfigError::DuplicateChar(d) => write!(
                f,
                "Character '{}' assigned to both {} {} and {} {}",
                d.ch, d.first.0, d.first.1, d.second.0, d.second.1
            ),
            ConfigError::UnsupportedChar { hand, finger, ch } => write!(
                f,
                "Character '{}' ({} {}) is not a single key on a US layout",
                ch, hand, finger
            ),
            ConfigError::Invalid(msg) => write!(f, "Invalid setting: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

impl From<DuplicateChar> for ConfigError {
    fn from(d: DuplicateChar) -> Self {
        ConfigError::DuplicateChar(d)
    }
}

/// Returns the path to the default config file.
///
/// Creates the config directory if it doesn't exist.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    let app_dir = config_dir.join("effort-grid");

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir.join("config.toml"))
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Recording session sizes
    #[serde(default)]
    pub session: SessionConfig,
    /// Ready sequences and cancellation keys
    #[serde(default)]
    pub ready: ReadyConfig,
    /// Offline analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Key listener settings
    #[serde(default)]
    pub listener: ListenerConfig,
    /// Characters typed by the left hand
    #[serde(default = "HandConfig::qwerty_left")]
    pub left: HandConfig,
    /// Characters typed by the right hand
    #[serde(default = "HandConfig::qwerty_right")]
    pub right: HandConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            ready: ReadyConfig::default(),
            analysis: AnalysisConfig::default(),
            listener: ListenerConfig::default(),
            left: HandConfig::qwerty_left(),
            right: HandConfig::qwerty_right(),
        }
    }
}

/// Recording session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Distinct trigrams generated per character
    pub trigrams_per_char: usize,
    /// How many times each trigram is timed
    pub trigram_repeat_times: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            trigrams_per_char: 10,
            trigram_repeat_times: 3,
        }
    }
}

/// Ready sequence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadyConfig {
    /// Sequence typed with the left hand around left-hand trigrams
    pub left: String,
    /// Sequence typed with the right hand around right-hand trigrams
    pub right: String,
    /// Modifier held to request cancellation
    pub cancel_modifier: Modifier,
    /// Key pressed together with the modifier to request cancellation
    pub cancel_key: char,
    /// Word that must be typed to confirm quitting
    pub confirm_word: String,
}

impl Default for ReadyConfig {
    fn default() -> Self {
        Self {
            left: "fds".to_string(),
            right: "jkl".to_string(),
            cancel_modifier: Modifier::Ctrl,
            cancel_key: 'c',
            confirm_word: "quit".to_string(),
        }
    }
}

impl ReadyConfig {
    /// Ready sequence for `hand`
    pub fn sequence(&self, hand: Hand) -> &str {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Only the fastest N timings of each trigram are used
    pub use_n_best: usize,
    /// Seconds subtracted from left-hand timings
    pub bias_left: f64,
    /// Seconds subtracted from right-hand timings
    pub bias_right: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            use_n_best: 3,
            bias_left: 0.0,
            bias_right: 0.0,
        }
    }
}

impl AnalysisConfig {
    pub fn bias(&self, hand: Hand) -> f64 {
        match hand {
            Hand::Left => self.bias_left,
            Hand::Right => self.bias_right,
        }
    }
}

/// Key listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Listener implementation
    pub backend: ListenerBackend,
    /// Sleep between listener polls (in microseconds)
    pub poll_interval_us: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            backend: ListenerBackend::Auto,
            poll_interval_us: 500,
        }
    }
}

/// Characters per finger of one hand
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    pub index: String,
    pub middle: String,
    pub ring: String,
    pub pinky: String,
    pub thumb: String,
}

impl HandConfig {
    /// Standard QWERTY touch-typing assignment of the left hand
    pub fn qwerty_left() -> Self {
        Self {
            index: "rtfgvb".to_string(),
            middle: "edc".to_string(),
            ring: "wsx".to_string(),
            pinky: "qaz".to_string(),
            thumb: String::new(),
        }
    }

    /// Standard QWERTY touch-typing assignment of the right hand
    pub fn qwerty_right() -> Self {
        Self {
            index: "yuhjnm".to_string(),
            middle: "ik,".to_string(),
            ring: "ol.".to_string(),
            pinky: "p;/".to_string(),
            thumb: String::new(),
        }
    }

    pub fn finger(&self, finger: Finger) -> &str {
        match finger {
            Finger::Index => &self.index,
            Finger::Middle => &self.middle,
            Finger::Ring => &self.ring,
            Finger::Pinky => &self.pinky,
            Finger::Thumb => &self.thumb,
        }
    }

    fn to_finger_chars(&self, hand: Hand) -> Result<FingerChars, ConfigError> {
        let mut chars = FingerChars::new();
        for finger in Finger::ALL {
            let mut assigned = Vec::new();
            for ch in self.finger(finger).chars().flat_map(char::to_lowercase) {
                if KeyCode::for_char(ch).is_none() {
                    return Err(ConfigError::UnsupportedChar { hand, finger, ch });
                }
                assigned.push(ch);
            }
            chars.insert(finger, assigned);
        }
        Ok(chars)
    }
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check settings and the finger assignment
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.trigrams_per_char == 0 {
            return Err(ConfigError::Invalid("trigrams_per_char must be at least 1".into()));
        }
        if self.session.trigram_repeat_times == 0 {
            return Err(ConfigError::Invalid(
                "trigram_repeat_times must be at least 1".into(),
            ));
        }
        if self.analysis.use_n_best == 0 {
            return Err(ConfigError::Invalid("use_n_best must be at least 1".into()));
        }
        for hand in Hand::ALL {
            let sequence = self.ready.sequence(hand);
            if sequence.is_empty() {
                return Err(ConfigError::Invalid(format!("{} ready sequence is empty", hand)));
            }
            if let Some(ch) = sequence.chars().find(|&c| KeyCode::for_char(c).is_none()) {
                return Err(ConfigError::Invalid(format!(
                    "{} ready sequence contains untypeable '{}'",
                    hand, ch
                )));
            }
        }
        if !matches!(self.ready.cancel_modifier, Modifier::Ctrl | Modifier::Alt) {
            return Err(ConfigError::Invalid(format!(
                "cancel_modifier must be ctrl or alt, not {}",
                self.ready.cancel_modifier.name().to_lowercase()
            )));
        }
        if self.ready.confirm_word.trim().is_empty() {
            return Err(ConfigError::Invalid("confirm_word must not be empty".into()));
        }
        if KeyCode::for_char(self.ready.cancel_key).is_none() {
            return Err(ConfigError::Invalid(format!(
                "cancel_key '{}' is not a single key",
                self.ready.cancel_key
            )));
        }
        self.hand_finger_map()?;
        Ok(())
    }

    /// Build the validated hand-finger map
    pub fn hand_finger_map(&self) -> Result<HandFingerMap, ConfigError> {
        let left = self.left.to_finger_chars(Hand::Left)?;
        let right = self.right.to_finger_chars(Hand::Right)?;
        Ok(HandFingerMap::new(left, right)?)
    }

    /// Listener poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.listener.poll_interval_us)
    }
}
