//! Configuration file support for PixelSuite.
//!
//! Settings are stored as versioned JSON next to the skeleton library and
//! turned into configured editor sessions.

use serde::{Deserialize, Serialize};

use crate::history::{DEFAULT_MAX_HISTORY, UndoConfig, UndoPolicy};
use crate::model::{MIN_BBOX_SIZE, POLYGON_CLOSE_THRESHOLD};
use crate::session::{BoxSession, KeypointSession, PolygonSession};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub preferences: UserPreferences,

    #[serde(default)]
    pub editors: EditorConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// User preferences section of the config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Canvas and gesture settings shared by the editors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Widest display canvas of the keypoint editor
    pub keypoint_max_width: f64,
    /// Widest display canvas of the polygon editor
    pub polygon_max_width: f64,
    /// Widest display canvas of the box editor
    pub box_max_width: f64,
    /// Distance in pixels from the start vertex that closes a polygon
    pub close_threshold: f64,
    /// Smallest box extent in pixels
    pub min_box_size: f64,
    /// Undo snapshots kept per editor
    pub history_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            keypoint_max_width: crate::session::DEFAULT_KEYPOINT_MAX_WIDTH,
            polygon_max_width: crate::session::DEFAULT_POLYGON_MAX_WIDTH,
            box_max_width: crate::session::DEFAULT_BOX_MAX_WIDTH,
            close_threshold: POLYGON_CLOSE_THRESHOLD,
            min_box_size: MIN_BBOX_SIZE,
            history_depth: DEFAULT_MAX_HISTORY,
        }
    }
}

impl EditorConfig {
    fn undo_config(&self) -> UndoConfig {
        UndoConfig {
            max_history: self.history_depth,
        }
    }

    /// A keypoint session using these settings.
    pub fn keypoint_session(&self) -> KeypointSession {
        KeypointSession::new()
            .with_max_width(self.keypoint_max_width)
            .with_undo_config(self.undo_config())
    }

    /// A polygon session using these settings and `policy`.
    pub fn polygon_session(&self, policy: UndoPolicy) -> PolygonSession {
        PolygonSession::new()
            .with_policy(policy)
            .with_max_width(self.polygon_max_width)
            .with_close_threshold(self.close_threshold)
            .with_undo_config(self.undo_config())
    }

    /// A box session using these settings.
    pub fn box_session(&self) -> BoxSession {
        BoxSession::new()
            .with_max_width(self.box_max_width)
            .with_min_size(self.min_box_size)
            .with_undo_config(self.undo_config())
    }
}

/// Where persistent data lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the skeleton library; the platform config
    /// directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<std::path::PathBuf>,
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: UserPreferences::default(),
            editors: EditorConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "pixelsuite-config.json"
    }

    /// Get the default config file path for auto-load/save.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        crate::store::FileStore::default_dir().map(|dir| dir.join(Self::default_filename()))
    }

    /// Directory of the skeleton library: the configured override or the
    /// platform default.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn data_dir(&self) -> Option<std::path::PathBuf> {
        self.storage
            .data_dir
            .clone()
            .or_else(crate::store::FileStore::default_dir)
    }

    /// Load the configuration from the default path, falling back to
    /// defaults when the file is missing or unusable.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_default() -> Self {
        Self::load_from_default_path().unwrap_or_default()
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }
        Self::load_from_path(&path)
    }

    /// Try to load configuration from `path`, logging why it failed.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path(path: &std::path::Path) -> Option<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to_path(&path)
    }

    /// Save configuration to `path`, creating parent directories.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// LocalStorage key for WASM config persistence.
    #[cfg(target_arch = "wasm32")]
    const LOCALSTORAGE_KEY: &'static str = "pixelsuite-config";

    /// Try to load configuration from localStorage (WASM only).
    /// Returns None if not found or can't be parsed.
    #[cfg(target_arch = "wasm32")]
    pub fn load_from_local_storage() -> Option<Self> {
        use crate::store::{LocalStorage, SlotStore};

        match LocalStorage.read(Self::LOCALSTORAGE_KEY) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from localStorage");
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config from localStorage: {}", e);
                    None
                }
            },
            Ok(None) => {
                log::debug!("No config found in localStorage");
                None
            }
            Err(e) => {
                log::warn!("Failed to read from localStorage: {}", e);
                None
            }
        }
    }

    /// Save configuration to localStorage (WASM only).
    #[cfg(target_arch = "wasm32")]
    pub fn save_to_local_storage(&self) -> Result<(), ConfigError> {
        use crate::store::{LocalStorage, SlotStore};

        let json = self.to_json()?;
        LocalStorage
            .write(Self::LOCALSTORAGE_KEY, &json)
            .map_err(|e| ConfigError::StorageError(e.to_string()))?;
        log::info!("Saved configuration to localStorage");
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Storage error (localStorage in WASM)
    #[error("Storage error: {0}")]
    StorageError(String),
}
