//! Configuration management for auto-macro.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, validation on load, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{NotificationsConfig, PlaybackConfig, RecorderConfig, StorageConfig},
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use auto_macro_core::{RecorderSettings, SessionSettings};
use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
///
/// Every section falls back to its defaults when missing, so a config
/// written by an older version still loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Recording settings.
    #[serde(default)]
    pub recorder: RecorderConfig,
    /// Playback settings.
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Macro storage location.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Desktop notification settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl Config {
    /// Load configuration from `config_path`, creating a default file there
    /// if none exists.
    #[track_caller]
    #[instrument]
    pub fn load_from(config_path: &Path) -> AppResult<Self> {
        if !config_path.exists() {
            info!(config_path = ?config_path, "No config found, creating default");
            let config = Config::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        config.validate()?;

        info!(config_path = ?config_path, "Configuration loaded");

        Ok(config)
    }

    /// Reject values the engine cannot use.
    #[track_caller]
    pub fn validate(&self) -> AppResult<()> {
        let speed = self.playback.default_speed;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(AppError::ConfigError {
                reason: format!("playback.default_speed must be positive, got {}", speed),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let delta = self.recorder.min_move_delta;
        if !delta.is_finite() || delta < 0.0 {
            return Err(AppError::ConfigError {
                reason: format!("recorder.min_move_delta must be >= 0, got {}", delta),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }

    /// Save configuration to `config_path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(parent) = config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                debug!(config_dir = ?parent, "Created config directory");
            }
        }

        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Engine settings derived from this config.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            recorder: RecorderSettings {
                min_move_delta: self.recorder.min_move_delta,
            },
            default_speed: self.playback.default_speed,
        }
    }

    /// Directory macros are stored in, resolving the platform default.
    #[track_caller]
    pub fn macro_dir(&self) -> AppResult<PathBuf> {
        match &self.storage.macro_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("macros")),
        }
    }

    /// Location of `config.toml` in the platform config directory.
    #[track_caller]
    pub fn config_path() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "auto-macro", "Auto-Macro").ok_or_else(|| AppError::ConfigError {
            reason: "Failed to get project directories".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
