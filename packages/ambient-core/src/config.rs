//! Runtime configuration for the background sound controller.
//!
//! Fixed command-line vocabulary lives in [`player_constants`](crate::player_constants);
//! everything here is a tunable with a sensible default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::player_constants::{
    DEFAULT_PLAYER_PATH, IDLE_STATUS, PLAYLIST_EXTENSION, VOLUME_DEFAULT_DB, VOLUME_MAX_DB,
    VOLUME_MIN_DB,
};

/// Configuration rejected by [`Config::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("player_path must not be empty")]
    EmptyPlayerPath,

    #[error("volume.min_db ({min}) must not be greater than volume.max_db ({max})")]
    InvertedVolumeRange { min: i32, max: i32 },

    #[error("volume.default_db ({default}) must lie within [{min}, {max}]")]
    DefaultVolumeOutOfRange { default: i32, min: i32, max: i32 },

    #[error("playlist_extension must start with '.' and name an extension, got '{0}'")]
    InvalidPlaylistExtension(String),
}

/// Volume bounds applied to every request, in dB.
///
/// Out-of-range request volumes are clamped into `[min_db, max_db]`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct VolumeConfig {
    pub min_db: i32,
    pub max_db: i32,
    /// Used when the request names no volume.
    pub default_db: i32,
}

impl VolumeConfig {
    /// Clamps `db` into the configured range.
    #[must_use]
    pub fn clamp(&self, db: i32) -> i32 {
        db.clamp(self.min_db, self.max_db)
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            min_db: VOLUME_MIN_DB,
            max_db: VOLUME_MAX_DB,
            default_db: VOLUME_DEFAULT_DB,
        }
    }
}

/// Auto-stop timer behaviour.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct AutoStopConfig {
    /// When true, a timer only stops the session that armed it. When false,
    /// a firing timer stops whatever session is current at that moment.
    pub guard_session: bool,
}

impl Default for AutoStopConfig {
    fn default() -> Self {
        Self {
            guard_session: true,
        }
    }
}

/// Configuration for the background sound controller.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Media player executable, used when a request does not override it.
    pub player_path: String,

    /// Volume bounds and default.
    pub volume: VolumeConfig,

    /// Suffix that marks a link as a playlist file (case-sensitive).
    pub playlist_extension: String,

    /// Status published while nothing is playing.
    pub idle_status: String,

    /// Auto-stop timer behaviour.
    pub auto_stop: AutoStopConfig,
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_path.trim().is_empty() {
            return Err(ConfigError::EmptyPlayerPath);
        }
        let VolumeConfig {
            min_db,
            max_db,
            default_db,
        } = self.volume;
        if min_db > max_db {
            return Err(ConfigError::InvertedVolumeRange {
                min: min_db,
                max: max_db,
            });
        }
        if !(min_db..=max_db).contains(&default_db) {
            return Err(ConfigError::DefaultVolumeOutOfRange {
                default: default_db,
                min: min_db,
                max: max_db,
            });
        }
        if !self.playlist_extension.starts_with('.') || self.playlist_extension.len() < 2 {
            return Err(ConfigError::InvalidPlaylistExtension(
                self.playlist_extension.clone(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_path: DEFAULT_PLAYER_PATH.to_string(),
            volume: VolumeConfig::default(),
            playlist_extension: PLAYLIST_EXTENSION.to_string(),
            idle_status: IDLE_STATUS.to_string(),
            auto_stop: AutoStopConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.volume.min_db, -40);
        assert_eq!(config.volume.max_db, -10);
        assert_eq!(config.volume.default_db, -17);
        assert!(config.auto_stop.guard_session);
    }

    #[test]
    fn config_rejects_inverted_volume_range() {
        let mut config = Config::default();
        config.volume.min_db = -5;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedVolumeRange { min: -5, max: -10 })
        );
    }

    #[test]
    fn config_rejects_default_outside_range() {
        let mut config = Config::default();
        config.volume.default_db = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DefaultVolumeOutOfRange { .. })
        ));
    }

    #[test]
    fn config_rejects_bad_extension() {
        let mut config = Config::default();
        config.playlist_extension = "txt".into();
        assert!(config.validate().is_err());
        config.playlist_extension = ".".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_fills_missing_fields_from_defaults() {
        let config: Config = serde_json::from_str(r#"{"player_path": "/opt/mplayer"}"#).unwrap();
        assert_eq!(config.player_path, "/opt/mplayer");
        assert_eq!(config.volume, VolumeConfig::default());
        assert_eq!(config.playlist_extension, ".txt");
    }

    #[test]
    fn volume_clamps_to_bounds() {
        let volume = VolumeConfig::default();
        assert_eq!(volume.clamp(-5), -10);
        assert_eq!(volume.clamp(-60), -40);
        assert_eq!(volume.clamp(-20), -20);
    }
}
