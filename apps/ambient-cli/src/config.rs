//! CLI configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Directory under the OS temp dir holding the default state files.
const STATE_DIR: &str = "ambient-player";

/// CLI configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Controller settings (player path, volume bounds, auto-stop).
    #[serde(flatten)]
    pub core: ambient_core::Config,

    /// File recording the running player's pid between invocations.
    /// Override: `AMBIENT_PID_FILE`
    pub pid_file: PathBuf,

    /// File holding the published status between invocations.
    /// Override: `AMBIENT_MEMORY_FILE`
    pub memory_file: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        let state_dir = std::env::temp_dir().join(STATE_DIR);
        Self {
            core: ambient_core::Config::default(),
            pid_file: state_dir.join("mplayer.pid"),
            memory_file: state_dir.join("memory.json"),
        }
    }
}

impl CliConfig {
    /// Loads configuration from a YAML file, then applies environment
    /// overrides.
    ///
    /// The caller validates `core` so it can report the error code.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("AMBIENT_PLAYER_PATH") {
            if !val.is_empty() {
                self.core.player_path = val;
            }
        }

        if let Ok(val) = std::env::var("AMBIENT_PID_FILE") {
            self.pid_file = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("AMBIENT_MEMORY_FILE") {
            self.memory_file = PathBuf::from(val);
        }

        // Note: AMBIENT_CONFIG is handled by clap via #[arg(env = ...)] in main.rs
    }
}
