//! Session configuration.
//!
//! Loaded from `~/.termgrid/config.toml` when present, with defaults for
//! everything else:
//!
//! ```toml
//! user = "alice"
//! host = "devbox"
//!
//! # Shell command for process-bridge sessions (launcher-dependent)
//! shell = "/bin/bash"
//!
//! scrollback_limit = 5000
//! ```

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Per-session settings supplied by the embedding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name shown before the `@` in the interpreter prompt.
    pub user: String,
    /// Host shown after the `@` in the interpreter prompt.
    pub host: String,
    /// Shell command the launcher collaborator starts for process-bridge
    /// sessions. The engine itself never spawns it; absence of a process
    /// at session construction selects interpreter mode.
    pub shell: Option<String>,
    /// Initial working directory for the interpreter. Defaults to the
    /// process working directory.
    pub start_dir: Option<PathBuf>,
    /// Scrollback lines kept per session.
    pub scrollback_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: "user".to_string(),
            host: "localhost".to_string(),
            shell: None,
            start_dir: None,
            scrollback_limit: 10_000,
        }
    }
}

impl Config {
    /// `~/.termgrid/config.toml`, if a home directory can be determined.
    pub fn config_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .map(|home| home.join(".termgrid").join("config.toml"))
    }

    /// Load the user configuration, falling back to defaults when no
    /// config file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => {
                let text = fs::read_to_string(&path).map_err(ConfigError::Read)?;
                Self::from_toml(&text)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::Parse)
    }
}
