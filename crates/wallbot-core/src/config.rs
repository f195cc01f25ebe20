//! Session configuration
//!
//! Settings are layered: built-in defaults, then a JSON file, then `WALLBOT_*` environment
//! variables. Front-ends apply their own overrides (command line flags) on top.
//!
//! ```json
//! {
//!   "port": "/dev/ttyACM0",
//!   "baud_rate": 9600,
//!   "read_timeout_ms": 2000,
//!   "ack_timeout_ms": null,
//!   "commands_dir": "."
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::protocol::{WaitPolicy, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT_MS, DEFAULT_SETTLE_DELAY_MS};

/// Environment variable overriding the serial port
pub const ENV_PORT: &str = "WALLBOT_PORT";
/// Environment variable overriding the baud rate
pub const ENV_BAUD: &str = "WALLBOT_BAUD";
/// Environment variable overriding the read timeout in milliseconds
pub const ENV_READ_TIMEOUT_MS: &str = "WALLBOT_READ_TIMEOUT_MS";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Failed to write config: {0}")]
    Write(#[from] io::Error),
}

/// Everything needed to open a session with the robot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Serial port name
    pub port: String,

    /// Baud rate
    pub baud_rate: u32,

    /// Timeout of a single line read in milliseconds
    pub read_timeout_ms: u64,

    /// Pause after opening the port while the board resets
    pub settle_delay_ms: u64,

    /// Give up waiting for `DONE` after this long (None = wait forever)
    pub ack_timeout_ms: Option<u64>,

    /// Give up waiting for the setup message after this long (None = wait forever)
    pub handshake_timeout_ms: Option<u64>,

    /// Directory holding command files
    pub commands_dir: PathBuf,
}

fn default_port() -> String {
    if cfg!(windows) {
        "COM3".to_string()
    } else {
        "/dev/ttyACM0".to_string()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            ack_timeout_ms: None,
            handshake_timeout_ms: None,
            commands_dir: PathBuf::from("."),
        }
    }
}

impl SessionConfig {
    /// Default config file location (`<config dir>/wallbot/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("wallbot").join("config.json"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one the default location is used when the file
    /// is present. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.is_file() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Read a JSON config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply `WALLBOT_*` overrides looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port;
        }
        if let Some(baud) = lookup(ENV_BAUD) {
            self.baud_rate = parse_env(ENV_BAUD, &baud)?;
        }
        if let Some(timeout) = lookup(ENV_READ_TIMEOUT_MS) {
            self.read_timeout_ms = parse_env(ENV_READ_TIMEOUT_MS, &timeout)?;
        }
        Ok(())
    }

    /// Read timeout as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Policy for acknowledge waits
    pub fn ack_policy(&self) -> WaitPolicy {
        WaitPolicy::from_millis(self.ack_timeout_ms)
    }

    /// Policy for the startup handshake
    pub fn handshake_policy(&self) -> WaitPolicy {
        WaitPolicy::from_millis(self.handshake_timeout_ms)
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.read_timeout(), Duration::from_secs(2));
        assert_eq!(config.ack_policy(), WaitPolicy::unbounded());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "port": "COM7", "ack_timeout_ms": 30000 }"#).unwrap();

        let config = SessionConfig::from_file(&path).unwrap();
        assert_eq!(config.port, "COM7");
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(
            config.ack_policy(),
            WaitPolicy::with_timeout(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = SessionConfig {
            port: "/dev/ttyUSB1".to_string(),
            handshake_timeout_ms: Some(10_000),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(SessionConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionConfig::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ port: ").unwrap();
        assert!(matches!(
            SessionConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [(ENV_PORT, "COM4"), (ENV_BAUD, "115200")].into();
        let mut config = SessionConfig::default();
        config
            .apply_env(|var| env.get(var).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.port, "COM4");
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.read_timeout_ms, DEFAULT_READ_TIMEOUT_MS);
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = SessionConfig::default();
        let err = config
            .apply_env(|var| (var == ENV_BAUD).then(|| "fast".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_BAUD, .. }));
    }
}
