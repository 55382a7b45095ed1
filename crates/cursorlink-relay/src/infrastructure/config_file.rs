//! Optional TOML configuration file for the relay.
//!
//! Every key is optional; anything left out falls back to the CLI flag, the
//! environment variable, or the built-in default, in that order of
//! precedence (see `main.rs`).
//!
//! ```toml
//! port = 3001
//! bind = "0.0.0.0"
//! outbound_queue = 128
//! ping_interval_secs = 25
//! ping_timeout_secs = 20
//! notify_departures = true
//! ```
//!
//! Unknown keys are rejected so a typo does not silently fall back to a
//! default.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MAX_OUTBOUND_QUEUE, MAX_PING_SECS};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid config value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Settings read from the config file.  `None` means "not set in the file".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayFileConfig {
    pub port: Option<u16>,
    pub bind: Option<IpAddr>,
    pub outbound_queue: Option<usize>,
    pub ping_interval_secs: Option<u64>,
    pub ping_timeout_secs: Option<u64>,
    pub notify_departures: Option<bool>,
}

impl RelayFileConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] for zero-valued queue sizes or intervals.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`RelayFileConfig::parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let bounded = [
            (
                "outbound_queue",
                self.outbound_queue.map(|v| v as u64),
                MAX_OUTBOUND_QUEUE as u64,
            ),
            ("ping_interval_secs", self.ping_interval_secs, MAX_PING_SECS),
            ("ping_timeout_secs", self.ping_timeout_secs, MAX_PING_SECS),
        ];
        for (key, value, max) in bounded {
            match value {
                Some(0) => {
                    return Err(ConfigError::Invalid {
                        key,
                        reason: "must be greater than zero".to_string(),
                    })
                }
                Some(v) if v > max => {
                    return Err(ConfigError::Invalid {
                        key,
                        reason: format!("must be at most {max}"),
                    })
                }
                _ => {}
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_sets_nothing() {
        let cfg = RelayFileConfig::parse("").unwrap();
        assert_eq!(cfg, RelayFileConfig::default());
    }

    #[test]
    fn test_full_file_parses() {
        // Arrange
        let text = r#"
            port = 4000
            bind = "127.0.0.1"
            outbound_queue = 32
            ping_interval_secs = 10
            ping_timeout_secs = 5
            notify_departures = false
        "#;

        // Act
        let cfg = RelayFileConfig::parse(text).unwrap();

        // Assert
        assert_eq!(cfg.port, Some(4000));
        assert_eq!(cfg.bind, Some("127.0.0.1".parse().unwrap()));
        assert_eq!(cfg.outbound_queue, Some(32));
        assert_eq!(cfg.ping_interval_secs, Some(10));
        assert_eq!(cfg.ping_timeout_secs, Some(5));
        assert_eq!(cfg.notify_departures, Some(false));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = RelayFileConfig::parse("prot = 4000").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_bind_is_rejected() {
        assert!(RelayFileConfig::parse(r#"bind = "not.an.ip""#).is_err());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = RelayFileConfig::parse("ping_interval_secs = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "ping_interval_secs",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_queue_is_rejected() {
        assert!(RelayFileConfig::parse("outbound_queue = 0").is_err());
    }

    #[test]
    fn test_oversized_values_are_rejected() {
        let err = RelayFileConfig::parse("ping_timeout_secs = 86401").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "ping_timeout_secs",
                ..
            }
        ));
        assert!(RelayFileConfig::parse("ping_interval_secs = 9223372036854775807").is_err());
        assert!(RelayFileConfig::parse("outbound_queue = 65537").is_err());
        assert!(RelayFileConfig::parse("outbound_queue = 65536").is_ok());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let path = Path::new("/definitely/not/here/cursorlink.toml");
        let err = RelayFileConfig::load(path).unwrap_err();
        assert!(err.to_string().contains("cursorlink.toml"));
    }
}
