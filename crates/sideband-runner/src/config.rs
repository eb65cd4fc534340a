//! Configuration loading for the Sideband server.
//!
//! The canonical configuration lives in `sideband.yaml` next to the
//! binary. Every field has a default, so a missing file or an empty
//! document yields a fully working configuration.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
///
/// Mirrors the structure of `sideband.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SidebandConfig {
    /// Listen address for the observer server.
    #[serde(default)]
    pub server: ServerSection,

    /// Broadcast loop settings.
    #[serde(default)]
    pub broadcast: BroadcastSection,

    /// Simulated feed settings.
    #[serde(default)]
    pub feed: FeedSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl SidebandConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&text)?)
    }

    /// Load configuration, falling back to defaults when the file does
    /// not exist. A present-but-invalid file is still an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file cannot be read or
    /// parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Listen address settings for the observer server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Broadcast loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastSection {
    /// Broadcast period in milliseconds.
    #[serde(default = "default_broadcast_interval_ms")]
    pub interval_ms: u64,
}

impl Default for BroadcastSection {
    fn default() -> Self {
        Self {
            interval_ms: default_broadcast_interval_ms(),
        }
    }
}

/// Simulated feed settings.
///
/// The feed stands in for a live emulator session: it mutates the bot
/// session periodically and invalidates the affected snapshots, which
/// is the same call path a real bot process uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedSection {
    /// Whether to run the simulated feed.
    #[serde(default = "default_feed_enabled")]
    pub enabled: bool,

    /// Feed step period in milliseconds.
    #[serde(default = "default_feed_interval_ms")]
    pub interval_ms: u64,

    /// Seed for the feed's random number generator, for reproducible
    /// demo runs.
    #[serde(default)]
    pub seed: u64,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            enabled: default_feed_enabled(),
            interval_ms: default_feed_interval_ms(),
            seed: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingSection {
    /// Default tracing filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

const fn default_broadcast_interval_ms() -> u64 {
    1000
}

const fn default_feed_enabled() -> bool {
    true
}

const fn default_feed_interval_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: SidebandConfig = serde_yml::from_str("{}").unwrap();
        assert_eq!(config, SidebandConfig::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.broadcast.interval_ms, 1000);
        assert!(config.feed.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let yaml = r"
server:
  port: 9001
feed:
  enabled: false
";
        let config: SidebandConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(!config.feed.enabled);
        assert_eq!(config.feed.interval_ms, 2000);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config =
            SidebandConfig::load_or_default(Path::new("/definitely/not/here/sideband.yaml"))
                .unwrap();
        assert_eq!(config, SidebandConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result: Result<SidebandConfig, _> = serde_yml::from_str("server: [not a map]")
            .map_err(ConfigError::from);
        assert!(result.is_err());
    }
}
