//! Configuration for the `lectern` binary.
//!
//! Looks for `lectern.json` in the working directory; a missing file yields
//! validated defaults, malformed JSON is a hard error with an actionable
//! suggestion.

use std::path::Path;

use serde::{Deserialize, Serialize};

use lectern_bridge::BridgeConfig;
use lectern_host::StoreLimits;

/// The default config file name.
const CONFIG_FILE_NAME: &str = "lectern.json";

/// Default port for the results API server.
const fn default_port() -> u16 {
    3000
}

/// Default wait for the host readiness notice, in milliseconds.
const fn default_ready_timeout_ms() -> u64 {
    10_000
}

/// Default instance-data history page size.
const fn default_history_limit() -> u32 {
    20
}

/// Default hard cap on instance-data history scans.
const fn default_max_history_limit() -> u32 {
    100
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but cannot be read or parsed.
    #[error("Invalid config file '{path}': {message}\n\nSuggestion: Validate your lectern.json with a JSON linter")]
    Parse {
        /// Path to the configuration file.
        path: String,
        /// Description of the parse error.
        message: String,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    Validation {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },
}

impl ConfigError {
    fn parse(path: &Path, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    fn validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}

/// Bridge acquisition tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeSection {
    /// How long content waits for the host readiness notice.
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            ready_timeout_ms: default_ready_timeout_ms(),
        }
    }
}

impl BridgeSection {
    /// Converts into the bridge crate's config type.
    #[must_use]
    pub const fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            ready_timeout_ms: self.ready_timeout_ms,
        }
    }
}

/// Instance-data history bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSection {
    /// Records returned when content supplies no limit.
    #[serde(default = "default_history_limit")]
    pub default_history_limit: u32,

    /// Hard cap applied to content-supplied limits.
    #[serde(default = "default_max_history_limit")]
    pub max_history_limit: u32,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            default_history_limit: default_history_limit(),
            max_history_limit: default_max_history_limit(),
        }
    }
}

impl StoreSection {
    /// Converts into the host crate's limits type.
    #[must_use]
    pub const fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            default_history_limit: self.default_history_limit,
            max_history_limit: self.max_history_limit,
        }
    }
}

/// Main configuration for the lesson host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LecternConfig {
    /// Port the results API listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bridge acquisition tuning.
    #[serde(default)]
    pub bridge: BridgeSection,

    /// Instance-data history bounds.
    #[serde(default)]
    pub store: StoreSection,
}

impl Default for LecternConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bridge: BridgeSection::default(),
            store: StoreSection::default(),
        }
    }
}

impl LecternConfig {
    /// Loads configuration from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `lectern.json` exists but contains invalid JSON,
    /// or if the loaded values fail validation.
    pub fn load() -> Result<Self, ConfigError> {
        let current_dir = std::env::current_dir().map_err(|e| {
            ConfigError::parse(
                Path::new("<current directory>"),
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_file(&current_dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields validated defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for unreadable or malformed files and
    /// `ConfigError::Validation` for out-of-range values.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(ConfigError::parse(path, format!("failed to read file: {e}")));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any check fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "port must be greater than 0",
                "Set port to a usable TCP port in your lectern.json",
            ));
        }
        if self.bridge.ready_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "bridge.readyTimeoutMs must be greater than 0",
                "Set bridge.readyTimeoutMs to at least 1 millisecond in your lectern.json",
            ));
        }
        if self.store.default_history_limit == 0 {
            return Err(ConfigError::validation(
                "store.defaultHistoryLimit must be greater than 0",
                "Set store.defaultHistoryLimit to at least 1 in your lectern.json",
            ));
        }
        if self.store.max_history_limit < self.store.default_history_limit {
            return Err(ConfigError::validation(
                "store.maxHistoryLimit must be at least store.defaultHistoryLimit",
                "Raise store.maxHistoryLimit or lower store.defaultHistoryLimit in your lectern.json",
            ));
        }
        Ok(())
    }
}
