//! Dispatcher configuration.
//!
//! # TOML
//!
//! ```toml
//! default_priority = 1        # priority used by add_listener / add_listener_aggregate
//! separator = ":"             # splits "component:method" aggregate event types
//! tie_break = "registration"  # or "newest_first"
//! forward_mode = "pass_event" # or "pass_params"
//! ```
//!
//! Every key is optional. Missing keys take the [`Default`] value.
//!
//! # Environment overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `TIDINGS_DEFAULT_PRIORITY` | `default_priority` |
//! | `TIDINGS_SEPARATOR` | `separator` |
//! | `TIDINGS_TIE_BREAK` | `tie_break` |
//! | `TIDINGS_FORWARD_MODE` | `forward_mode` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tidings_types::{ErrorCode, ForwardMode, DEFAULT_PRIORITY};

/// Environment variable overriding `default_priority`.
pub const ENV_DEFAULT_PRIORITY: &str = "TIDINGS_DEFAULT_PRIORITY";
/// Environment variable overriding `separator`.
pub const ENV_SEPARATOR: &str = "TIDINGS_SEPARATOR";
/// Environment variable overriding `tie_break`.
pub const ENV_TIE_BREAK: &str = "TIDINGS_TIE_BREAK";
/// Environment variable overriding `forward_mode`.
pub const ENV_FORWARD_MODE: &str = "TIDINGS_FORWARD_MODE";

/// Order of equal-priority listeners within one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First registered runs first.
    #[default]
    Registration,
    /// Last registered runs first.
    NewestFirst,
}

impl TieBreak {
    /// Returns the canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::NewestFirst => "newest_first",
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registration" | "fifo" => Ok(Self::Registration),
            "newest_first" | "newest-first" | "lifo" => Ok(Self::NewestFirst),
            other => Err(format!(
                "unknown tie break '{other}' (expected 'registration' or 'newest_first')"
            )),
        }
    }
}

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Priority used when a listener is added without one.
    pub default_priority: i32,
    /// Separates component and method in aggregate event types.
    pub separator: char,
    /// Order of equal-priority listeners.
    pub tie_break: TieBreak,
    /// Forwarding mode used when a dispatch does not specify one.
    pub forward_mode: ForwardMode,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_priority: DEFAULT_PRIORITY,
            separator: ':',
            tie_break: TieBreak::Registration,
            forward_mode: ForwardMode::PassEvent,
        }
    }
}

impl DispatcherConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ParseToml`] for malformed TOML or unknown enum values,
    /// [`ConfigError::InvalidValue`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::ParseToml {
            path: None,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ReadFile`] if the file cannot be read, plus everything
    /// [`from_toml_str`](Self::from_toml_str) returns.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseToml {
            path: Some(path.to_path_buf()),
            source: e,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded dispatcher config");
        Ok(config)
    }

    /// Applies `TIDINGS_*` environment variables.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnvVar`] if a variable is set but unparsable.
    pub fn apply_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable source.
    ///
    /// [`apply_env_overrides`](Self::apply_env_overrides) calls this with the
    /// process environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnvVar`] if a variable is present but unparsable.
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_DEFAULT_PRIORITY) {
            self.default_priority = val
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(ENV_DEFAULT_PRIORITY, "expected integer"))?;
        }

        if let Some(val) = lookup(ENV_SEPARATOR) {
            let mut chars = val.chars();
            self.separator = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(ConfigError::invalid_env_var(
                        ENV_SEPARATOR,
                        "expected exactly one character",
                    ))
                }
            };
        }

        if let Some(val) = lookup(ENV_TIE_BREAK) {
            self.tie_break = val
                .parse()
                .map_err(|msg: String| ConfigError::invalid_env_var(ENV_TIE_BREAK, msg))?;
        }

        if let Some(val) = lookup(ENV_FORWARD_MODE) {
            self.forward_mode = val
                .parse()
                .map_err(|e: tidings_types::UnknownForwardMode| {
                    ConfigError::invalid_env_var(ENV_FORWARD_MODE, e.to_string())
                })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] when the separator is whitespace or a
    /// control character.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.separator.is_whitespace() || self.separator.is_control() {
            return Err(ConfigError::InvalidValue {
                key: "separator".into(),
                message: format!("{:?} cannot separate component and method", self.separator),
            });
        }
        Ok(())
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config{}: {source}", display_path(.path))]
    ParseToml {
        /// File path, when parsing a file.
        path: Option<PathBuf>,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to serialize config.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An environment variable is set but unparsable.
    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar {
        /// Variable name.
        name: String,
        /// What was expected.
        message: String,
    },

    /// A field failed validation.
    #[error("invalid config value for '{key}': {message}")]
    InvalidValue {
        /// Field name.
        key: String,
        /// Why it was rejected.
        message: String,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" file '{}'", p.display()))
        .unwrap_or_default()
}

impl ConfigError {
    /// Creates a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid env var error.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "CONFIG_READ_FILE",
            Self::ParseToml { .. } => "CONFIG_PARSE_TOML",
            Self::Serialize(_) => "CONFIG_SERIALIZE",
            Self::InvalidEnvVar { .. } => "CONFIG_INVALID_ENV_VAR",
            Self::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::ReadFile { .. })
    }
}
