//! Errors raised while loading configuration.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot render configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for '{key}': {message}")]
    Validation { key: String, message: String },

    #[error("cannot parse environment variable {var}: {message}")]
    EnvParse { var: String, message: String },
}

impl ConfigError {
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_parse(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EnvParse {
            var: var.into(),
            message: message.into(),
        }
    }

    /// Configuration key (or environment variable) at fault, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Validation { key, .. } => Some(key),
            Self::EnvParse { var, .. } => Some(var),
            _ => None,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
