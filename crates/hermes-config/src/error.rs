use std::path::PathBuf;

use thiserror::Error;

/// Failures loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The named file does not exist.
    #[error("configuration file not found: {}", path.display())]
    FileNotFound {
        /// Path that was tried.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read {}", path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML is malformed or has unknown keys.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be applied.
    #[error("environment variable {key}: {message}")]
    Env {
        /// Variable name.
        key: String,
        /// What was wrong with it.
        message: String,
    },

    /// Values parse but do not make sense together.
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Dotted path of the offending value.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn env(key: &str, message: impl Into<String>) -> Self {
        Self::Env {
            key: key.to_string(),
            message: message.into(),
        }
    }
}
