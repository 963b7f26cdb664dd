//! Layered loading.

use std::fs;
use std::path::Path;

use hermes_telemetry::LogFormat;

use crate::config::GatewayConfig;
use crate::error::ConfigError;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "HERMES";

/// Builds a [`GatewayConfig`] from defaults, a file and the environment.
#[derive(Debug, Default)]
#[must_use]
pub struct ConfigLoader {
    config: GatewayConfig,
    env: Vec<(String, String)>,
}

impl ConfigLoader {
    /// Starts from the defaults with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current layer with the contents of a TOML file.
    ///
    /// Keys the file leaves out keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable or not valid configuration.
    pub fn with_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.with_toml(&content)
    }

    /// Like [`Self::with_file`], but a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Replaces the current layer with TOML text.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or unknown keys.
    pub fn with_toml(mut self, content: &str) -> Result<Self, ConfigError> {
        self.config = toml::from_str(content)?;
        Ok(self)
    }

    /// Queues overrides from the process environment.
    pub fn with_process_env(self) -> Self {
        self.with_env_vars(std::env::vars())
    }

    /// Queues overrides from explicit variables. Names not starting with
    /// `HERMES__` are ignored.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let prefix = format!("{ENV_PREFIX}__");
        self.env.extend(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .filter(|(key, _)| key.starts_with(&prefix)),
        );
        self
    }

    /// Applies overrides and validates.
    ///
    /// # Errors
    ///
    /// Fails on an unknown or unparsable override, or a config that does
    /// not validate.
    pub fn load(mut self) -> Result<GatewayConfig, ConfigError> {
        let env = std::mem::take(&mut self.env);
        for (key, value) in &env {
            self.apply_env_var(key, value)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    fn apply_env_var(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let path = key
            .strip_prefix(ENV_PREFIX)
            .and_then(|rest| rest.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env(key, "expected HERMES__<SECTION>__<KEY>"))?;
        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "MAX_BODY_SIZE"] => config.server.max_body_size = parse_number(key, value)?,
            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_bool(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_ascii_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env(key, "expected 'json' or 'pretty'")),
                };
            }
            ["LOGGING", "SPAN_EVENTS"] => config.logging.span_events = parse_bool(key, value)?,
            ["CORRELATION", "HEADER"] => config.correlation.header = value.to_string(),
            ["CORRELATION", "TRUST_INCOMING"] => {
                config.correlation.trust_incoming = parse_bool(key, value)?;
            }
            _ => return Err(ConfigError::env(key, "unknown configuration key")),
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env(key, format!("expected a number, got '{value}'")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env(key, format!("expected a boolean, got '{value}'"))),
    }
}
