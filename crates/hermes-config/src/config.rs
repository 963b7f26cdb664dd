//! Configuration sections.

use std::net::SocketAddr;

use hermes_telemetry::LogConfig;
use http::HeaderName;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Whole gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// `[server]`
    pub server: ServerSettings,
    /// `[logging]`
    pub logging: LogConfig,
    /// `[correlation]`
    pub correlation: CorrelationSettings,
}

/// `[server]`: the HTTP listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    /// `host:port` with a literal IP.
    pub http_addr: String,
    /// Seconds open connections get to finish on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Largest request body accepted, in bytes.
    pub max_body_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            shutdown_timeout_secs: 30,
            max_body_size: 1024 * 1024,
        }
    }
}

/// `[correlation]`: request correlation ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorrelationSettings {
    /// Header the id is read from and echoed on.
    pub header: String,
    /// Reuse a well-formed id sent by the client.
    pub trust_incoming: bool,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            header: "X-Correlation-ID".to_string(),
            trust_incoming: true,
        }
    }
}

impl CorrelationSettings {
    /// The header as an HTTP header name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the name is not a valid header.
    pub fn header_name(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::from_bytes(self.header.as_bytes()).map_err(|err| ConfigError::Invalid {
            field: "correlation.header",
            message: err.to_string(),
        })
    }
}

impl ServerSettings {
    /// The listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `http_addr` is not `ip:port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http_addr.parse().map_err(|err: std::net::AddrParseError| ConfigError::Invalid {
            field: "server.http_addr",
            message: format!("'{}': {err}", self.http_addr),
        })
    }
}

impl GatewayConfig {
    /// Checks values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;
        if self.server.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                field: "server.max_body_size",
                message: "must be greater than 0".to_string(),
            });
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "logging.level",
                message: "must not be empty".to_string(),
            });
        }
        self.correlation.header_name()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_telemetry::LogFormat;

    #[test]
    fn defaults_are_valid() {
        let config = GatewayConfig::default();
        config.validate().unwrap();
        assert_eq!(config.server.shutdown_timeout_secs, 30);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.correlation.trust_incoming);
        assert_eq!(config.correlation.header_name().unwrap(), "x-correlation-id");
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [server]
            http_addr = "127.0.0.1:3000"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert_eq!(config.server.shutdown_timeout_secs, 30);
        assert_eq!(config.correlation, CorrelationSettings::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<GatewayConfig>("[metrics]\nenabled = true").is_err());
        assert!(toml::from_str::<GatewayConfig>("[server]\nport = 80").is_err());
    }

    #[test]
    fn bad_values_fail_validation() {
        let mut config = GatewayConfig::default();
        config.server.http_addr = "localhost".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "server.http_addr", .. })
        ));

        let mut config = GatewayConfig::default();
        config.correlation.header = "bad header".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "correlation.header", .. })
        ));

        let mut config = GatewayConfig::default();
        config.server.max_body_size = 0;
        assert!(config.validate().is_err());
    }
}
