//! # Hermes Config
//!
//! Typed gateway configuration, loaded in layers:
//!
//! 1. built-in defaults
//! 2. a TOML file
//! 3. environment variables named `HERMES__<SECTION>__<KEY>`
//!
//! Unknown keys are errors at every layer.
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [correlation]
//! header = "X-Correlation-ID"
//! trust_incoming = true
//! ```
//!
//! ```rust
//! use hermes_config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_env_vars([("HERMES__SERVER__HTTP_ADDR", "127.0.0.1:9090")])
//!     .load()
//!     .unwrap();
//! assert_eq!(config.server.http_addr, "127.0.0.1:9090");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{CorrelationSettings, GatewayConfig, ServerSettings};
pub use error::ConfigError;
pub use hermes_telemetry::{LogConfig, LogFormat};
pub use loader::{ConfigLoader, ENV_PREFIX};
