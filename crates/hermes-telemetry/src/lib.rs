//! # Hermes Telemetry
//!
//! Installs the process-wide `tracing` subscriber: an `EnvFilter` in front
//! of a JSON (production) or pretty (development) formatter.
//!
//! The dispatcher opens a `request` span per request carrying
//! [`fields::CORRELATION_ID`], [`fields::HTTP_METHOD`] and
//! [`fields::HTTP_PATH`]; with the JSON formatter every event logged
//! inside it carries those fields as well.
//!
//! ```rust,no_run
//! use hermes_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! tracing::info!("gateway starting");
//! # Ok::<(), hermes_telemetry::TelemetryError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod fields;
mod logging;

pub use error::TelemetryError;
pub use logging::{init_logging, subscriber, LogConfig, LogFormat};
