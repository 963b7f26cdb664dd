//! Wiring a [`GatewayConfig`] into the server pieces.

use std::time::Duration;

use hermes_config::{ConfigError, GatewayConfig};
use hermes_router::RouteConflict;
use hermes_server::{Dispatcher, RouterBuilder, Server, ServerConfig, ServerError};
use hermes_telemetry::TelemetryError;

/// Anything that stops the gateway from starting.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Logging could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The route table is inconsistent.
    #[error(transparent)]
    Routes(#[from] RouteConflict),
    /// The listener failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// A [`RouterBuilder`] with the `[correlation]` section applied.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the correlation header is not a
/// valid header name.
pub fn router_builder(config: &GatewayConfig) -> Result<RouterBuilder, ConfigError> {
    Ok(RouterBuilder::new()
        .correlation_header(config.correlation.header_name()?)
        .trust_incoming_correlation(config.correlation.trust_incoming))
}

/// The listener settings of the `[server]` section.
#[must_use]
pub fn server_config(config: &GatewayConfig) -> ServerConfig {
    ServerConfig::builder()
        .http_addr(config.server.http_addr.clone())
        .shutdown_timeout(Duration::from_secs(config.server.shutdown_timeout_secs))
        .max_body_size(config.server.max_body_size)
        .build()
}

/// Installs logging from `[logging]` and serves `dispatcher` until SIGINT
/// or SIGTERM.
///
/// # Errors
///
/// Fails if logging cannot be installed or the listener cannot start.
pub async fn serve(config: &GatewayConfig, dispatcher: Dispatcher) -> Result<(), GatewayError> {
    hermes_telemetry::init_logging(&config.logging)?;
    tracing::info!(
        http_addr = %config.server.http_addr,
        routes = dispatcher.route_count(),
        "starting gateway"
    );
    Server::new(server_config(config), dispatcher).run().await?;
    Ok(())
}
