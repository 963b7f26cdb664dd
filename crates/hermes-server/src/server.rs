//! The HTTP/1 listener.
//!
//! Accepts connections, buffers each request body up to the configured
//! limit and hands the request to the [`Dispatcher`]. On shutdown it stops
//! accepting, asks open connections to finish their current request and
//! waits up to the configured grace period for them.
//!
//! ```rust,no_run
//! use hermes_server::{RouterBuilder, Server, ServerConfig};
//!
//! # async fn start() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = RouterBuilder::new().build()?;
//! let config = ServerConfig::builder().http_addr("127.0.0.1:8080").build();
//! Server::new(config, dispatcher).run().await?;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hermes_core::ApiError;
use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::response::HttpResponse;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Failures starting the listener.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid listen address '{addr}'")]
    InvalidAddress {
        /// The address as configured.
        addr: String,
        /// Parser error.
        #[source]
        source: std::net::AddrParseError,
    },

    /// Binding the socket failed.
    #[error("failed to bind {addr}")]
    Bind {
        /// The address we tried.
        addr: SocketAddr,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// Any other socket error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Serves a [`Dispatcher`] over HTTP/1.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    /// A server for `dispatcher` with `config`.
    #[must_use]
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Listener settings.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The shared dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns a [`ServerError`] if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::from_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns a [`ServerError`] if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the listener's address cannot be read.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            routes = self.dispatcher.route_count(),
            "listening"
        );

        let tracker = ConnectionTracker::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let guard = tracker.track();
                        let dispatcher = Arc::clone(&self.dispatcher);
                        let config = self.config.clone();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            serve_connection(stream, remote_addr, dispatcher, &config, &shutdown).await;
                            drop(guard);
                        });
                    }
                    Err(err) => tracing::warn!(error = %err, "accept failed"),
                },
                () = shutdown.triggered() => break,
            }
        }

        let grace = self.config.shutdown_timeout();
        tracing::info!(
            open_connections = tracker.open_connections(),
            grace_secs = grace.as_secs(),
            "shutting down"
        );
        if tokio::time::timeout(grace, tracker.drained()).await.is_err() {
            tracing::warn!(
                open_connections = tracker.open_connections(),
                "grace period elapsed with connections still open"
            );
        }
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    config: &ServerConfig,
    shutdown: &ShutdownSignal,
) {
    let max_body_size = config.max_body_size();
    let service = service_fn(move |request: http::Request<Incoming>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { Ok::<_, Infallible>(handle(&dispatcher, request, max_body_size).await) }
    });

    let connection = http1::Builder::new()
        .keep_alive(config.keep_alive())
        .serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let mut draining = false;
    let result = loop {
        tokio::select! {
            result = connection.as_mut() => break result,
            () = shutdown.triggered(), if !draining => {
                draining = true;
                connection.as_mut().graceful_shutdown();
            }
        }
    };
    if let Err(err) = result {
        tracing::debug!(remote = %remote_addr, error = %err, "connection closed with error");
    }
}

async fn handle(dispatcher: &Dispatcher, request: http::Request<Incoming>, max_body_size: usize) -> HttpResponse {
    let (parts, body) = request.into_parts();
    match Limited::new(body, max_body_size).collect().await {
        Ok(collected) => {
            let request = http::Request::from_parts(parts, collected.to_bytes());
            dispatcher.dispatch(request).await
        }
        Err(err) => {
            let err = ApiError::message_parse().with_cause(err);
            dispatcher.reject(&parts.method, parts.uri.path(), &parts.headers, &err)
        }
    }
}
