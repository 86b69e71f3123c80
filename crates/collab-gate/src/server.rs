//! Listener lifecycle shared by both transports.
//!
//! Binding happens before the handle is returned, so holding a
//! [`ServerHandle`] means the port is accepting connections.

use crate::config::Config;
use crate::errors::StartupError;
use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Where and how a transport listens.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,

    /// How long `destroy` waits for in-flight requests.
    pub drain: Duration,
}

impl ServerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.bind_host.clone(),
            port: config.port,
            drain: Duration::from_secs(config.drain_seconds),
        }
    }

    /// Loopback on an ephemeral port.
    pub fn ephemeral() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            drain: Duration::from_secs(1),
        }
    }
}

/// A running transport.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
    drain: Duration,
}

impl ServerHandle {
    /// Bound address; reports the real port when 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait up to the drain window for
    /// in-flight requests. Upgraded connections belong to the engine and are
    /// not waited for.
    pub async fn destroy(self) {
        let ServerHandle {
            local_addr,
            shutdown,
            mut task,
            drain,
        } = self;

        shutdown.cancel();

        if tokio::time::timeout(drain, &mut task).await.is_err() {
            warn!(
                target: "gate.server",
                addr = %local_addr,
                drain_secs = drain.as_secs(),
                "Drain window elapsed, aborting server"
            );
            task.abort();
        }

        info!(target: "gate.server", addr = %local_addr, "Server stopped");
    }
}

/// Bind `options` and serve `app` until the returned handle is destroyed.
///
/// # Errors
///
/// Returns `StartupError::Bind` if the address cannot be bound.
pub async fn serve(options: &ServerOptions, app: Router) -> Result<ServerHandle, StartupError> {
    let bind_error = |source: std::io::Error| {
        error!(
            target: "gate.server",
            host = %options.host,
            port = options.port,
            error = %source,
            "Failed to listen to port"
        );
        StartupError::Bind {
            port: options.port,
            source,
        }
    };

    let listener = TcpListener::bind((options.host.as_str(), options.port))
        .await
        .map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;

    info!(target: "gate.server", addr = %local_addr, port = local_addr.port(), "Listening to port");

    let shutdown = CancellationToken::new();
    let server_token = shutdown.clone();
    let task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            server_token.cancelled().await;
        });
        if let Err(e) = server.await {
            error!(target: "gate.server", error = %e, "Server failed");
        }
    });

    Ok(ServerHandle {
        local_addr,
        shutdown,
        task,
        drain: options.drain,
    })
}
