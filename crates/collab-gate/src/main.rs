//! Collab Gate
//!
//! Entry point for the collaborative-document connection gate.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Load the verification key and build the gate (fatal on failure)
//! 3. Optionally start the Prometheus `/metrics` listener
//! 4. Bind the configured transport ("Listening to port" marks readiness)
//! 5. Wait for SIGINT/SIGTERM, then destroy the server

#![warn(clippy::pedantic)]

use collab_gate::config::{Config, TransportKind};
use collab_gate::engine::{LoggingEngine, SyncEngine};
use collab_gate::gate::ConnectionGate;
use collab_gate::observability::{metrics::init_metrics_recorder, metrics_router};
use collab_gate::server::ServerOptions;
use collab_gate::transport::socketio::create_socketio_server;
use collab_gate::transport::websocket::create_websocket_server;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collab_gate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Collab Gate");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_host = %config.bind_host,
        port = config.port,
        transport = %config.transport,
        redis_prefix = %config.redis_prefix,
        perm_check_timeout_ms = config.perm_check_timeout.as_millis(),
        jwt_clock_skew_seconds = config.jwt_clock_skew_seconds,
        "Configuration loaded successfully"
    );

    let gate = ConnectionGate::from_config(&config).map_err(|e| {
        error!("Failed to initialize gate: {}", e);
        e
    })?;
    let gate = Arc::new(gate);

    let shutdown_token = CancellationToken::new();

    if let Some(metrics_addr) = &config.metrics_bind_address {
        let handle = init_metrics_recorder().map_err(|e| {
            error!(error = %e, "Failed to install Prometheus metrics recorder");
            e
        })?;

        let listener = tokio::net::TcpListener::bind(metrics_addr.as_str())
            .await
            .map_err(|e| {
                error!(error = %e, addr = %metrics_addr, "Failed to bind metrics server");
                e
            })?;
        info!(addr = %metrics_addr, "Metrics server bound successfully");

        let metrics_token = shutdown_token.child_token();
        tokio::spawn(async move {
            let server = axum::serve(listener, metrics_router(handle))
                .with_graceful_shutdown(async move { metrics_token.cancelled().await });
            if let Err(e) = server.await {
                error!(error = %e, "Metrics server failed");
            }
        });
    }

    let engine: Arc<dyn SyncEngine> = Arc::new(LoggingEngine::new(config.redis_prefix.clone()));
    let options = ServerOptions::from_config(&config);

    let server = match config.transport {
        TransportKind::WebSocket => create_websocket_server(&options, gate, engine).await,
        TransportKind::SocketIo => create_socketio_server(&options, gate, engine).await,
    }
    .map_err(|e| {
        error!("Failed to start {} transport: {}", config.transport, e);
        e
    })?;

    info!(
        addr = %server.local_addr(),
        transport = %config.transport,
        "Collab Gate running - press Ctrl+C to shutdown"
    );

    shutdown_signal().await;

    server.destroy().await;
    shutdown_token.cancel();

    info!("Collab Gate shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
