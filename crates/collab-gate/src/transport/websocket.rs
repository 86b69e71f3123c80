//! Raw WebSocket transport.
//!
//! `GET /:room?yauth=<credential>` with an upgrade. Admission runs before the
//! upgrade is accepted, so a rejected client sees a plain HTTP error (400, 401
//! or 503) and the handshake never completes.

use crate::engine::SyncEngine;
use crate::errors::{GateError, StartupError};
use crate::gate::ConnectionGate;
use crate::observability::metrics::record_admission;
use crate::server::{self, ServerHandle, ServerOptions};
use crate::transport::{credential_from_uri, request_span};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

const TRANSPORT: &str = "websocket";

#[derive(Clone)]
struct WebSocketState {
    gate: Arc<ConnectionGate>,
    engine: Arc<dyn SyncEngine>,
}

/// Router for the WebSocket transport.
pub fn websocket_router(gate: Arc<ConnectionGate>, engine: Arc<dyn SyncEngine>) -> Router {
    Router::new()
        .route("/:room", get(upgrade_handler))
        .with_state(WebSocketState { gate, engine })
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
}

/// Bind and serve the WebSocket transport.
///
/// # Errors
///
/// Returns `StartupError::Bind` if the port cannot be bound.
pub async fn create_websocket_server(
    options: &ServerOptions,
    gate: Arc<ConnectionGate>,
    engine: Arc<dyn SyncEngine>,
) -> Result<ServerHandle, StartupError> {
    server::serve(options, websocket_router(gate, engine)).await
}

async fn upgrade_handler(
    State(state): State<WebSocketState>,
    Path(room): Path<String>,
    uri: Uri,
    ws: WebSocketUpgrade,
) -> Response {
    let credential = credential_from_uri(&uri);

    match state.gate.authenticate(&room, credential.as_deref()).await {
        Ok(access) => {
            record_admission(TRANSPORT, "admitted");
            let engine = Arc::clone(&state.engine);
            ws.on_upgrade(move |socket| async move { engine.on_websocket(socket, access).await })
        }
        Err(e) => reject(&room, e),
    }
}

fn reject(room: &str, error: GateError) -> Response {
    record_admission(TRANSPORT, error.kind());
    info!(
        target: "gate.transport.ws",
        room = %room,
        reason = error.kind(),
        status = error.status_code(),
        "WebSocket upgrade refused"
    );
    error.into_response()
}
