//! Socket.IO fallback transport.
//!
//! Serves Socket.IO on the default namespace. The credential is the `yauth`
//! field of the handshake query. A connect middleware verifies it before the
//! socket joins the namespace, so a rejected client receives CONNECT_ERROR
//! instead of a CONNECT ack. Room access is not resolved here: the engine
//! asks the gate per room once the client names one.
//!
//! Every non-Socket.IO request gets `{"ok": true}`.

use crate::engine::SyncEngine;
use crate::errors::{GateError, StartupError};
use crate::gate::ConnectionGate;
use crate::models::AuthenticatedUser;
use crate::observability::metrics::record_admission;
use crate::server::{self, ServerHandle, ServerOptions};
use crate::transport::{credential_from_uri, request_span};
use axum::{Json, Router};
use serde_json::{json, Value};
use socketioxide::extract::{Extension, SocketRef};
use socketioxide::handler::ConnectHandler;
use socketioxide::SocketIo;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

const TRANSPORT: &str = "socketio";

/// Router for the Socket.IO transport.
pub fn socketio_router(gate: Arc<ConnectionGate>, engine: Arc<dyn SyncEngine>) -> Router {
    let (layer, io) = SocketIo::new_layer();

    let on_connect = move |socket: SocketRef, Extension(user): Extension<AuthenticatedUser>| {
        let engine = Arc::clone(&engine);
        async move {
            record_admission(TRANSPORT, "admitted");
            engine.on_socketio(socket, user).await;
        }
    };
    let check_credential = move |socket: SocketRef| admit(&socket, &gate);

    io.ns("/", on_connect.with(check_credential));

    Router::new()
        .fallback(health)
        .layer(layer)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
}

/// Bind and serve the Socket.IO transport.
///
/// # Errors
///
/// Returns `StartupError::Bind` if the port cannot be bound.
pub async fn create_socketio_server(
    options: &ServerOptions,
    gate: Arc<ConnectionGate>,
    engine: Arc<dyn SyncEngine>,
) -> Result<ServerHandle, StartupError> {
    server::serve(options, socketio_router(gate, engine)).await
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Connect middleware: verify the credential and stash the identity for the
/// connect handler. An error becomes the CONNECT_ERROR message.
fn admit(socket: &SocketRef, gate: &ConnectionGate) -> Result<(), GateError> {
    let credential = credential_from_uri(&socket.req_parts().uri);

    match gate.identify(credential.as_deref()) {
        Ok(user) => {
            socket.extensions.insert(user);
            Ok(())
        }
        Err(e) => {
            record_admission(TRANSPORT, e.kind());
            info!(
                target: "gate.transport.socketio",
                sid = %socket.id,
                reason = e.kind(),
                "Socket.IO connection refused"
            );
            Err(e)
        }
    }
}
