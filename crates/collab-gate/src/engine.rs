//! Seam between the gate and the document synchronization engine.
//!
//! Transports hand every admitted connection to a [`SyncEngine`]. The engine
//! owns the socket from then on; the gate never inspects traffic after
//! admission.

use crate::models::{AccessDescriptor, AuthenticatedUser};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use socketioxide::extract::SocketRef;
use tracing::{debug, info};

/// Receiver of admitted connections.
#[async_trait]
pub trait SyncEngine: Send + Sync + 'static {
    /// Called with an upgraded WebSocket after full admission. Runs for the
    /// lifetime of the connection.
    async fn on_websocket(&self, socket: WebSocket, access: AccessDescriptor);

    /// Called with a connected Socket.IO socket whose credential verified.
    /// Room access is resolved later, per room, by the engine.
    async fn on_socketio(&self, socket: SocketRef, user: AuthenticatedUser);
}

/// Engine that logs admissions and drains frames without syncing anything.
///
/// Stands in until a document engine is wired in.
#[derive(Debug, Clone)]
pub struct LoggingEngine {
    namespace: String,
}

impl LoggingEngine {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[async_trait]
impl SyncEngine for LoggingEngine {
    async fn on_websocket(&self, mut socket: WebSocket, access: AccessDescriptor) {
        info!(
            target: "gate.engine",
            namespace = %self.namespace,
            room = %access.room,
            user_id = %access.user_id,
            has_write_access = access.has_write_access,
            "WebSocket connection admitted"
        );

        let mut frames: u64 = 0;
        while let Some(Ok(message)) = socket.recv().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
            frames += 1;
        }

        debug!(
            target: "gate.engine",
            room = %access.room,
            frames = frames,
            "WebSocket connection closed"
        );
    }

    async fn on_socketio(&self, socket: SocketRef, user: AuthenticatedUser) {
        info!(
            target: "gate.engine",
            namespace = %self.namespace,
            sid = %socket.id,
            user_id = %user.user_id,
            "Socket.IO connection admitted"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_engine_keeps_namespace() {
        let engine = LoggingEngine::new("y");
        assert_eq!(engine.namespace(), "y");
    }
}
