//! Engine that records admissions for assertions.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use collab_gate::engine::SyncEngine;
use collab_gate::models::{AccessDescriptor, AuthenticatedUser};
use socketioxide::extract::SocketRef;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A connection handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    WebSocket(AccessDescriptor),
    SocketIo(AuthenticatedUser),
}

/// Records every admission and echoes WebSocket text frames.
pub struct RecordingEngine {
    admissions: mpsc::UnboundedSender<Admission>,
}

impl RecordingEngine {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Admission>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { admissions: tx }), rx)
    }
}

#[async_trait]
impl SyncEngine for RecordingEngine {
    async fn on_websocket(&self, mut socket: WebSocket, access: AccessDescriptor) {
        let _ = self.admissions.send(Admission::WebSocket(access));

        while let Some(Ok(message)) = socket.recv().await {
            match message {
                Message::Text(text) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    }

    async fn on_socketio(&self, _socket: SocketRef, user: AuthenticatedUser) {
        let _ = self.admissions.send(Admission::SocketIo(user));
    }
}
