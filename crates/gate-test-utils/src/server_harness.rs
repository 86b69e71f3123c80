//! Test server harness for E2E testing
//!
//! Provides `TestGateServer` for spawning real gate instances in tests.

use crate::crypto_fixtures::TestSigningKey;
use crate::permission_service::MockPermissionService;
use crate::recording_engine::{Admission, RecordingEngine};
use crate::token_builders::TestTokenBuilder;
use collab_gate::config::{Config, TransportKind};
use collab_gate::engine::SyncEngine;
use collab_gate::gate::ConnectionGate;
use collab_gate::server::{ServerHandle, ServerOptions};
use collab_gate::transport::socketio::create_socketio_server;
use collab_gate::transport::websocket::create_websocket_server;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long `next_admission` waits before giving up.
const ADMISSION_TIMEOUT: Duration = Duration::from_secs(5);

/// A running gate wired to a mock permission service and a recording engine.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_admits_alice() -> Result<()> {
///     let mut server = TestGateServer::spawn(TransportKind::WebSocket).await?;
///     server.permissions.grant("doc42", "alice", json!({"yaccess": "rw"})).await;
///
///     let token = server.token_for("alice");
///     let (_ws, _) = connect_async(server.ws_url("doc42", Some(&token))).await?;
///
///     assert!(matches!(server.next_admission().await, Some(Admission::WebSocket(_))));
///     Ok(())
/// }
/// ```
pub struct TestGateServer {
    pub signing_key: TestSigningKey,
    pub permissions: MockPermissionService,
    admissions: mpsc::UnboundedReceiver<Admission>,
    handle: ServerHandle,
}

impl TestGateServer {
    /// Spawn a gate on an ephemeral loopback port.
    pub async fn spawn(transport: TransportKind) -> Result<Self, anyhow::Error> {
        Self::spawn_with_key(transport, TestSigningKey::ed25519(1)).await
    }

    /// Spawn a gate that verifies against `signing_key`.
    pub async fn spawn_with_key(
        transport: TransportKind,
        signing_key: TestSigningKey,
    ) -> Result<Self, anyhow::Error> {
        let permissions = MockPermissionService::start().await;

        let vars = HashMap::from([
            ("AUTH_PUBLIC_KEY".to_string(), signing_key.jwk_json()),
            ("AUTH_PERM_CALLBACK".to_string(), permissions.base_url()),
            ("BIND_HOST".to_string(), "127.0.0.1".to_string()),
            ("PORT".to_string(), "0".to_string()),
            ("TRANSPORT".to_string(), transport.as_str().to_string()),
            ("PERM_CHECK_TIMEOUT_MS".to_string(), "1000".to_string()),
            ("DRAIN_SECONDS".to_string(), "1".to_string()),
        ]);
        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let gate = Arc::new(
            ConnectionGate::from_config(&config)
                .map_err(|e| anyhow::anyhow!("Failed to create gate: {}", e))?,
        );
        let (engine, admissions) = RecordingEngine::new();
        let engine: Arc<dyn SyncEngine> = engine;
        let options = ServerOptions::from_config(&config);

        let handle = match transport {
            TransportKind::WebSocket => create_websocket_server(&options, gate, engine).await,
            TransportKind::SocketIo => create_socketio_server(&options, gate, engine).await,
        }
        .map_err(|e| anyhow::anyhow!("Failed to start test server: {}", e))?;

        Ok(Self {
            signing_key,
            permissions,
            admissions,
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    /// Base HTTP URL of the server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr())
    }

    /// WebSocket URL for `room`, with `yauth` when a token is given.
    pub fn ws_url(&self, room: &str, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("ws://{}/{}?yauth={}", self.addr(), room, token),
            None => format!("ws://{}/{}", self.addr(), room),
        }
    }

    /// Valid credential for `user_id` signed by the server's key.
    pub fn token_for(&self, user_id: &str) -> String {
        TestTokenBuilder::for_user(user_id).sign(&self.signing_key)
    }

    /// Next connection handed to the engine, or `None` after a timeout.
    pub async fn next_admission(&mut self) -> Option<Admission> {
        tokio::time::timeout(ADMISSION_TIMEOUT, self.admissions.recv())
            .await
            .ok()
            .flatten()
    }

    /// Admission already queued, without waiting.
    pub fn try_admission(&mut self) -> Option<Admission> {
        self.admissions.try_recv().ok()
    }

    /// Destroy the server and return its address.
    pub async fn shutdown(self) -> SocketAddr {
        let addr = self.addr();
        self.handle.destroy().await;
        addr
    }
}
