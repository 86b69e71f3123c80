//! Socket.IO transport integration tests.
//!
//! Drives the Engine.IO v4 polling handshake by hand: open a session with
//! `yauth` in the query, send the namespace CONNECT packet (`40`), then poll
//! for the server's answer: `40{"sid":..}` on success, CONNECT_ERROR
//! (`44{"message":..}`) on refusal.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use collab_gate::config::TransportKind;
use collab_gate::models::AuthenticatedUser;
use gate_test_utils::{Admission, TestGateServer, TestSigningKey, TestTokenBuilder};
use std::time::Duration;

/// Open a polling session, connect to the default namespace and return the
/// server's reply to the CONNECT packet.
async fn connect_polling(server: &TestGateServer, token: Option<&str>) -> Result<String> {
    let client = reqwest::Client::new();
    let mut open_url = format!("{}/socket.io/?EIO=4&transport=polling", server.url());
    if let Some(token) = token {
        open_url.push_str(&format!("&yauth={token}"));
    }

    let open = client.get(&open_url).send().await?;
    assert_eq!(open.status().as_u16(), 200);
    let body = open.text().await?;

    // Engine.IO OPEN packet: "0" followed by the handshake JSON
    let handshake: serde_json::Value = serde_json::from_str(
        body.strip_prefix('0')
            .ok_or_else(|| anyhow::anyhow!("unexpected open packet: {body}"))?,
    )?;
    let sid = handshake["sid"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("handshake without sid: {body}"))?;

    let session_url = format!(
        "{}/socket.io/?EIO=4&transport=polling&sid={sid}",
        server.url()
    );
    let connect = client.post(&session_url).body("40").send().await?;
    assert_eq!(connect.status().as_u16(), 200);

    let reply = tokio::time::timeout(Duration::from_secs(5), async {
        client.get(&session_url).send().await?.text().await
    })
    .await??;
    Ok(reply)
}

/// Assert `reply` is a CONNECT_ERROR on the default namespace carrying `message`.
fn assert_connect_error(reply: &str, message: &str) -> Result<()> {
    // Packets in one polling payload are separated by 0x1e
    let first = reply.split('\u{1e}').next().unwrap_or_default();
    let payload = first
        .strip_prefix("44")
        .ok_or_else(|| anyhow::anyhow!("expected CONNECT_ERROR, got {reply:?}"))?;

    let body: serde_json::Value = serde_json::from_str(payload)?;
    assert_eq!(body, serde_json::json!({ "message": message }));
    assert!(!reply.contains("\u{1e}40"), "refused socket was acked: {reply:?}");
    Ok(())
}

#[tokio::test]
async fn test_health_route_answers_ok() -> Result<()> {
    let server = TestGateServer::spawn(TransportKind::SocketIo).await?;

    for path in ["/", "/anything/else"] {
        let response = reqwest::get(format!("{}{}", server.url(), path)).await?;
        assert_eq!(response.status().as_u16(), 200);

        let body: serde_json::Value = response.json().await?;
        assert_eq!(body, serde_json::json!({"ok": true}));
    }
    Ok(())
}

#[tokio::test]
async fn test_valid_credential_reaches_engine() -> Result<()> {
    let mut server = TestGateServer::spawn(TransportKind::SocketIo).await?;
    server.permissions.expect_no_requests().await;

    let token = server.token_for("alice");
    let reply = connect_polling(&server, Some(&token)).await?;
    assert!(reply.starts_with("40"), "expected CONNECT ack, got {reply:?}");

    assert_eq!(
        server.next_admission().await,
        Some(Admission::SocketIo(AuthenticatedUser {
            user_id: "alice".to_string(),
        }))
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_credential_gets_connect_error() -> Result<()> {
    let mut server = TestGateServer::spawn(TransportKind::SocketIo).await?;
    server.permissions.expect_no_requests().await;

    let reply = connect_polling(&server, None).await?;
    assert_connect_error(&reply, "Missing credential")?;

    let reply = connect_polling(&server, Some("")).await?;
    assert_connect_error(&reply, "Missing credential")?;

    assert!(server.try_admission().is_none());
    Ok(())
}

#[tokio::test]
async fn test_invalid_credential_gets_connect_error() -> Result<()> {
    let mut server = TestGateServer::spawn(TransportKind::SocketIo).await?;

    let forged = TestTokenBuilder::for_user("alice").sign(&TestSigningKey::ed25519(9));
    let reply = connect_polling(&server, Some(&forged)).await?;
    assert_connect_error(&reply, "The credential is invalid or expired")?;

    let expired = TestTokenBuilder::for_user("alice")
        .expired()
        .sign(&server.signing_key);
    let reply = connect_polling(&server, Some(&expired)).await?;
    assert_connect_error(&reply, "The credential is invalid or expired")?;

    assert!(server.try_admission().is_none());
    Ok(())
}

#[tokio::test]
async fn test_credential_without_user_gets_connect_error() -> Result<()> {
    let mut server = TestGateServer::spawn(TransportKind::SocketIo).await?;

    let token = TestTokenBuilder::without_user().sign(&server.signing_key);
    let reply = connect_polling(&server, Some(&token)).await?;
    assert_connect_error(&reply, "The credential does not identify a user")?;

    assert!(server.try_admission().is_none());
    Ok(())
}
