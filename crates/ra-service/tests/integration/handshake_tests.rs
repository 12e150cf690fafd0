//! End-to-end handshake scenarios: token issuance, channel open, answer
//! delivery through the hub, and the disconnect/expiry edge cases.

use anyhow::Context;
use futures::StreamExt;
use ra_test_utils::TestServer;
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite;

/// Poll the hub until it reports `expected` registered channels.
async fn wait_for_connections(server: &TestServer, expected: usize) -> Result<(), anyhow::Error> {
    for _ in 0..100 {
        let status = server
            .hub
            .status()
            .await
            .map_err(|e| anyhow::anyhow!("hub status failed: {e}"))?;
        if status.connections == expected {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    anyhow::bail!("hub never reached {expected} connections")
}

/// Scenario A: the full handshake. A waiting client receives the
/// affirmative answer with a non-empty session token.
#[tokio::test]
async fn test_full_handshake_delivers_affirmative_answer() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    server.mock_user_exists("a@x.com", true).await;
    let client = reqwest::Client::new();

    // Token issuance.
    let response = client
        .get(format!("{}/tryConnect/a@x.com", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["exists"], true);
    let token = body["token"]
        .as_str()
        .context("tryConnect should return a token")?
        .to_string();

    // Channel open.
    let (mut ws, _) = connect_async(server.ws_url("a@x.com", &token)).await?;
    wait_for_connections(&server, 1).await?;

    // Out-of-band answer.
    let response = client
        .post(format!("{}/authAnswer", server.url()))
        .json(&serde_json::json!({"client": "a@x.com", "isAuthValid": true}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    // The waiting client receives the packet.
    let message = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .context("timed out waiting for answer packet")?
        .context("stream ended before answer packet")??;
    let packet: serde_json::Value = serde_json::from_str(message.to_text()?)?;
    assert_eq!(packet["isAuthValid"], true);
    assert!(
        !packet["token"].as_str().unwrap_or_default().is_empty(),
        "affirmative answer should carry a session token"
    );

    Ok(())
}

/// A negative answer is delivered without a session token.
#[tokio::test]
async fn test_negative_answer_carries_no_token() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let token = server.issue_token("b@x.com", 5)?;
    let client = reqwest::Client::new();

    let (mut ws, _) = connect_async(server.ws_url("b@x.com", &token)).await?;
    wait_for_connections(&server, 1).await?;

    let response = client
        .post(format!("{}/authAnswer", server.url()))
        .json(&serde_json::json!({"client": "b@x.com", "isAuthValid": false}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let message = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .context("timed out waiting for answer packet")?
        .context("stream ended before answer packet")??;
    let packet: serde_json::Value = serde_json::from_str(message.to_text()?)?;
    assert_eq!(packet["isAuthValid"], false);
    assert!(packet.get("token").is_none());

    Ok(())
}

/// Scenario B: an answer arriving after the client disconnected is
/// accepted and silently dropped.
#[tokio::test]
async fn test_answer_after_disconnect_is_dropped() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let token = server.issue_token("a@x.com", 5)?;
    let client = reqwest::Client::new();

    let (mut ws, _) = connect_async(server.ws_url("a@x.com", &token)).await?;
    wait_for_connections(&server, 1).await?;

    ws.close(None).await?;
    wait_for_connections(&server, 0).await?;

    let response = client
        .post(format!("{}/authAnswer", server.url()))
        .json(&serde_json::json!({"client": "a@x.com", "isAuthValid": true}))
        .send()
        .await?;
    assert_eq!(response.status(), 200, "an undelivered answer is not an error");

    Ok(())
}

/// Scenario C: an expired token is refused before any channel is created.
#[tokio::test]
async fn test_expired_token_refused_before_upgrade() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let expired = server.issue_expired_token("a@x.com")?;

    let err = connect_async(server.ws_url("a@x.com", &expired))
        .await
        .err()
        .context("connect with expired token should fail")?;
    match err {
        tungstenite::Error::Http(response) => {
            assert_eq!(response.status().as_u16(), 401);
        }
        other => anyhow::bail!("unexpected handshake error: {other}"),
    }

    let status = server
        .hub
        .status()
        .await
        .map_err(|e| anyhow::anyhow!("hub status failed: {e}"))?;
    assert_eq!(status.connections, 0, "registry must be unchanged");

    Ok(())
}

/// A token bound to one identity cannot open a channel for another.
#[tokio::test]
async fn test_mismatched_identity_refused_before_upgrade() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let token = server.issue_token("a@x.com", 5)?;

    let err = connect_async(server.ws_url("b@x.com", &token))
        .await
        .err()
        .context("connect with mismatched identity should fail")?;
    match err {
        tungstenite::Error::Http(response) => {
            assert_eq!(response.status().as_u16(), 401);
        }
        other => anyhow::bail!("unexpected handshake error: {other}"),
    }

    Ok(())
}

/// A second connection for the same identity displaces the first; the
/// answer reaches only the replacement.
#[tokio::test]
async fn test_second_connection_displaces_first() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let first_token = server.issue_token("a@x.com", 5)?;
    let (mut first_ws, _) = connect_async(server.ws_url("a@x.com", &first_token)).await?;
    wait_for_connections(&server, 1).await?;

    let second_token = server.issue_token("a@x.com", 5)?;
    let (mut second_ws, _) = connect_async(server.ws_url("a@x.com", &second_token)).await?;

    // The superseded connection is force-closed by the hub.
    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match first_ws.next().await {
                Some(Ok(tungstenite::Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(_)) => break,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "first connection should be closed");
    wait_for_connections(&server, 1).await?;

    let response = client
        .post(format!("{}/authAnswer", server.url()))
        .json(&serde_json::json!({"client": "a@x.com", "isAuthValid": true}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let message = tokio::time::timeout(Duration::from_secs(2), second_ws.next())
        .await
        .context("timed out waiting for answer packet")?
        .context("stream ended before answer packet")??;
    let packet: serde_json::Value = serde_json::from_str(message.to_text()?)?;
    assert_eq!(packet["isAuthValid"], true);

    Ok(())
}
