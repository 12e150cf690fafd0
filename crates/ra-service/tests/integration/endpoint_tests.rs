//! HTTP endpoint coverage: existence probe, token issuance and exchange,
//! registration, health, and the collaborator-failure paths.

use anyhow::Context;
use ra_test_utils::TestServer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_health_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

#[tokio::test]
async fn test_user_exists_reports_directory_answer() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    server.mock_user_exists("a@x.com", true).await;
    server.mock_user_exists("nobody@x.com", false).await;

    let body: serde_json::Value = reqwest::get(format!("{}/userExists/a@x.com", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["exists"], true);

    let body: serde_json::Value = reqwest::get(format!("{}/userExists/nobody@x.com", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(body["exists"], false);

    Ok(())
}

#[tokio::test]
async fn test_user_exists_returns_503_when_directory_down() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    Mock::given(method("GET"))
        .and(path("/user/email/a@x.com"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server.directory)
        .await;

    let response = reqwest::get(format!("{}/userExists/a@x.com", server.url())).await?;
    assert_eq!(response.status(), 503);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "DIRECTORY_UNAVAILABLE");

    Ok(())
}

#[tokio::test]
async fn test_try_connect_unknown_user_gets_no_token() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    server.mock_user_exists("nobody@x.com", false).await;

    let body: serde_json::Value = reqwest::get(format!("{}/tryConnect/nobody@x.com", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(body["exists"], false);
    assert!(body.get("token").is_none());

    Ok(())
}

#[tokio::test]
async fn test_try_connect_token_is_valid_for_exchange() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    server.mock_user_exists("a@x.com", true).await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .get(format!("{}/tryConnect/a@x.com", server.url()))
        .send()
        .await?
        .json()
        .await?;
    let token = body["token"].as_str().context("expected a token")?;

    let response = client
        .post(format!("{}/connectFromToken", server.url()))
        .json(&serde_json::json!({"email": "a@x.com", "token": token}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["isAuthValid"], true);

    Ok(())
}

#[tokio::test]
async fn test_connect_from_token_rejects_bad_token() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/connectFromToken", server.url()))
        .json(&serde_json::json!({"email": "a@x.com", "token": "not-a-token"}))
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");

    Ok(())
}

#[tokio::test]
async fn test_connect_from_token_rejects_expired_token() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let expired = server.issue_expired_token("a@x.com")?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/connectFromToken", server.url()))
        .json(&serde_json::json!({"email": "a@x.com", "token": expired}))
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    Ok(())
}

#[tokio::test]
async fn test_connect_from_token_rejects_mismatched_identity() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let token = server.issue_token("a@x.com", 5)?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/connectFromToken", server.url()))
        .json(&serde_json::json!({"email": "b@x.com", "token": token}))
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    Ok(())
}

#[tokio::test]
async fn test_register_new_user_succeeds() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    server.mock_user_exists("new@x.com", false).await;
    server.mock_create_user(200).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/register", server.url()))
        .json(&serde_json::json!({
            "email": "new@x.com",
            "signatures": [{"abs": [1, 2], "ord": [3, 4], "time": [5, 6]}]
        }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["isRegistrationValid"], true);

    Ok(())
}

#[tokio::test]
async fn test_register_existing_user_is_refused() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    server.mock_user_exists("a@x.com", true).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/register", server.url()))
        .json(&serde_json::json!({"email": "a@x.com", "signatures": []}))
        .send()
        .await?;
    assert_eq!(response.status(), 409);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "USER_EXISTS");

    Ok(())
}

#[tokio::test]
async fn test_register_surfaces_directory_rejection() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    server.mock_user_exists("new@x.com", false).await;
    server.mock_create_user(400).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/register", server.url()))
        .json(&serde_json::json!({"email": "new@x.com", "signatures": []}))
        .send()
        .await?;
    assert_eq!(response.status(), 500);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "REGISTRATION_FAILED");

    Ok(())
}
