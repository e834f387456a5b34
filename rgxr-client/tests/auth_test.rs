//! Login and bearer-token propagation.

use rgxr_client::{Client, ClientConfig, FileTokenStore, TokenStore};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fa_json() -> serde_json::Value {
    json!({
        "alphabet": ["a"],
        "states": ["s0"],
        "initial": "s0",
        "acceptance": ["s0"],
        "transitions": [["s0"]]
    })
}

async fn mount_union(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/union"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fa_json()))
        .mount(server)
        .await;
}

async fn last_authorization(server: &MockServer) -> Option<String> {
    let reqs = server.received_requests().await.unwrap_or_default();
    reqs.last()
        .and_then(|r| r.headers.get("authorization"))
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn test_bearer_header_appears_after_login() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("credentials.json");

    Mock::given(method("POST"))
        .and(path("/pgapi/rpc/login"))
        .and(body_json(json!({ "email": "ada@example.com", "pass": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "jwt-1" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_union(&server).await;

    let config = ClientConfig::new(server.uri()).with_token_file(&token_path);
    let client = Client::new(config).unwrap();

    client.union(["a", "b"]).await.unwrap();
    assert_eq!(last_authorization(&server).await, None);

    client.login("ada@example.com", "hunter2").await.unwrap();
    assert!(client.is_authenticated());

    client.union(["a", "b"]).await.unwrap();
    assert_eq!(
        last_authorization(&server).await.as_deref(),
        Some("Bearer jwt-1")
    );

    let stored = FileTokenStore::new(&token_path).load().unwrap();
    assert_eq!(stored.as_deref(), Some("jwt-1"));
}

#[tokio::test]
async fn test_login_sends_no_bearer_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pgapi/rpc/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "new" })))
        .mount(&server)
        .await;

    let client = Client::new(ClientConfig::new(server.uri()).with_auth_token("old")).unwrap();
    client.login("a@b.c", "pw").await.unwrap();

    assert_eq!(last_authorization(&server).await, None);
    assert_eq!(client.token().as_deref(), Some("new"));
}

#[tokio::test]
async fn test_login_accepts_array_wrapped_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pgapi/rpc/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "token": "jwt-2" }])))
        .mount(&server)
        .await;

    let client = Client::new(ClientConfig::new(server.uri())).unwrap();
    client.login("a@b.c", "pw").await.unwrap();
    assert_eq!(client.token().as_deref(), Some("jwt-2"));
}

#[tokio::test]
async fn test_failed_login_leaves_client_unauthenticated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pgapi/rpc/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = Client::new(ClientConfig::new(server.uri())).unwrap();
    let err = client.login("a@b.c", "wrong").await.unwrap_err();

    assert!(err.is_auth_failure());
    assert_eq!(err.to_string(), "Login failed: Unauthorized");
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_failed_login_keeps_previous_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pgapi/rpc/login"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = Client::new(ClientConfig::new(server.uri())).unwrap();
    client.set_token("earlier");
    assert!(client.login("a@b.c", "wrong").await.is_err());
    assert_eq!(client.token().as_deref(), Some("earlier"));
}

#[tokio::test]
async fn test_login_reply_without_token_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pgapi/rpc/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .mount(&server)
        .await;

    let client = Client::new(ClientConfig::new(server.uri())).unwrap();
    assert!(client.login("a@b.c", "pw").await.is_err());
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_persisted_token_survives_new_client() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("nested").join("credentials.json");

    Mock::given(method("POST"))
        .and(path("/pgapi/rpc/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "kept" })))
        .mount(&server)
        .await;
    mount_union(&server).await;

    let first = Client::new(ClientConfig::new(server.uri()).with_token_file(&token_path)).unwrap();
    first.login("a@b.c", "pw").await.unwrap();
    drop(first);

    let second =
        Client::new(ClientConfig::new(server.uri()).with_token_file(&token_path)).unwrap();
    assert!(second.is_authenticated());
    second.union(["x"]).await.unwrap();
    assert_eq!(
        last_authorization(&server).await.as_deref(),
        Some("Bearer kept")
    );
}

#[tokio::test]
async fn test_login_repairs_corrupt_token_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("credentials.json");
    std::fs::write(&token_path, "{not json").unwrap();

    Mock::given(method("POST"))
        .and(path("/pgapi/rpc/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "repaired" })))
        .mount(&server)
        .await;

    let client =
        Client::new(ClientConfig::new(server.uri()).with_token_file(&token_path)).unwrap();
    assert!(!client.is_authenticated());

    client.login("a@b.c", "pw").await.unwrap();
    assert_eq!(client.token().as_deref(), Some("repaired"));

    let stored = FileTokenStore::new(&token_path).load().unwrap();
    assert_eq!(stored.as_deref(), Some("repaired"));
}
