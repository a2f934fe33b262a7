// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub Contents API mapping tests against a mock server.
//!
//! These tests verify that:
//! 1. Identity checks map every failure to InvalidCredential
//! 2. Reads treat 404 as "absent" and unwrap GitHub's wrapped base64
//! 3. Writes send the SHA as the CAS token and surface conflicts

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use matkarajad_sync::error::AppError;
use matkarajad_sync::models::{CasToken, Principal};
use matkarajad_sync::services::{CredentialStore, MemoryCredentialStore, TrailSession, PAT_KEY};
use matkarajad_sync::store::ResourceStore;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

mod common;
use common::{github_store, CONTENTS_PATH, TEST_LOGIN, TEST_PASSWORD, TEST_PAT};

fn principal() -> Principal {
    Principal::new(TEST_LOGIN, TEST_PAT)
}

/// Mimic GitHub's 60-column line wrapping of file content.
fn wrapped_base64(content: &[u8]) -> String {
    let encoded = BASE64.encode(content);
    encoded
        .as_bytes()
        .chunks(60)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

fn has_no_sha(req: &Request) -> bool {
    let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap_or_default();
    body.get("sha").is_none()
}

// ─── Authentication ──────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", format!("Bearer {}", TEST_PAT).as_str()))
        .and(header("accept", "application/vnd.github.v3+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": TEST_LOGIN,
            "id": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let principal = store.authenticate(TEST_PAT).await.unwrap();

    assert_eq!(principal.login, TEST_LOGIN);
    assert_eq!(principal.credential(), TEST_PAT);
}

#[tokio::test]
async fn test_authenticate_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Bad credentials"
        })))
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    assert!(matches!(
        store.authenticate("ghp_wrong").await,
        Err(AppError::InvalidCredential)
    ));
}

#[tokio::test]
async fn test_authenticate_network_failure() {
    // Nothing listens on port 1.
    let store = github_store("http://127.0.0.1:1");
    assert!(matches!(
        store.authenticate(TEST_PAT).await,
        Err(AppError::InvalidCredential)
    ));
}

// ─── Reads ───────────────────────────────────────────────────

#[tokio::test]
async fn test_read_absent_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found"
        })))
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let resource = store.read_resource(&principal()).await.unwrap();

    assert!(resource.is_absent());
    assert!(resource.token.is_none());
}

#[tokio::test]
async fn test_read_present_resource() {
    let server = MockServer::start().await;
    // Long enough to be wrapped over several lines.
    let content = "QUJD".repeat(40).into_bytes();

    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .and(header("authorization", format!("Bearer {}", TEST_PAT).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "file",
            "encoding": "base64",
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
            "content": wrapped_base64(&content)
        })))
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let resource = store.read_resource(&principal()).await.unwrap();

    assert_eq!(resource.content.as_deref(), Some(content.as_slice()));
    assert_eq!(
        resource.token,
        Some(CasToken::new("3d21ec53a331a6f037a91c368710b99387d012c1"))
    );
}

#[tokio::test]
async fn test_read_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let err = store.read_resource(&principal()).await.unwrap_err();

    assert!(matches!(err, AppError::ReadFailed(_)));
    assert!(!err.is_rate_limited());
}

#[tokio::test]
async fn test_read_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let err = store.read_resource(&principal()).await.unwrap_err();

    assert!(matches!(err, AppError::ReadFailed(_)));
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_read_error_mentioning_rate_limit_is_not_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Backend rate limited, try later"
        })))
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let err = store.read_resource(&principal()).await.unwrap_err();

    match &err {
        AppError::ReadFailed(reason) => assert!(reason.contains("Backend rate limited")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_rate_limited());
}

// ─── Writes ──────────────────────────────────────────────────

#[tokio::test]
async fn test_create_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(json!({
            "message": "Update user trail data",
            "content": BASE64.encode(b"envelope")
        })))
        .and(has_no_sha)
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": { "sha": "t0", "path": "data/user-data.json.encrypted" },
            "commit": { "sha": "c0" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let token = store
        .write_resource(&principal(), b"envelope", None)
        .await
        .unwrap();

    assert_eq!(token, CasToken::new("t0"));
}

#[tokio::test]
async fn test_stale_token_conflicts() {
    let server = MockServer::start().await;

    // First write with t0 succeeds and moves the file to t1.
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(json!({ "sha": "t0" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": { "sha": "t1" }
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    // Any later write presenting t0 is stale.
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(json!({ "sha": "t0" })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "data/user-data.json.encrypted does not match t0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let t0 = CasToken::new("t0");

    let t1 = store
        .write_resource(&principal(), b"first", Some(&t0))
        .await
        .unwrap();
    assert_eq!(t1, CasToken::new("t1"));
    assert_ne!(t1, t0);

    let err = store
        .write_resource(&principal(), b"second", Some(&t0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::WriteConflict));
    assert!(err.requires_reload());
}

#[tokio::test]
async fn test_create_over_existing_file_conflicts() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Invalid request.\n\n\"sha\" wasn't supplied."
        })))
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let result = store.write_resource(&principal(), b"x", None).await;

    assert!(matches!(result, Err(AppError::WriteConflict)));
}

#[tokio::test]
async fn test_unprocessable_with_token_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Invalid request."
        })))
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let result = store
        .write_resource(&principal(), b"x", Some(&CasToken::new("t0")))
        .await;

    match result {
        Err(AppError::WriteFailed(reason)) => assert!(reason.contains("Invalid request")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_repository_is_failure_not_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Git Repository is empty."
        })))
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let result = store.write_resource(&principal(), b"x", None).await;

    assert!(matches!(result, Err(AppError::WriteFailed(_))));
}

#[tokio::test]
async fn test_write_rate_limited_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let err = store
        .write_resource(&principal(), b"x", Some(&CasToken::new("t0")))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::WriteFailed(_)));
    assert!(err.is_rate_limited());
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_write_unauthorized_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Bad credentials"
        })))
        .mount(&server)
        .await;

    let store = github_store(&server.uri());
    let result = store
        .write_resource(&principal(), b"x", Some(&CasToken::new("t0")))
        .await;

    match result {
        Err(AppError::WriteFailed(reason)) => assert!(reason.contains("Bad credentials")),
        other => panic!("unexpected result: {other:?}"),
    }
}

// ─── Session over GitHub ─────────────────────────────────────

#[tokio::test]
async fn test_first_unlock_creates_remote_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": TEST_LOGIN })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(has_no_sha)
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": { "sha": "t0" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = MemoryCredentialStore::new();
    let mut session =
        TrailSession::new(github_store(&server.uri()), Box::new(credentials.clone()));

    session.connect(TEST_PAT).await.unwrap();
    session.unlock(TEST_PASSWORD, false).await.unwrap();

    assert_eq!(session.username(), Some(TEST_LOGIN));
    assert_eq!(session.cas_token(), Some(&CasToken::new("t0")));
    assert_eq!(session.completed_count(), 0);
    assert_eq!(credentials.get(PAT_KEY).unwrap().as_deref(), Some(TEST_PAT));
}
