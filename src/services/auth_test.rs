use super::*;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::crypto::{PublicKey, envelope};
use crate::error::ErrorCode;
use crate::test_support::{other_key, serve, shared_key};

#[derive(Clone, Default)]
struct Users(Arc<Mutex<HashMap<String, (String, String)>>>);

fn reject(status: StatusCode, detail: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": detail })))
}

fn sealed_token(public_pem: &str, username: &str) -> (StatusCode, Json<Value>) {
    let Ok(recipient) = PublicKey::from_pem(public_pem) else {
        return reject(StatusCode::BAD_REQUEST, "Invalid public key");
    };
    let token = json!({ "access_token": format!("tok-{username}"), "token_type": "bearer" });
    let encrypted = envelope::seal(&recipient, &token).unwrap();
    (StatusCode::OK, Json(json!({ "encrypted": encrypted })))
}

async fn register_handler(State(users): State<Users>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let username = body["username"].as_str().unwrap_or_default().to_owned();
    let password = body["password"].as_str().unwrap_or_default().to_owned();
    let public_key = body["public_key"].as_str().unwrap_or_default().to_owned();
    let mut users = users.0.lock().unwrap();
    if users.contains_key(&username) {
        return reject(StatusCode::BAD_REQUEST, "Username already registered");
    }
    users.insert(username, (password, public_key));
    (StatusCode::OK, Json(json!({ "status": "User registered" })))
}

async fn login_handler(State(users): State<Users>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let matches = users.0.lock().unwrap().get(username).is_some_and(|(stored, _)| stored == password);
    if !matches {
        return reject(StatusCode::UNAUTHORIZED, "Incorrect username or password");
    }
    sealed_token(body["public_key"].as_str().unwrap_or_default(), username)
}

async fn login_db_handler(State(users): State<Users>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let public_key = match users.0.lock().unwrap().get(username) {
        Some((stored, public_key)) if stored == password => public_key.clone(),
        _ => return reject(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    };
    sealed_token(&public_key, username)
}

async fn backend() -> (ApiClient, Users) {
    let users = Users::default();
    let app = Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/login-db", post(login_db_handler))
        .with_state(users.clone());
    (serve(app).await, users)
}

// =============================================================================
// register
// =============================================================================

#[tokio::test]
async fn register_digest_mode_sends_digest_and_public_key() {
    let (api, users) = backend().await;
    let mut session = Session::default();

    let registration =
        register_with_key(&api, &mut session, LoginMode::Digest, "alice", "pw1", shared_key().clone()).await.unwrap();

    assert_eq!(registration.status.as_deref(), Some("User registered"));
    let (password, public_key) = users.0.lock().unwrap().get("alice").cloned().unwrap();
    assert_eq!(password, digest_password("pw1"));
    assert_eq!(PublicKey::from_pem(&public_key).unwrap(), *shared_key().public());

    assert_eq!(session.username(), Some("alice"));
    assert!(session.key().is_ok());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn register_legacy_mode_sends_plaintext() {
    let (api, users) = backend().await;
    let mut session = Session::default();

    register_with_key(&api, &mut session, LoginMode::Legacy, "bob", "pw2", shared_key().clone()).await.unwrap();
    assert_eq!(users.0.lock().unwrap()["bob"].0, "pw2");
}

#[tokio::test]
async fn duplicate_registration_surfaces_detail_and_leaves_session_alone() {
    let (api, _) = backend().await;
    let mut session = Session::default();
    register_with_key(&api, &mut session, LoginMode::Digest, "alice", "pw1", shared_key().clone()).await.unwrap();

    let mut second = Session::default();
    let err = register_with_key(&api, &mut second, LoginMode::Digest, "alice", "pw1", other_key().clone())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Server { status: 400, ref detail } if detail == "Username already registered"));
    assert_eq!(second.username(), None);
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn digest_login_opens_token_with_handshake_key() {
    let (api, _) = backend().await;
    let mut session = Session::default();
    register_with_key(&api, &mut session, LoginMode::Digest, "alice", "pw1", shared_key().clone()).await.unwrap();

    // A different key for the login handshake; the server seals to it.
    login(&api, &mut session, LoginMode::Digest, "alice", "pw1", Some(other_key().clone())).await.unwrap();

    assert_eq!(session.bearer().unwrap(), "tok-alice");
    assert_eq!(session.key().unwrap().public(), other_key().public());
}

#[tokio::test]
async fn digest_login_wrong_password_is_unauthorized() {
    let (api, _) = backend().await;
    let mut session = Session::default();
    register_with_key(&api, &mut session, LoginMode::Digest, "alice", "pw1", shared_key().clone()).await.unwrap();

    let err = login(&api, &mut session, LoginMode::Digest, "alice", "wrong", Some(shared_key().clone()))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E_UNAUTHORIZED");
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn legacy_login_uses_registration_key_from_session() {
    let (api, _) = backend().await;
    let mut session = Session::default();
    register_with_key(&api, &mut session, LoginMode::Legacy, "carol", "pw3", shared_key().clone()).await.unwrap();

    login(&api, &mut session, LoginMode::Legacy, "carol", "pw3", None).await.unwrap();
    assert_eq!(session.bearer().unwrap(), "tok-carol");
}

#[tokio::test]
async fn legacy_login_without_any_key_is_missing_private_key() {
    let (api, _) = backend().await;
    let mut session = Session::default();

    let err = login(&api, &mut session, LoginMode::Legacy, "carol", "pw3", None).await.unwrap_err();
    assert!(matches!(err, ClientError::MissingPrivateKey));
}

#[tokio::test]
async fn legacy_login_with_wrong_key_fails_to_open() {
    let (api, _) = backend().await;
    let mut session = Session::default();
    register_with_key(&api, &mut session, LoginMode::Legacy, "dave", "pw4", shared_key().clone()).await.unwrap();

    let err = login(&api, &mut session, LoginMode::Legacy, "dave", "pw4", Some(other_key().clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Crypto(_)));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn plain_token_reply_is_accepted() {
    let app = Router::new().route("/login", post(|| async { Json(json!({ "access_token": "plain-tok" })) }));
    let api = serve(app).await;
    let mut session = Session::default();

    login(&api, &mut session, LoginMode::Digest, "erin", "pw", Some(shared_key().clone())).await.unwrap();
    assert_eq!(session.bearer().unwrap(), "plain-tok");
}

#[tokio::test]
async fn empty_token_is_missing_field() {
    let app = Router::new().route("/login", post(|| async { Json(json!({ "access_token": "" })) }));
    let api = serve(app).await;
    let mut session = Session::default();

    let err = login(&api, &mut session, LoginMode::Digest, "erin", "pw", Some(shared_key().clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MissingField("access_token")));
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_clears_session_and_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));
    let mut session = crate::test_support::logged_in_session();
    store.save(&session.to_stored().unwrap()).unwrap();

    logout(&mut session, &store, None).await.unwrap();

    assert!(!session.is_authenticated());
    assert_eq!(session.username(), None);
    assert!(!store.path().exists());
}
