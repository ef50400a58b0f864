//! Shared fixtures for unit tests.

use std::sync::OnceLock;

use crate::ClientConfig;
use crate::crypto::KeyPair;
use crate::net::api::ApiClient;
use crate::session::Session;

/// A 1024-bit key shared across tests; generating one per test is slow.
pub(crate) fn shared_key() -> &'static KeyPair {
    static KEY: OnceLock<KeyPair> = OnceLock::new();
    KEY.get_or_init(|| KeyPair::generate_with_bits(1024).expect("test key generation"))
}

/// A second, unrelated key for wrong-key cases.
pub(crate) fn other_key() -> &'static KeyPair {
    static KEY: OnceLock<KeyPair> = OnceLock::new();
    KEY.get_or_init(|| KeyPair::generate_with_bits(1024).expect("test key generation"))
}

/// A logged-in session holding the shared key.
pub(crate) fn logged_in_session() -> Session {
    let mut session = Session::default();
    session.establish("alice", "tok-123", shared_key().clone());
    session
}

/// Serve `app` on an ephemeral local port and return a client pointed at it.
pub(crate) async fn serve(app: axum::Router) -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend");
    });
    ApiClient::new(&ClientConfig::default().with_base_url(&format!("http://{addr}"))).expect("api client")
}

/// The bearer token from an `Authorization` header, if any.
pub(crate) fn bearer(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}
