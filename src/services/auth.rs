//! Registration, login and logout.
//!
//! Two login revisions exist on the backend and both are supported:
//! `Digest` sends a SHA-256 digest of the password together with a freshly
//! generated public key, `Legacy` sends the plaintext password to
//! `/login-db` and relies on the key pair saved at registration. Register
//! transforms the password the same way the chosen login mode does, so a
//! user registered in one mode can log in with it.

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

use crate::config::LoginMode;
use crate::crypto::{KeyPair, digest_password};
use crate::error::ClientError;
use crate::net::api::ApiClient;
use crate::net::types::{LoginRequest, RegisterRequest};
use crate::poller::SessionPollers;
use crate::session::{Session, SessionStore};

/// Outcome of a successful registration.
#[derive(Debug)]
pub struct Registration {
    /// Server status text (`status`, or `msg` on older servers).
    pub status: Option<String>,
    /// The key pair registered with the server. Its private half is the only
    /// copy; the caller must persist it.
    pub key: KeyPair,
}

fn password_for(mode: LoginMode, password: &str) -> String {
    match mode {
        LoginMode::Digest => digest_password(password),
        LoginMode::Legacy => password.to_owned(),
    }
}

/// Register `username` with a fresh 2048-bit key pair.
///
/// # Errors
///
/// Key generation failures, transport failures and server rejections
/// (for example a duplicate username, surfaced through `detail`).
pub async fn register(
    api: &ApiClient,
    session: &mut Session,
    mode: LoginMode,
    username: &str,
    password: &str,
) -> Result<Registration, ClientError> {
    let key = KeyPair::generate()?;
    register_with_key(api, session, mode, username, password, key).await
}

/// Register `username` with a caller-supplied key pair.
///
/// On success the session holds the username and private key but no token.
///
/// # Errors
///
/// Same as [`register`].
pub async fn register_with_key(
    api: &ApiClient,
    session: &mut Session,
    mode: LoginMode,
    username: &str,
    password: &str,
    key: KeyPair,
) -> Result<Registration, ClientError> {
    let public_key = key.public_key_pem()?;
    let password = password_for(mode, password);
    let body = api.register(&RegisterRequest { username, password: &password, public_key: &public_key }).await?;
    let reply = body.open_with(&key)?;

    tracing::info!(username, ?mode, "registered");
    session.set_identity(username, key.clone());
    Ok(Registration { status: reply.status, key })
}

/// Log in and store the token, key and username in the session.
///
/// `key` overrides the key pair used for the handshake. When `None`, digest
/// mode generates a fresh pair and legacy mode uses the key already held by
/// the session (the one saved at registration).
///
/// # Errors
///
/// [`ClientError::MissingPrivateKey`] in legacy mode with no key available,
/// [`ClientError::Server`] carrying the server's `detail` on rejection, and
/// transport or crypto failures.
pub async fn login(
    api: &ApiClient,
    session: &mut Session,
    mode: LoginMode,
    username: &str,
    password: &str,
    key: Option<KeyPair>,
) -> Result<(), ClientError> {
    let (body, key) = match mode {
        LoginMode::Digest => {
            let key = match key {
                Some(key) => key,
                None => KeyPair::generate()?,
            };
            let public_key = key.public_key_pem()?;
            let digest = digest_password(password);
            let request = LoginRequest { username, password: &digest, public_key: Some(&public_key) };
            (api.login(&request).await?, key)
        }
        LoginMode::Legacy => {
            let key = match key {
                Some(key) => key,
                None => session.key()?.clone(),
            };
            let request = LoginRequest { username, password, public_key: None };
            (api.login_db(&request).await?, key)
        }
    };

    let token = body.open_with(&key)?;
    if token.access_token.is_empty() {
        return Err(ClientError::MissingField("access_token"));
    }

    tracing::info!(username, ?mode, "logged in");
    session.establish(username, &token.access_token, key);
    Ok(())
}

/// Stop any pollers bound to the session, then forget it in memory and on
/// disk.
///
/// # Errors
///
/// [`ClientError::Storage`] when the session file cannot be removed. The
/// in-memory session is cleared regardless.
pub async fn logout(
    session: &mut Session,
    store: &SessionStore,
    pollers: Option<SessionPollers>,
) -> Result<(), ClientError> {
    if let Some(pollers) = pollers {
        pollers.stop().await;
    }
    let username = session.username().map(str::to_owned);
    session.clear();
    store.clear()?;
    tracing::info!(username = username.as_deref().unwrap_or("-"), "logged out");
    Ok(())
}
