//! Session context: who is logged in, their bearer token, their private key.
//!
//! SYSTEM CONTEXT
//! ==============
//! A [`Session`] is an owned value passed to each flow. Flows that log in or
//! out take `&mut Session`; everything else borrows it, and pollers share it
//! behind an `Arc`. The persisted form, [`StoredSession`], keeps the three
//! storage keys the backend's web client used (`accessToken`, `privateKey`,
//! `username`) so both clients read the same shape.
//!
//! The private key is the only copy. If the store is deleted, sealed
//! payloads addressed to the old public key cannot be opened again.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::crypto::KeyPair;
use crate::error::ClientError;
use crate::net::types::Sealed;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const PRIVATE_KEY_KEY: &str = "privateKey";
pub const USERNAME_KEY: &str = "username";

const DEFAULT_SESSION_FILE: &str = "tasklink-session.json";

// =============================================================================
// PERSISTED FORM
// =============================================================================

/// Session storage as written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(rename = "accessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(rename = "privateKey", default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(rename = "username", default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// File-backed session storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<system temp dir>/tasklink-session.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_SESSION_FILE)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session. A missing file is an empty session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on I/O failure or
    /// [`ClientError::InvalidJson`] if the file is not a session object.
    pub fn load(&self) -> Result<StoredSession, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(StoredSession::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the session, readable only by the current user on Unix.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on I/O failure.
    pub fn save(&self, stored: &StoredSession) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(stored)?;
        let mut file = open_private(&self.path)?;
        file.write_all(&json)?;
        file.flush()?;
        Ok(())
    }

    /// Remove the stored session. Removing a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on any other I/O failure.
    pub fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on create; tighten files left by older runs too.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

// =============================================================================
// SESSION CONTEXT
// =============================================================================

/// The live session.
#[derive(Clone, Default)]
pub struct Session {
    username: Option<String>,
    access_token: Option<String>,
    key: Option<KeyPair>,
}

impl Session {
    /// Rebuild a session from storage, parsing the private key PEM.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Crypto`] if the stored key is unreadable.
    pub fn from_stored(stored: &StoredSession) -> Result<Self, ClientError> {
        let key = stored
            .private_key
            .as_deref()
            .map(KeyPair::from_private_pem)
            .transpose()?;
        Ok(Self { username: stored.username.clone(), access_token: stored.access_token.clone(), key })
    }

    /// Convert to the persisted form.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Crypto`] if the private key cannot be encoded.
    pub fn to_stored(&self) -> Result<StoredSession, ClientError> {
        let private_key = self.key.as_ref().map(KeyPair::private_key_pem).transpose()?;
        Ok(StoredSession {
            access_token: self.access_token.clone(),
            private_key,
            username: self.username.clone(),
        })
    }

    /// Record a successful login.
    pub fn establish(&mut self, username: &str, access_token: &str, key: KeyPair) {
        self.username = Some(username.to_owned());
        self.access_token = Some(access_token.to_owned());
        self.key = Some(key);
    }

    /// Record identity without a token (after registration).
    pub fn set_identity(&mut self, username: &str, key: KeyPair) {
        self.username = Some(username.to_owned());
        self.access_token = None;
        self.key = Some(key);
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// The bearer token for authorized requests.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] before login.
    pub fn bearer(&self) -> Result<&str, ClientError> {
        self.access_token.as_deref().ok_or(ClientError::NotAuthenticated)
    }

    /// The private key for opening envelopes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingPrivateKey`] if none is held.
    pub fn key(&self) -> Result<&KeyPair, ClientError> {
        self.key.as_ref().ok_or(ClientError::MissingPrivateKey)
    }

    /// Unwrap a plain-or-sealed response body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingPrivateKey`] for a sealed body with no
    /// key in the session, or [`ClientError::Crypto`] when opening fails.
    pub fn open<T: DeserializeOwned>(&self, body: Sealed<T>) -> Result<T, ClientError> {
        match body {
            Sealed::Plain(value) => Ok(value),
            sealed @ Sealed::Encrypted { .. } => Ok(sealed.open_with(self.key()?)?),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("key", &self.key)
            .finish()
    }
}
