//! Crate-wide error type.
//!
//! Callers need to tell "nothing yet" apart from "could not read it" apart
//! from "server said no", so each failure class has its own variant instead
//! of collapsing into a logged `None`.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use crate::crypto::CryptoError;
use crate::services::tasks::TaskError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure: DNS, connect, timeout, TLS, body read.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned HTTP {status}: {detail}")]
    Server { status: u16, detail: String },

    /// The session holds no bearer token.
    #[error("not logged in")]
    NotAuthenticated,

    /// The session holds no private key, so sealed payloads cannot be opened.
    #[error("no private key in session")]
    MissingPrivateKey,

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A plain (unsealed) response body was not the expected JSON shape.
    #[error("unexpected response payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("missing expected field `{0}`")]
    MissingField(&'static str),

    /// Reading or writing the session store failed.
    #[error("session storage failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Grepable error code and retryable flag for logs and exit messages.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

impl ErrorCode for ClientError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Http(_) => "E_HTTP",
            Self::Server { status: 401 | 403, .. } => "E_UNAUTHORIZED",
            Self::Server { .. } => "E_SERVER",
            Self::NotAuthenticated => "E_NOT_AUTHENTICATED",
            Self::MissingPrivateKey => "E_MISSING_PRIVATE_KEY",
            Self::Crypto(_) => "E_CRYPTO",
            Self::InvalidJson(_) => "E_INVALID_JSON",
            Self::MissingField(_) => "E_MISSING_FIELD",
            Self::Storage(_) => "E_STORAGE",
            Self::InvalidBaseUrl(_) => "E_INVALID_BASE_URL",
            Self::Task(_) => "E_TASK",
        }
    }

    /// Whether the same call could succeed on a later poll tick.
    fn retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Server { status: 429 | 500..=599, .. })
    }
}
