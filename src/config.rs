//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_TASK_POLL_SECS: u64 = 3;
pub const DEFAULT_MESSAGE_POLL_SECS: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got `{value}`")]
    InvalidNumber { key: &'static str, value: String },
    #[error("unknown {key}: `{value}` (expected {expected})")]
    UnknownVariant { key: &'static str, value: String, expected: &'static str },
}

/// Which login endpoint and credential shape to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
    /// `POST /login` with a password digest and a freshly generated public key.
    #[default]
    Digest,
    /// `POST /login-db` with the plaintext password; responses are opened
    /// with the private key saved at registration.
    Legacy,
}

impl LoginMode {
    /// Parse a mode name (`digest` or `legacy`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownVariant`] for any other value.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "digest" => Ok(Self::Digest),
            "legacy" => Ok(Self::Legacy),
            other => Err(ConfigError::UnknownVariant {
                key: "TASKLINK_LOGIN_MODE",
                value: other.to_owned(),
                expected: "'digest' or 'legacy'",
            }),
        }
    }
}

/// What to do with a message relayed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessagePolicy {
    /// Show the message as text.
    #[default]
    Display,
    /// Run the message through the restricted interpreter.
    Interpret,
}

impl MessagePolicy {
    /// Parse a policy name (`display` or `interpret`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownVariant`] for any other value.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "display" => Ok(Self::Display),
            "interpret" => Ok(Self::Interpret),
            other => Err(ConfigError::UnknownVariant {
                key: "TASKLINK_MESSAGE_POLICY",
                value: other.to_owned(),
                expected: "'display' or 'interpret'",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Duration,
    pub connect: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub task_poll: Duration,
    pub message_poll: Duration,
    pub timeouts: Timeouts,
    pub login_mode: LoginMode,
    pub message_policy: MessagePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            task_poll: Duration::from_secs(DEFAULT_TASK_POLL_SECS),
            message_poll: Duration::from_secs(DEFAULT_MESSAGE_POLL_SECS),
            timeouts: Timeouts {
                request: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
                connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            },
            login_mode: LoginMode::Digest,
            message_policy: MessagePolicy::Display,
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// All optional:
    /// - `TASKLINK_BASE_URL`: default `http://127.0.0.1:8080`
    /// - `TASKLINK_TASK_POLL_SECS`: default 3
    /// - `TASKLINK_MESSAGE_POLL_SECS`: default 5
    /// - `TASKLINK_REQUEST_TIMEOUT_SECS`: default 30
    /// - `TASKLINK_CONNECT_TIMEOUT_SECS`: default 10
    /// - `TASKLINK_LOGIN_MODE`: `digest` (default) or `legacy`
    /// - `TASKLINK_MESSAGE_POLICY`: `display` (default) or `interpret`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(
            &std::env::var("TASKLINK_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned()),
        );
        let task_poll = env_secs("TASKLINK_TASK_POLL_SECS", DEFAULT_TASK_POLL_SECS)?;
        let message_poll = env_secs("TASKLINK_MESSAGE_POLL_SECS", DEFAULT_MESSAGE_POLL_SECS)?;
        let timeouts = Timeouts {
            request: env_secs("TASKLINK_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect: env_secs("TASKLINK_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let login_mode = match std::env::var("TASKLINK_LOGIN_MODE") {
            Ok(raw) => LoginMode::parse(&raw)?,
            Err(_) => LoginMode::default(),
        };
        let message_policy = match std::env::var("TASKLINK_MESSAGE_POLICY") {
            Ok(raw) => MessagePolicy::parse(&raw)?,
            Err(_) => MessagePolicy::default(),
        };

        Ok(Self { base_url, task_poll, message_poll, timeouts, login_mode, message_policy })
    }

    /// Replace the base URL, normalizing a trailing slash away.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn env_secs(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(Duration::from_secs(default));
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidNumber { key, value: raw }),
    }
}
