//! Typed HTTP client for the task backend.
//!
//! One method per endpoint. Authorized calls take the bearer token as an
//! argument so the client itself holds no session state and can be shared
//! freely between pollers.

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{
    BroadcastReceipt, CalculationReply, CalculationRequest, ErrorBody, HistoryRow, LoginRequest, MessageReply,
    RegisterRequest, Sealed, SendMessageRequest, SessionRecord, StatusReply, SubmissionReceipt, SumRequest, Task,
    TokenReply, UserRecord,
};
use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] when the base URL is not
    /// `http(s)://`, or [`ClientError::Http`] if the TLS backend fails to
    /// initialize.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(base_url));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request)
            .connect_timeout(config.timeouts.connect)
            .build()?;
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    /// `POST /register`
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn register(&self, body: &RegisterRequest<'_>) -> Result<Sealed<StatusReply>, ClientError> {
        self.execute(self.http.post(self.url("/register")).json(body)).await
    }

    /// `POST /login` with a password digest and public key.
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn login(&self, body: &LoginRequest<'_>) -> Result<Sealed<TokenReply>, ClientError> {
        self.execute(self.http.post(self.url("/login")).json(body)).await
    }

    /// `POST /login-db` with the plaintext password.
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn login_db(&self, body: &LoginRequest<'_>) -> Result<Sealed<TokenReply>, ClientError> {
        self.execute(self.http.post(self.url("/login-db")).json(body)).await
    }

    // =========================================================================
    // TASKS
    // =========================================================================

    /// `GET /task`. The body is `null` until a task has been broadcast.
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn fetch_task(&self, token: &str) -> Result<Sealed<Option<Task>>, ClientError> {
        self.execute(self.http.get(self.url("/task")).bearer_auth(token)).await
    }

    /// `POST /task/{id}/result?result=<n>`
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn submit_task_result(
        &self,
        token: &str,
        task_id: u64,
        result: f64,
    ) -> Result<Sealed<SubmissionReceipt>, ClientError> {
        let url = self.url(&format!("/task/{task_id}/result"));
        let request = self.http.post(url).bearer_auth(token).query(&[("result", result.to_string())]);
        self.execute(request).await
    }

    /// `POST /result` with `{sum}` (legacy id-less task).
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn submit_sum(&self, token: &str, sum: i64) -> Result<Sealed<SubmissionReceipt>, ClientError> {
        self.post_json(token, "/result", &SumRequest { sum }).await
    }

    /// `POST /calculation`
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn calculate(&self, token: &str, calculation: &str) -> Result<Sealed<CalculationReply>, ClientError> {
        self.post_json(token, "/calculation", &CalculationRequest { calculation }).await
    }

    // =========================================================================
    // MESSAGES
    // =========================================================================

    /// `GET /get-message`
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn get_message(&self, token: &str) -> Result<Sealed<MessageReply>, ClientError> {
        self.execute(self.http.get(self.url("/get-message")).bearer_auth(token)).await
    }

    /// `POST /send`
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn send_message(
        &self,
        token: &str,
        to_user: &str,
        content: &str,
    ) -> Result<Sealed<StatusReply>, ClientError> {
        self.post_json(token, "/send", &SendMessageRequest { to_user, content }).await
    }

    // =========================================================================
    // DASHBOARD
    // =========================================================================

    /// `GET /sessions` (unauthenticated).
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn sessions(&self) -> Result<Vec<SessionRecord>, ClientError> {
        self.execute(self.http.get(self.url("/sessions"))).await
    }

    /// `GET /users` (unauthenticated).
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn users(&self) -> Result<Vec<UserRecord>, ClientError> {
        self.execute(self.http.get(self.url("/users"))).await
    }

    /// `POST /broadcast-task`
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn broadcast_task(&self, token: &str) -> Result<Sealed<BroadcastReceipt>, ClientError> {
        self.execute(self.http.post(self.url("/broadcast-task")).bearer_auth(token)).await
    }

    /// `GET /broadcast-tasks-history`
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx responses.
    pub async fn broadcast_history(&self, token: &str) -> Result<Vec<HistoryRow>, ClientError> {
        self.execute(self.http.get(self.url("/broadcast-tasks-history")).bearer_auth(token)).await
    }

    // =========================================================================
    // PLUMBING
    // =========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        self.execute(self.http.post(self.url(path)).bearer_auth(token).json(body)).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let detail = error_detail(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned());
            tracing::debug!(status = status.as_u16(), %detail, "backend rejected request");
            return Err(ClientError::Server { status: status.as_u16(), detail });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Pull a human-readable message out of an error body.
///
/// FastAPI sends `{"detail": "..."}` for handled errors and
/// `{"detail": [...]}` for validation failures. Anything else non-empty is
/// passed through as-is.
fn error_detail(body: &str) -> Option<String> {
    if let Ok(ErrorBody { detail }) = serde_json::from_str::<ErrorBody>(body) {
        return match detail {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        };
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
