//! Dashboard actions: who is online, direct messages, broadcast tasks.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;

use crate::error::ClientError;
use crate::format;
use crate::net::api::ApiClient;
use crate::net::types::{BroadcastReceipt, HistoryRow, SessionRecord, StatusReply, UserRecord};
use crate::session::Session;

/// Latest session per user, as recorded by the backend.
///
/// # Errors
///
/// Transport and server failures.
pub async fn list_sessions(api: &ApiClient) -> Result<Vec<SessionRecord>, ClientError> {
    api.sessions().await
}

/// All registered users.
///
/// # Errors
///
/// Transport and server failures.
pub async fn list_users(api: &ApiClient) -> Result<Vec<UserRecord>, ClientError> {
    api.users().await
}

/// Queue `content` for `to_user`, who receives it via `/get-message`.
///
/// # Errors
///
/// [`ClientError::MissingField`] for an empty recipient or message (nothing
/// is sent), plus the usual authorized-call failures.
pub async fn send_message(
    api: &ApiClient,
    session: &Session,
    to_user: &str,
    content: &str,
) -> Result<StatusReply, ClientError> {
    let to_user = to_user.trim();
    if to_user.is_empty() {
        return Err(ClientError::MissingField("to_user"));
    }
    if content.trim().is_empty() {
        return Err(ClientError::MissingField("content"));
    }
    let body = api.send_message(session.bearer()?, to_user, content).await?;
    let reply = session.open(body)?;
    tracing::info!(to_user, "message sent");
    Ok(reply)
}

/// Ask the backend to create a random task for every client.
///
/// # Errors
///
/// Authorized-call failures.
pub async fn broadcast_task(api: &ApiClient, session: &Session) -> Result<BroadcastReceipt, ClientError> {
    let body = api.broadcast_task(session.bearer()?).await?;
    let receipt = session.open(body)?;
    tracing::info!(task_id = receipt.task_id, "task broadcast");
    Ok(receipt)
}

/// Every broadcast task with submission counts, newest first.
///
/// # Errors
///
/// Authorized-call failures.
pub async fn broadcast_history(api: &ApiClient, session: &Session) -> Result<Vec<HistoryRow>, ClientError> {
    api.broadcast_history(session.bearer()?).await
}

impl HistoryRow {
    /// Percentage of submissions that were correct, rounded.
    #[must_use]
    pub fn success_rate(&self) -> u32 {
        format::success_rate(self.correct_count, self.total_submissions)
    }

    /// `created_at` in `YYYY-MM-DD HH:MM:SS`, or as sent if unparseable.
    #[must_use]
    pub fn created_display(&self) -> String {
        format::format_timestamp(&self.created_at).unwrap_or_else(|| self.created_at.clone())
    }
}
