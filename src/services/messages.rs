//! Receipt of server-relayed messages.
//!
//! Messages are untrusted input. They are shown as text by default; with
//! [`MessagePolicy::Interpret`] they go through the restricted interpreter
//! in [`crate::interp`], which parses the whole message before running any of
//! it and refuses anything outside its instruction set.

#[cfg(test)]
#[path = "messages_test.rs"]
mod tests;

use crate::config::MessagePolicy;
use crate::error::ClientError;
use crate::interp::{self, InterpError, Output};
use crate::net::api::ApiClient;
use crate::session::Session;

/// What happened to a received message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageAction {
    /// Shown verbatim.
    Display(String),
    /// Parsed and run; one output per instruction.
    Interpreted { message: String, outputs: Vec<Output> },
    /// Refused by the interpreter. Nothing was run.
    Rejected { message: String, error: InterpError },
}

/// `GET /get-message`. `Ok(None)` means the inbox is empty.
///
/// # Errors
///
/// [`ClientError::NotAuthenticated`] before login,
/// [`ClientError::MissingPrivateKey`] for a sealed reply with no key, plus
/// transport, server and crypto failures.
pub async fn receive(api: &ApiClient, session: &Session) -> Result<Option<String>, ClientError> {
    let body = api.get_message(session.bearer()?).await?;
    Ok(session.open(body)?.message)
}

/// Apply `policy` to a received message.
#[must_use]
pub fn act(policy: MessagePolicy, message: String) -> MessageAction {
    match policy {
        MessagePolicy::Display => MessageAction::Display(message),
        MessagePolicy::Interpret => match interp::interpret(&message) {
            Ok(outputs) => MessageAction::Interpreted { message, outputs },
            Err(error) => {
                tracing::warn!(%error, "rejected message");
                MessageAction::Rejected { message, error }
            }
        },
    }
}

/// [`receive`], then [`act`] on whatever arrived.
///
/// # Errors
///
/// Same as [`receive`]. A rejected message is not an error.
pub async fn receive_and_act(
    api: &ApiClient,
    session: &Session,
    policy: MessagePolicy,
) -> Result<Option<MessageAction>, ClientError> {
    Ok(receive(api, session).await?.map(|message| act(policy, message)))
}
