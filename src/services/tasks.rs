//! Task fetching, solving and answer submission.
//!
//! DESIGN
//! ======
//! Two task shapes are in circulation. Broadcast tasks carry a `task_id` and
//! an operation and are answered at `/task/{id}/result`. Legacy tasks are a
//! bare `{a, b}` sum with no identifier, answered at `/result` with an
//! integer `sum`. [`submit`] picks the endpoint from the task itself.

#[cfg(test)]
#[path = "tasks_test.rs"]
mod tests;

use crate::error::ClientError;
use crate::net::api::ApiClient;
use crate::net::types::{Operation, SubmissionReceipt, Task};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("legacy tasks take a whole-number sum, got {0}")]
    FractionalSum(f64),
    #[error("answer {0} is out of range")]
    OutOfRange(f64),
}

/// What makes two fetched tasks "the same task" for rendering purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    Id(u64),
    Operands { a: i64, b: i64, operation: Operation },
}

impl Task {
    /// Apply the task's operation to its operands.
    ///
    /// # Errors
    ///
    /// [`TaskError::DivisionByZero`] for `x / 0`.
    #[allow(clippy::cast_precision_loss)]
    pub fn solve(&self) -> Result<f64, TaskError> {
        let (a, b) = (self.a as f64, self.b as f64);
        match self.operation {
            Operation::Add => Ok(a + b),
            Operation::Subtract => Ok(a - b),
            Operation::Multiply => Ok(a * b),
            Operation::Divide if self.b == 0 => Err(TaskError::DivisionByZero),
            Operation::Divide => Ok(a / b),
        }
    }

    #[must_use]
    pub fn key(&self) -> TaskKey {
        match self.task_id {
            Some(id) => TaskKey::Id(id),
            None => TaskKey::Operands { a: self.a, b: self.b, operation: self.operation },
        }
    }

    /// Human-readable form, e.g. `#4 12 / 3`.
    #[must_use]
    pub fn describe(&self) -> String {
        let expr = format!("{} {} {}", self.a, self.operation, self.b);
        match self.task_id {
            Some(id) => format!("#{id} {expr}"),
            None => expr,
        }
    }
}

impl SubmissionReceipt {
    /// Correctness, from `is_correct` when present, otherwise from the
    /// legacy `Correct!` / `Incorrect!` status text.
    #[must_use]
    pub fn correct(&self) -> Option<bool> {
        if let Some(correct) = self.is_correct {
            return Some(correct);
        }
        match self.status.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("correct!") => Some(true),
            Some(s) if s.eq_ignore_ascii_case("incorrect!") => Some(false),
            _ => None,
        }
    }
}

/// Remembers the last rendered task so a poller re-renders only on change.
#[derive(Debug, Default)]
pub struct TaskTracker {
    last: Option<TaskKey>,
}

impl TaskTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the task if its identity differs from the last one observed.
    pub fn observe(&mut self, task: Task) -> Option<Task> {
        let key = task.key();
        if self.last == Some(key) {
            return None;
        }
        self.last = Some(key);
        Some(task)
    }

    /// Forget the last task, so the next one observed is always new.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// `GET /task`, opened with the session key. `Ok(None)` means no task has
/// been broadcast yet.
///
/// # Errors
///
/// [`ClientError::NotAuthenticated`] before login, plus transport, server
/// and crypto failures.
pub async fn fetch(api: &ApiClient, session: &Session) -> Result<Option<Task>, ClientError> {
    let body = api.fetch_task(session.bearer()?).await?;
    let task = session.open(body)?;
    match &task {
        Some(task) => tracing::debug!(task = %task.describe(), "fetched task"),
        None => tracing::debug!("no task yet"),
    }
    Ok(task)
}

/// Submit `answer` for `task` on the endpoint matching its shape.
///
/// # Errors
///
/// [`TaskError::FractionalSum`] for a non-integer answer to a legacy task,
/// plus the failures of [`fetch`].
pub async fn submit(
    api: &ApiClient,
    session: &Session,
    task: &Task,
    answer: f64,
) -> Result<SubmissionReceipt, ClientError> {
    let token = session.bearer()?;
    let body = match task.task_id {
        Some(id) => api.submit_task_result(token, id, answer).await?,
        None => api.submit_sum(token, whole_sum(answer)?).await?,
    };
    let receipt = session.open(body)?;
    tracing::info!(task = %task.describe(), answer, correct = ?receipt.correct(), "submitted answer");
    Ok(receipt)
}

/// Submit `answer` for task `task_id` without having fetched it.
///
/// # Errors
///
/// Same as [`submit`].
pub async fn submit_for_id(
    api: &ApiClient,
    session: &Session,
    task_id: u64,
    answer: f64,
) -> Result<SubmissionReceipt, ClientError> {
    let body = api.submit_task_result(session.bearer()?, task_id, answer).await?;
    session.open(body)
}

/// Submit `sum` to the legacy `/result` endpoint.
///
/// # Errors
///
/// Same as [`submit`].
pub async fn submit_sum(api: &ApiClient, session: &Session, sum: i64) -> Result<SubmissionReceipt, ClientError> {
    let body = api.submit_sum(session.bearer()?, sum).await?;
    session.open(body)
}

/// Compute the answer locally and submit it.
///
/// # Errors
///
/// [`TaskError::DivisionByZero`] before anything is sent, plus the failures
/// of [`submit`].
pub async fn solve_and_submit(
    api: &ApiClient,
    session: &Session,
    task: &Task,
) -> Result<(f64, SubmissionReceipt), ClientError> {
    let answer = task.solve()?;
    let receipt = submit(api, session, task, answer).await?;
    Ok((answer, receipt))
}

/// `POST /calculation`; the result is whatever JSON value the server sends.
///
/// # Errors
///
/// Same as [`fetch`].
pub async fn calculate(
    api: &ApiClient,
    session: &Session,
    calculation: &str,
) -> Result<serde_json::Value, ClientError> {
    let body = api.calculate(session.bearer()?, calculation).await?;
    Ok(session.open(body)?.result)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn whole_sum(answer: f64) -> Result<i64, TaskError> {
    if !answer.is_finite() || answer.abs() >= i64::MAX as f64 {
        return Err(TaskError::OutOfRange(answer));
    }
    if answer.fract() != 0.0 {
        return Err(TaskError::FractionalSum(answer));
    }
    Ok(answer as i64)
}
