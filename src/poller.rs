//! Cancellable periodic polling bound to a session.
//!
//! DESIGN
//! ======
//! A poller is one tokio task running `tick` on a fixed interval. Ticks are
//! awaited inline, so a slow round-trip delays the next tick instead of
//! overlapping it, and missed ticks are skipped rather than bunched up.
//! Stopping is cooperative through a watch channel: the loop checks it both
//! while waiting for the next tick and while a tick is in flight, so
//! `stop()` returns promptly even mid-request. Dropping the handle closes
//! the channel, which stops the loop the same way.

#[cfg(test)]
#[path = "poller_test.rs"]
mod tests;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{ClientConfig, MessagePolicy};
use crate::error::{ClientError, ErrorCode};
use crate::net::api::ApiClient;
use crate::net::types::Task;
use crate::services::messages::{self, MessageAction};
use crate::services::tasks::{self, TaskTracker};
use crate::session::Session;

pub struct Poller;

impl Poller {
    /// Spawn a poller running `tick` every `period`, starting immediately.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> PollerHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, mut stop_rx) = watch::channel(false);
        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::debug!(poller = name, ?period, "poller started");
            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = interval.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    () = tick() => {}
                }
            }
            tracing::debug!(poller = name, "poller stopped");
        });
        PollerHandle { name, shutdown, join: Some(join) }
    }
}

/// Owner of a running poller. Dropping it stops the poller.
#[derive(Debug)]
pub struct PollerHandle {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl PollerHandle {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the poller and wait for its task to exit.
    pub async fn stop(mut self) {
        self.shutdown.send_replace(true);
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                tracing::warn!(poller = self.name, error = %e, "poller task ended abnormally");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

// =============================================================================
// SESSION POLLERS
// =============================================================================

/// Something a session poller wants the caller to render.
#[derive(Debug)]
pub enum PollEvent {
    /// A task whose identity differs from the last one delivered.
    Task(Task),
    /// A received message, after the message policy was applied.
    Message(MessageAction),
}

/// The task and message pollers of one logged-in session.
#[derive(Debug)]
pub struct SessionPollers {
    tasks: PollerHandle,
    messages: PollerHandle,
}

impl SessionPollers {
    /// Start both pollers. Events go to `events`; failed ticks are logged and
    /// polling continues.
    #[must_use]
    pub fn start(
        api: Arc<ApiClient>,
        session: Arc<Session>,
        config: &ClientConfig,
        events: mpsc::Sender<PollEvent>,
    ) -> Self {
        let tasks = spawn_task_poller(api.clone(), session.clone(), config.task_poll, events.clone());
        let messages = spawn_message_poller(api, session, config.message_poll, config.message_policy, events);
        Self { tasks, messages }
    }

    /// Stop both pollers and wait for them.
    pub async fn stop(self) {
        tokio::join!(self.tasks.stop(), self.messages.stop());
    }
}

/// Decides how loudly a failed tick is logged. Retryable failures warn every
/// time. A non-retryable failure (bad token, missing key) warns once, and
/// repeats of the same code drop to `debug!` until a tick succeeds.
#[derive(Debug, Default)]
struct FailureLog {
    last_code: Option<&'static str>,
}

impl FailureLog {
    /// Record a failure; returns whether it deserves a warning.
    fn record(&mut self, err: &ClientError) -> bool {
        if err.retryable() {
            self.last_code = None;
            return true;
        }
        let code = err.error_code();
        let repeated = self.last_code == Some(code);
        self.last_code = Some(code);
        !repeated
    }

    fn clear(&mut self) {
        self.last_code = None;
    }

    fn report(&mut self, poller: &'static str, err: &ClientError) {
        if self.record(err) {
            tracing::warn!(poller, error = %err, code = err.error_code(), retryable = err.retryable(), "poll failed");
        } else {
            tracing::debug!(poller, code = err.error_code(), "poll still failing");
        }
    }
}

#[derive(Debug, Default)]
struct TaskPollState {
    tracker: TaskTracker,
    failures: FailureLog,
}

fn spawn_task_poller(
    api: Arc<ApiClient>,
    session: Arc<Session>,
    period: Duration,
    events: mpsc::Sender<PollEvent>,
) -> PollerHandle {
    let state = Arc::new(Mutex::new(TaskPollState::default()));
    Poller::spawn("tasks", period, move || {
        let (api, session, events, state) = (api.clone(), session.clone(), events.clone(), state.clone());
        async move {
            let result = tasks::fetch(&api, &session).await;
            let fresh = {
                let mut state = state.lock().await;
                match result {
                    Ok(task) => {
                        state.failures.clear();
                        task.and_then(|task| state.tracker.observe(task))
                    }
                    Err(e) => {
                        state.failures.report("tasks", &e);
                        None
                    }
                }
            };
            if let Some(task) = fresh {
                deliver(&events, PollEvent::Task(task)).await;
            }
        }
    })
}

fn spawn_message_poller(
    api: Arc<ApiClient>,
    session: Arc<Session>,
    period: Duration,
    policy: MessagePolicy,
    events: mpsc::Sender<PollEvent>,
) -> PollerHandle {
    let failures = Arc::new(Mutex::new(FailureLog::default()));
    Poller::spawn("messages", period, move || {
        let (api, session, events, failures) = (api.clone(), session.clone(), events.clone(), failures.clone());
        async move {
            let result = messages::receive_and_act(&api, &session, policy).await;
            let action = {
                let mut failures = failures.lock().await;
                match result {
                    Ok(action) => {
                        failures.clear();
                        if action.is_none() {
                            tracing::debug!(poller = "messages", "inbox empty");
                        }
                        action
                    }
                    Err(e) => {
                        failures.report("messages", &e);
                        None
                    }
                }
            };
            if let Some(action) = action {
                deliver(&events, PollEvent::Message(action)).await;
            }
        }
    })
}

async fn deliver(events: &mpsc::Sender<PollEvent>, event: PollEvent) {
    if events.send(event).await.is_err() {
        tracing::debug!("poll event receiver closed");
    }
}
