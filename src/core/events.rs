//! Job lifecycle events and listener implementations.
//!
//! Listeners are handed to the scheduler at construction; there is no global
//! event bus. Events are published after the scheduler releases its state lock,
//! so a listener may call back into the scheduler.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::core::{Job, JobId};

/// Lifecycle transition of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// Job was created and queued.
    Added {
        /// Snapshot at creation.
        job: Job,
    },
    /// Job was dispatched to its executor.
    Started {
        /// Snapshot at dispatch.
        job: Job,
    },
    /// Job finished successfully.
    Completed {
        /// Final record.
        job: Job,
        /// Executor result.
        result: serde_json::Value,
    },
    /// Job exhausted its retries.
    Failed {
        /// Final record.
        job: Job,
        /// Last failure message.
        error: String,
    },
}

impl JobEvent {
    /// Job the event refers to.
    #[must_use]
    pub const fn job(&self) -> &Job {
        match self {
            Self::Added { job }
            | Self::Started { job }
            | Self::Completed { job, .. }
            | Self::Failed { job, .. } => job,
        }
    }

    /// Id of the job the event refers to.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job().id
    }

    /// Short action name (`added`, `started`, `completed`, `failed`).
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Started { .. } => "started",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Observer notified of every lifecycle transition.
pub trait JobEventListener: Send + Sync {
    /// Handle an event. Must not block.
    fn on_event(&self, event: &JobEvent);
}

/// Relays events to any number of async subscribers over a broadcast channel.
///
/// Slow subscribers lag and lose the oldest events rather than blocking the
/// scheduler.
#[derive(Debug, Clone)]
pub struct BroadcastListener {
    tx: broadcast::Sender<JobEvent>,
}

impl BroadcastListener {
    /// Create a listener whose channel buffers `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.tx.subscribe()
    }
}

impl JobEventListener for BroadcastListener {
    fn on_event(&self, event: &JobEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event.clone());
    }
}

/// Bounded in-memory event history for tests and dev.
#[derive(Debug)]
pub struct InMemoryEventLog {
    events: Mutex<VecDeque<JobEvent>>,
    max_events: usize,
}

impl InMemoryEventLog {
    /// Create a log that keeps the most recent `max_events` events.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Snapshot of stored events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<JobEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Actions recorded for one job, oldest first.
    #[must_use]
    pub fn actions_for(&self, id: &JobId) -> Vec<&'static str> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.job_id() == *id)
            .map(JobEvent::action)
            .collect()
    }
}

impl JobEventListener for InMemoryEventLog {
    fn on_event(&self, event: &JobEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}

/// Writes every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl JobEventListener for TracingListener {
    fn on_event(&self, event: &JobEvent) {
        let job = event.job();
        match event {
            JobEvent::Failed { error, .. } => tracing::error!(
                job_id = %job.id,
                job_type = %job.job_type,
                retries = job.retries,
                %error,
                "job failed"
            ),
            _ => tracing::info!(
                job_id = %job.id,
                job_type = %job.job_type,
                action = event.action(),
                "job event"
            ),
        }
    }
}
