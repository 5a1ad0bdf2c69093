//! Error types for scheduler operations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned synchronously to scheduler callers.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Admitting the job would push spend past the daily limit. No job was created.
    #[error("daily budget exceeded: spent {current} + estimated {estimated} > limit {limit}")]
    BudgetExceeded {
        /// Spend recorded so far today.
        current: Decimal,
        /// Estimated cost of the rejected job.
        estimated: Decimal,
        /// Daily spending limit.
        limit: Decimal,
    },
    /// Pending queue is at its configured depth.
    #[error("queue full: {0}")]
    QueueFull(String),
    /// Request parameters are unusable.
    #[error("invalid job: {0}")]
    InvalidJob(String),
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// No tokio runtime to run attempts on.
    #[error("no tokio runtime: build inside a runtime or supply a spawner")]
    NoRuntime,
    /// Scheduler has stopped accepting work.
    #[error("scheduler is shutting down")]
    ShuttingDown,
}

/// Why a single execution attempt did not succeed.
///
/// Every variant follows the same retry path; the message is stored in
/// [`crate::core::Job::error`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptFailure {
    /// Executor returned an error.
    #[error("executor error: {0}")]
    Executor(String),
    /// Attempt exceeded its timeout.
    #[error("timed out after {timeout_ms}ms")]
    TimedOut {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },
    /// Executor panicked.
    #[error("executor panicked: {0}")]
    Panicked(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
