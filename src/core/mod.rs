//! Core scheduling abstractions, job records and cost accounting.

pub mod admission;
pub mod cost;
pub mod error;
pub mod events;
pub mod executor;
pub mod job;
pub mod ledger;
pub mod queue;
pub mod scheduler;

pub use admission::{AdmissionBlock, AdmissionController, ConcurrencyLimits, RunningCounts};
pub use cost::{CostModel, Usage};
pub use error::{AppResult, AttemptFailure, SchedulerError};
pub use events::{BroadcastListener, InMemoryEventLog, JobEvent, JobEventListener, TracingListener};
pub use executor::{ExecutionOutput, ExecutorSet, JobExecutor, Spawn};
pub use job::{Job, JobId, JobPayload, JobRequest, JobStatus, JobType, Priority};
pub use ledger::CostLedger;
pub use queue::JobQueue;
pub use scheduler::{JobScheduler, SchedulerMetrics};
