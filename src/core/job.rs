//! Job records: identity, lifecycle fields and creation requests.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique job identifier.
pub type JobId = Uuid;

/// Opaque job payload, interpreted only by the matching executor.
pub type JobPayload = serde_json::Value;

/// Kind of work a job performs. Each kind is bound to exactly one executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Text extraction from uploaded evidence files.
    Ocr,
    /// Table transformation of extracted data.
    Transform,
    /// Image compression.
    Compress,
    /// Upload to object storage.
    Storage,
}

impl JobType {
    /// Every job type, in declaration order.
    pub const ALL: [Self; 4] = [Self::Ocr, Self::Transform, Self::Compress, Self::Storage];

    /// Stable lowercase name, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ocr => "ocr",
            Self::Transform => "transform",
            Self::Compress => "compress",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue priority band. Higher bands dispatch first.
///
/// The derived ordering follows declaration order, so `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Background work.
    Low,
    /// Default band.
    Medium,
    /// User-facing work.
    High,
}

impl Priority {
    /// Numeric weight of the band (`high=3`, `medium=2`, `low=1`).
    #[must_use]
    pub const fn weight(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting in the pending queue (first attempt or retry).
    Pending,
    /// Handed to an executor.
    Running,
    /// Finished successfully. Terminal.
    Completed,
    /// Retries exhausted. Terminal.
    Failed,
}

impl JobStatus {
    /// Whether the job has reached a terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One unit of background work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier, generated at creation.
    pub id: JobId,
    /// Executor routing tag.
    pub job_type: JobType,
    /// Queue priority band.
    pub priority: Priority,
    /// Opaque executor input.
    pub payload: JobPayload,
    /// Cost supplied by the caller and checked at admission.
    pub estimated_cost: Decimal,
    /// Cost computed on success and debited from the ledger.
    pub actual_cost: Option<Decimal>,
    /// Failed attempts so far.
    pub retries: u32,
    /// Failed attempts allowed before the job fails permanently.
    pub max_retries: u32,
    /// Wall-clock budget for one attempt.
    pub timeout_ms: u64,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// First dispatch time.
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal transition time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last failure message.
    pub error: Option<String>,
}

impl Job {
    /// Build a pending job from a request whose optional fields are already resolved.
    pub(crate) fn pending(
        request: JobRequest,
        max_retries: u32,
        timeout_ms: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: request.job_type,
            priority: request.priority,
            payload: request.payload,
            estimated_cost: request.estimated_cost,
            actual_cost: None,
            retries: 0,
            max_retries,
            timeout_ms,
            status: JobStatus::Pending,
            created_at,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Time spent executing, for jobs that finished.
    #[must_use]
    pub fn processing_time_ms(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }

    /// Time spent queued before the first dispatch.
    #[must_use]
    pub fn queue_wait_ms(&self) -> Option<i64> {
        self.started_at
            .map(|start| (start - self.created_at).num_milliseconds())
    }
}

/// Parameters for creating a job.
///
/// `max_retries` and `timeout_ms` fall back to the scheduler's configured
/// defaults when left unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    /// Executor routing tag.
    pub job_type: JobType,
    /// Queue priority band.
    pub priority: Priority,
    /// Opaque executor input.
    pub payload: JobPayload,
    /// Cost checked against the remaining daily budget.
    pub estimated_cost: Decimal,
    /// Override for the default retry limit.
    #[serde(default)]
    pub max_retries: Option<u32>,
    /// Override for the default per-attempt timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl JobRequest {
    /// Create a request using the scheduler's default retry and timeout settings.
    #[must_use]
    pub fn new(
        job_type: JobType,
        priority: Priority,
        payload: JobPayload,
        estimated_cost: Decimal,
    ) -> Self {
        Self {
            job_type,
            priority,
            payload,
            estimated_cost,
            max_retries: None,
            timeout_ms: None,
        }
    }

    /// Set the retry limit.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}
