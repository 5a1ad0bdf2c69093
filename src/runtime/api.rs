//! API-facing request/response models.
//!
//! These are the shapes an HTTP or websocket layer exchanges with the
//! scheduler; the transport itself lives outside this crate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    Job, JobId, JobPayload, JobQueue, JobRequest, JobScheduler, JobStatus, JobType, Priority,
    SchedulerError,
};

/// Job submission payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSubmission {
    /// Executor routing tag.
    pub job_type: JobType,
    /// Priority band. Defaults to medium.
    #[serde(default = "default_priority")]
    pub priority: Priority,
    /// Opaque executor input.
    #[serde(default)]
    pub payload: JobPayload,
    /// Cost checked against the remaining daily budget.
    pub estimated_cost: Decimal,
    /// Optional retry limit override.
    #[serde(default)]
    pub max_retries: Option<u32>,
    /// Optional per-attempt timeout override.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

const fn default_priority() -> Priority {
    Priority::Medium
}

impl From<JobSubmission> for JobRequest {
    fn from(req: JobSubmission) -> Self {
        Self {
            job_type: req.job_type,
            priority: req.priority,
            payload: req.payload,
            estimated_cost: req.estimated_cost,
            max_retries: req.max_retries,
            timeout_ms: req.timeout_ms,
        }
    }
}

/// Job status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    /// Job identifier.
    pub job_id: JobId,
    /// Executor routing tag.
    pub job_type: JobType,
    /// Current status.
    pub status: JobStatus,
    /// Failed attempts so far.
    pub retries: u32,
    /// Actual cost, once completed.
    pub actual_cost: Option<Decimal>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Terminal transition time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure reason for permanently failed jobs.
    pub reason: Option<String>,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            job_type: job.job_type,
            status: job.status,
            retries: job.retries,
            actual_cost: job.actual_cost,
            created_at: job.created_at,
            completed_at: job.completed_at,
            reason: job.error.clone(),
        }
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag: the scheduler still accepts work.
    pub ok: bool,
    /// Jobs currently executing.
    pub running_jobs: usize,
    /// Jobs waiting in the queue.
    pub pending_jobs: usize,
    /// Budget left today.
    pub remaining_budget: Decimal,
}

/// Submit a job and return its initial status.
pub fn submit_job<Q, S>(
    scheduler: &JobScheduler<Q, S>,
    req: JobSubmission,
) -> Result<JobStatusResponse, SchedulerError>
where
    Q: JobQueue + 'static,
{
    let id = scheduler.add_job(req.into())?;
    scheduler
        .job_status(&id)
        .map(|job| JobStatusResponse::from(&job))
        .ok_or_else(|| SchedulerError::InvalidJob(format!("job {id} vanished after submit")))
}

/// Look up a job's status.
pub fn job_status<Q, S>(scheduler: &JobScheduler<Q, S>, id: &JobId) -> Option<JobStatusResponse>
where
    Q: JobQueue + 'static,
{
    scheduler.job_status(id).map(|job| JobStatusResponse::from(&job))
}

/// Return a health payload.
pub fn health<Q, S>(scheduler: &JobScheduler<Q, S>) -> Health
where
    Q: JobQueue + 'static,
{
    let metrics = scheduler.metrics();
    Health {
        ok: scheduler.is_accepting(),
        running_jobs: metrics.running_jobs,
        pending_jobs: metrics.pending_jobs,
        remaining_budget: scheduler.ledger().remaining(),
    }
}
