//! Executor traits and per-type routing.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, JobPayload, JobType, Usage};

/// Result of a successful execution attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    /// Type-specific result delivered with the `completed` event.
    pub result: serde_json::Value,
    /// Work performed, priced by the scheduler's cost model.
    pub usage: Usage,
}

impl ExecutionOutput {
    /// Create an output from a result and its usage.
    #[must_use]
    pub const fn new(result: serde_json::Value, usage: Usage) -> Self {
        Self { result, usage }
    }
}

/// Performs the actual work for one job type.
///
/// The scheduler does not deduplicate side effects across retries, so an
/// executor must tolerate being invoked again with the same payload.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use docflow_scheduler::core::{AppResult, ExecutionOutput, JobExecutor, JobPayload, Usage};
///
/// struct CompressExecutor;
///
/// #[async_trait]
/// impl JobExecutor for CompressExecutor {
///     async fn execute(&self, payload: JobPayload) -> AppResult<ExecutionOutput> {
///         let path = payload["path"].as_str().unwrap_or_default();
///         Ok(ExecutionOutput::new(serde_json::json!({ "path": path }), Usage::default()))
///     }
/// }
/// ```
#[async_trait]
pub trait JobExecutor: Send + Sync + 'static {
    /// Execute a payload. Errors are retried up to the job's retry limit.
    async fn execute(&self, payload: JobPayload) -> AppResult<ExecutionOutput>;
}

/// One executor per job type.
///
/// Routing is an exhaustive `match` on [`JobType`], so adding a job type fails
/// to compile until an executor slot exists for it.
#[derive(Clone)]
pub struct ExecutorSet {
    /// Text extraction.
    pub ocr: Arc<dyn JobExecutor>,
    /// Table transformation.
    pub transform: Arc<dyn JobExecutor>,
    /// Image compression.
    pub compress: Arc<dyn JobExecutor>,
    /// Storage upload.
    pub storage: Arc<dyn JobExecutor>,
}

impl ExecutorSet {
    /// Bind each job type to its executor.
    pub fn new(
        ocr: Arc<dyn JobExecutor>,
        transform: Arc<dyn JobExecutor>,
        compress: Arc<dyn JobExecutor>,
        storage: Arc<dyn JobExecutor>,
    ) -> Self {
        Self {
            ocr,
            transform,
            compress,
            storage,
        }
    }

    /// Use the same executor for every job type.
    pub fn uniform(executor: Arc<dyn JobExecutor>) -> Self {
        Self {
            ocr: Arc::clone(&executor),
            transform: Arc::clone(&executor),
            compress: Arc::clone(&executor),
            storage: executor,
        }
    }

    /// Executor responsible for `job_type`.
    #[must_use]
    pub fn for_type(&self, job_type: JobType) -> &Arc<dyn JobExecutor> {
        match job_type {
            JobType::Ocr => &self.ocr,
            JobType::Transform => &self.transform,
            JobType::Compress => &self.compress,
            JobType::Storage => &self.storage,
        }
    }
}

impl std::fmt::Debug for ExecutorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorSet").finish_non_exhaustive()
    }
}

/// Abstraction for spawning attempt execution on a runtime.
pub trait Spawn {
    /// Spawn a future that runs to completion in the background.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
