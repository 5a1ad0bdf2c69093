//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docflow_scheduler::builders::SchedulerBuilder;
use docflow_scheduler::config::SchedulerConfig;
use docflow_scheduler::core::{
    AppResult, ExecutionOutput, ExecutorSet, InMemoryEventLog, JobExecutor, JobId, JobPayload,
    JobRequest, JobScheduler, JobType, Priority, Usage,
};
use docflow_scheduler::util::init_tracing;
use parking_lot::Mutex;
use rust_decimal::Decimal;

/// What the scripted executor does on one call.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Sleep, then succeed with the given usage.
    Succeed { delay_ms: u64, usage: Usage },
    /// Sleep, then return an error.
    Fail { delay_ms: u64 },
    /// Never resolve.
    Hang,
    /// Panic immediately.
    Panic,
}

impl Step {
    pub const fn ok() -> Self {
        Self::Succeed {
            delay_ms: 0,
            usage: Usage::bytes(0),
        }
    }

    pub const fn ok_after(delay_ms: u64) -> Self {
        Self::Succeed {
            delay_ms,
            usage: Usage::bytes(0),
        }
    }

    pub const fn fail() -> Self {
        Self::Fail { delay_ms: 0 }
    }
}

/// Executor that plays back a script of steps, then succeeds instantly.
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: Mutex<Vec<JobPayload>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Self::with_fallback(steps, Step::ok())
    }

    pub fn with_fallback(steps: impl IntoIterator<Item = Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            fallback,
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    /// Executor that always succeeds immediately.
    pub fn instant() -> Arc<Self> {
        Self::with_fallback(Vec::<Step>::new(), Step::ok())
    }

    /// Executor that always takes `delay_ms` and then succeeds.
    pub fn slow(delay_ms: u64) -> Arc<Self> {
        Self::with_fallback(Vec::<Step>::new(), Step::ok_after(delay_ms))
    }

    /// Executor that never resolves.
    pub fn hanging() -> Arc<Self> {
        Self::with_fallback(Vec::<Step>::new(), Step::Hang)
    }

    pub fn calls(&self) -> Vec<JobPayload> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobExecutor for ScriptedExecutor {
    async fn execute(&self, payload: JobPayload) -> AppResult<ExecutionOutput> {
        let step = self.script.lock().pop_front().unwrap_or(self.fallback);
        self.calls.lock().push(payload.clone());
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        let outcome = match step {
            Step::Succeed { delay_ms, usage } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(ExecutionOutput::new(
                    serde_json::json!({ "echo": payload }),
                    usage,
                ))
            }
            Step::Fail { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Err(anyhow::anyhow!("scripted failure"))
            }
            Step::Hang => std::future::pending::<AppResult<ExecutionOutput>>().await,
            Step::Panic => panic!("executor exploded"),
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

/// Scheduler on the current runtime with an event log attached.
pub fn build_scheduler(
    config: SchedulerConfig,
    executor: Arc<ScriptedExecutor>,
) -> (JobScheduler, Arc<InMemoryEventLog>) {
    init_tracing();
    let log = Arc::new(InMemoryEventLog::new(1_000));
    let scheduler = SchedulerBuilder::new(config, ExecutorSet::uniform(executor))
        .with_listener(log.clone())
        .build()
        .expect("valid config");
    (scheduler, log)
}

pub fn request(job_type: JobType, priority: Priority, cost: Decimal) -> JobRequest {
    JobRequest::new(
        job_type,
        priority,
        serde_json::json!({ "priority": format!("{priority:?}") }),
        cost,
    )
}

/// Add a job that is expected to be admitted.
pub fn submit(
    scheduler: &JobScheduler,
    job_type: JobType,
    priority: Priority,
    cost: Decimal,
) -> JobId {
    scheduler
        .add_job(request(job_type, priority, cost))
        .expect("job admitted")
}

/// Let spawned attempts run without advancing virtual time much.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
