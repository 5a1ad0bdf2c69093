//! Job scheduler: priority queue, admission, dispatch, retries and shutdown.
//!
//! All mutable scheduling state (pending queue, running map, completed map and
//! cost ledger) lives behind a single `parking_lot::Mutex`. The lock is taken
//! by the tick, by `add_job` and by an attempt's completion, and is never held
//! across an `.await`. Executors run on spawned tasks and report back through
//! [`Shared::finish_attempt`].

use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::SchedulerConfig;
use crate::core::{
    AdmissionController, AttemptFailure, CostLedger, ExecutionOutput, ExecutorSet, Job,
    JobEvent, JobEventListener, JobExecutor, JobId, JobPayload, JobQueue, JobRequest, JobStatus,
    RunningCounts, SchedulerError, Spawn,
};
use crate::infra::queue::InMemoryJobQueue;
use crate::runtime::TokioSpawner;
use crate::util::clock::{until_next_local_midnight, Clock};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Point-in-time scheduler statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerMetrics {
    /// Jobs ever accepted: pending + running + finished.
    pub total_jobs: usize,
    /// Jobs waiting in the queue.
    pub pending_jobs: usize,
    /// Jobs currently executing.
    pub running_jobs: usize,
    /// Jobs finished successfully.
    pub completed_jobs: usize,
    /// Jobs that exhausted their retries.
    pub failed_jobs: usize,
    /// Sum of actual costs over all finished jobs. Not reset at midnight.
    pub total_cost: Decimal,
    /// Spend recorded since the last daily reset.
    pub current_spend: Decimal,
    /// Daily spending limit.
    pub daily_limit: Decimal,
    /// Mean execution time of successful jobs.
    pub avg_processing_time_ms: f64,
    /// Mean time from creation to first dispatch, over every started job.
    pub queue_wait_time_ms: f64,
}

struct SchedulerState<Q> {
    pending: Q,
    running: HashMap<JobId, Job>,
    completed: HashMap<JobId, Job>,
    ledger: CostLedger,
}

impl<Q> SchedulerState<Q> {
    fn running_counts(&self) -> RunningCounts {
        let mut counts = RunningCounts::new();
        for job in self.running.values() {
            *counts.entry(job.job_type).or_insert(0) += 1;
        }
        counts
    }
}

/// Identifies one execution attempt so a late result cannot touch a later attempt.
#[derive(Debug, Clone, Copy)]
struct Attempt {
    id: JobId,
    retries: u32,
    timeout_ms: u64,
}

struct Shared<Q> {
    config: SchedulerConfig,
    admission: AdmissionController,
    executors: ExecutorSet,
    listeners: Vec<Arc<dyn JobEventListener>>,
    clock: Arc<dyn Clock>,
    state: Mutex<SchedulerState<Q>>,
    accepting: AtomicBool,
    loops_started: AtomicBool,
    stop_tx: watch::Sender<bool>,
}

impl<Q: JobQueue> Shared<Q> {
    fn publish(&self, event: &JobEvent) {
        for listener in &self.listeners {
            listener.on_event(event);
        }
    }

    /// Apply an attempt's outcome: complete, requeue for retry, or fail permanently.
    fn finish_attempt(&self, attempt: Attempt, outcome: Result<ExecutionOutput, AttemptFailure>) {
        let event = {
            let mut state = self.state.lock();
            let mut job = match state.running.entry(attempt.id) {
                Entry::Occupied(entry) if entry.get().retries == attempt.retries => entry.remove(),
                _ => {
                    tracing::debug!(job_id = %attempt.id, "ignoring result of a resolved attempt");
                    return;
                }
            };
            let now = self.clock.now();

            match outcome {
                Ok(output) => {
                    let cost = self.config.costs.cost_for(job.job_type, &output.usage);
                    job.actual_cost = Some(cost);
                    job.completed_at = Some(now);
                    job.status = JobStatus::Completed;
                    job.error = None;
                    state.ledger.record(cost);
                    tracing::info!(
                        job_id = %job.id,
                        job_type = %job.job_type,
                        %cost,
                        spent = %state.ledger.current_spend(),
                        "job completed"
                    );
                    state.completed.insert(job.id, job.clone());
                    Some(JobEvent::Completed {
                        job,
                        result: output.result,
                    })
                }
                Err(failure) => {
                    job.retries = job.retries.saturating_add(1);
                    let message = failure.to_string();
                    if job.retries < job.max_retries {
                        tracing::warn!(
                            job_id = %job.id,
                            job_type = %job.job_type,
                            retries = job.retries,
                            max_retries = job.max_retries,
                            error = %message,
                            "attempt failed, requeueing"
                        );
                        job.error = None;
                        job.status = JobStatus::Pending;
                        state.pending.enqueue(job);
                        None
                    } else {
                        tracing::error!(
                            job_id = %job.id,
                            job_type = %job.job_type,
                            retries = job.retries,
                            error = %message,
                            "job failed permanently"
                        );
                        job.error = Some(message.clone());
                        job.status = JobStatus::Failed;
                        job.completed_at = Some(now);
                        state.completed.insert(job.id, job.clone());
                        Some(JobEvent::Failed {
                            job,
                            error: message,
                        })
                    }
                }
            }
        };

        if let Some(event) = event {
            self.publish(&event);
        }
    }
}

/// Budget-aware priority scheduler for background jobs.
///
/// Cloning yields another handle to the same scheduler.
pub struct JobScheduler<Q = InMemoryJobQueue, S = TokioSpawner> {
    shared: Arc<Shared<Q>>,
    spawner: S,
}

impl<Q, S: Clone> Clone for JobScheduler<Q, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            spawner: self.spawner.clone(),
        }
    }
}

impl<Q, S> JobScheduler<Q, S>
where
    Q: JobQueue + 'static,
{
    /// Create a scheduler from its components.
    ///
    /// Prefer [`crate::builders::SchedulerBuilder`], which fills in defaults.
    pub fn new(
        config: SchedulerConfig,
        queue: Q,
        executors: ExecutorSet,
        spawner: S,
        clock: Arc<dyn Clock>,
        listeners: Vec<Arc<dyn JobEventListener>>,
    ) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        let ledger = CostLedger::new(config.daily_budget, clock.now());
        let (stop_tx, _) = watch::channel(false);
        Ok(Self {
            shared: Arc::new(Shared {
                admission: AdmissionController::new(config.limits()),
                config,
                executors,
                listeners,
                clock,
                state: Mutex::new(SchedulerState {
                    pending: queue,
                    running: HashMap::new(),
                    completed: HashMap::new(),
                    ledger,
                }),
                accepting: AtomicBool::new(true),
                loops_started: AtomicBool::new(false),
                stop_tx,
            }),
            spawner,
        })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    /// Whether the scheduler still accepts and admits jobs.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.shared.accepting.load(Ordering::Acquire)
    }

    /// Create a job and queue it.
    ///
    /// Rejected synchronously, without creating anything, when the estimated
    /// cost does not fit in the remaining daily budget.
    pub fn add_job(&self, request: JobRequest) -> Result<JobId, SchedulerError> {
        if !self.is_accepting() {
            return Err(SchedulerError::ShuttingDown);
        }
        if request.estimated_cost.is_sign_negative() {
            return Err(SchedulerError::InvalidJob(
                "estimated_cost must not be negative".into(),
            ));
        }
        let defaults = &self.shared.config.defaults;
        let timeout_ms = request.timeout_ms.unwrap_or(defaults.timeout_ms);
        if timeout_ms == 0 {
            return Err(SchedulerError::InvalidJob(
                "timeout_ms must be greater than 0".into(),
            ));
        }
        let max_retries = request.max_retries.unwrap_or(defaults.max_retries);

        let job = {
            let mut state = self.shared.state.lock();
            if !state.ledger.can_afford(request.estimated_cost) {
                tracing::warn!(
                    job_type = %request.job_type,
                    estimated = %request.estimated_cost,
                    spent = %state.ledger.current_spend(),
                    "job rejected: daily budget exceeded"
                );
                return Err(SchedulerError::BudgetExceeded {
                    current: state.ledger.current_spend(),
                    estimated: request.estimated_cost,
                    limit: state.ledger.daily_limit(),
                });
            }
            let depth = self.shared.config.max_queue_depth;
            if state.pending.len() >= depth {
                tracing::warn!(depth, "job rejected: queue full");
                return Err(SchedulerError::QueueFull(format!(
                    "max queue depth {depth} reached"
                )));
            }
            let job = Job::pending(request, max_retries, timeout_ms, self.shared.clock.now());
            state.pending.enqueue(job.clone());
            job
        };

        tracing::info!(
            job_id = %job.id,
            job_type = %job.job_type,
            priority = ?job.priority,
            "job added"
        );
        let id = job.id;
        self.shared.publish(&JobEvent::Added { job });
        Ok(id)
    }

    /// Look up a job: running first, then finished, then pending.
    #[must_use]
    pub fn job_status(&self, id: &JobId) -> Option<Job> {
        let state = self.shared.state.lock();
        state
            .running
            .get(id)
            .or_else(|| state.completed.get(id))
            .or_else(|| state.pending.get(id))
            .cloned()
    }

    /// Pending jobs in dispatch order.
    #[must_use]
    pub fn pending_jobs(&self) -> Vec<Job> {
        self.shared.state.lock().pending.iter().cloned().collect()
    }

    /// Snapshot of the cost ledger.
    #[must_use]
    pub fn ledger(&self) -> CostLedger {
        self.shared.state.lock().ledger.clone()
    }

    /// Spend recorded since the last daily reset.
    #[must_use]
    pub fn current_spend(&self) -> Decimal {
        self.shared.state.lock().ledger.current_spend()
    }

    /// Aggregate statistics.
    #[must_use]
    pub fn metrics(&self) -> SchedulerMetrics {
        let state = self.shared.state.lock();
        let mut completed_jobs = 0;
        let mut failed_jobs = 0;
        let mut total_cost = Decimal::ZERO;
        for job in state.completed.values() {
            match job.status {
                JobStatus::Completed => completed_jobs += 1,
                JobStatus::Failed => failed_jobs += 1,
                JobStatus::Pending | JobStatus::Running => {}
            }
            total_cost = total_cost.saturating_add(job.actual_cost.unwrap_or_default());
        }

        let processing = state
            .completed
            .values()
            .filter(|job| job.status == JobStatus::Completed)
            .filter_map(Job::processing_time_ms);
        let waits = state
            .completed
            .values()
            .chain(state.running.values())
            .chain(state.pending.iter())
            .filter_map(Job::queue_wait_ms);

        SchedulerMetrics {
            total_jobs: state.pending.len() + state.running.len() + state.completed.len(),
            pending_jobs: state.pending.len(),
            running_jobs: state.running.len(),
            completed_jobs,
            failed_jobs,
            total_cost,
            current_spend: state.ledger.current_spend(),
            daily_limit: state.ledger.daily_limit(),
            avg_processing_time_ms: mean_ms(processing),
            queue_wait_time_ms: mean_ms(waits),
        }
    }

    /// Zero today's spend. Pending and running jobs are not touched.
    pub fn reset_daily_budget(&self) {
        let now = self.shared.clock.now();
        self.shared.state.lock().ledger.reset(now);
    }

    /// Stop the tick and daily-reset loops. Jobs can still be added and
    /// dispatched by calling [`Self::tick`] directly. A stopped scheduler's
    /// loops cannot be restarted.
    pub fn stop(&self) {
        self.shared.stop_tx.send_replace(true);
    }

    /// Stop admitting jobs and wait until every running job has finished.
    ///
    /// In-flight executors are not cancelled. Pending jobs stay queued.
    pub async fn shutdown(&self) {
        self.shared.accepting.store(false, Ordering::Release);
        self.stop();
        tracing::info!(
            running = self.shared.state.lock().running.len(),
            "shutting down, waiting for running jobs"
        );
        let poll = self.shared.config.shutdown_poll_interval();
        loop {
            let running = self.shared.state.lock().running.len();
            if running == 0 {
                break;
            }
            tokio::time::sleep(poll).await;
        }
        tracing::info!("scheduler drained");
    }
}

impl<Q, S> JobScheduler<Q, S>
where
    Q: JobQueue + 'static,
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Run one admission step: dispatch at most one job.
    ///
    /// Returns the id of the dispatched job. The executor runs on a spawned
    /// task; this call does not wait for it.
    pub fn tick(&self) -> Option<JobId> {
        if !self.is_accepting() {
            return None;
        }
        let job = {
            let mut state = self.shared.state.lock();
            if !self.shared.admission.has_capacity(state.running.len()) {
                tracing::trace!(running = state.running.len(), "at global capacity");
                return None;
            }
            let counts = state.running_counts();
            let id = self
                .shared
                .admission
                .select(state.pending.iter(), &counts, &state.ledger)?;
            let mut job = state.pending.remove(&id)?;
            job.status = JobStatus::Running;
            if job.started_at.is_none() {
                job.started_at = Some(self.shared.clock.now());
            }
            state.running.insert(id, job.clone());
            job
        };

        tracing::info!(
            job_id = %job.id,
            job_type = %job.job_type,
            priority = ?job.priority,
            attempt = job.retries + 1,
            "dispatching job"
        );
        self.shared.publish(&JobEvent::Started { job: job.clone() });

        let attempt = Attempt {
            id: job.id,
            retries: job.retries,
            timeout_ms: job.timeout_ms,
        };
        let executor = Arc::clone(self.shared.executors.for_type(job.job_type));
        self.spawner.spawn(run_attempt(
            Arc::clone(&self.shared),
            executor,
            attempt,
            job.payload,
        ));
        Some(attempt.id)
    }

    /// Spawn the periodic tick loop and the daily budget reset loop.
    ///
    /// Calling `start` more than once has no effect.
    pub fn start(&self) {
        if self
            .shared
            .loops_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("scheduler loops already started");
            return;
        }
        tracing::info!(
            tick_ms = self.shared.config.tick_interval_ms,
            max_concurrent = self.shared.config.max_concurrent_jobs,
            daily_budget = %self.shared.config.daily_budget,
            "starting scheduler"
        );
        self.spawner.spawn(self.clone().run_tick_loop());
        self.spawner.spawn(self.clone().run_reset_loop());
    }

    async fn run_tick_loop(self) {
        let period = self.shared.config.tick_interval();
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stop = self.shared.stop_tx.subscribe();
        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                }
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("tick loop stopped");
    }

    async fn run_reset_loop(self) {
        let first = until_next_local_midnight(self.shared.clock.now());
        let mut interval = tokio::time::interval_at(Instant::now() + first, DAY);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stop = self.shared.stop_tx.subscribe();
        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {
                    self.reset_daily_budget();
                }
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("daily reset loop stopped");
    }
}

/// Execute one attempt under its timeout and report the outcome.
async fn run_attempt<Q: JobQueue>(
    shared: Arc<Shared<Q>>,
    executor: Arc<dyn JobExecutor>,
    attempt: Attempt,
    payload: JobPayload,
) {
    let execution = AssertUnwindSafe(executor.execute(payload)).catch_unwind();
    let timeout = Duration::from_millis(attempt.timeout_ms);
    let outcome = match tokio::time::timeout(timeout, execution).await {
        Ok(Ok(Ok(output))) => Ok(output),
        Ok(Ok(Err(e))) => Err(AttemptFailure::Executor(format!("{e:#}"))),
        Ok(Err(panic)) => Err(AttemptFailure::Panicked(panic_message(&*panic))),
        Err(_) => Err(AttemptFailure::TimedOut {
            timeout_ms: attempt.timeout_ms,
        }),
    };
    shared.finish_attempt(attempt, outcome);
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[allow(clippy::cast_precision_loss)]
fn mean_ms(samples: impl Iterator<Item = i64>) -> f64 {
    let (sum, count) = samples.fold((0_i64, 0_u64), |(sum, count), ms| {
        (sum.saturating_add(ms), count + 1)
    });
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
