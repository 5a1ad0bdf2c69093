//! Builder wiring configuration, executors and runtime adapters into a scheduler.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::{
    ExecutorSet, JobEventListener, JobQueue, JobScheduler, SchedulerError, TracingListener,
};
use crate::infra::queue::InMemoryJobQueue;
use crate::runtime::TokioSpawner;
use crate::util::clock::{Clock, SystemClock};

/// Builds a [`JobScheduler`].
///
/// Defaults: in-memory queue, tokio spawner on the runtime current at
/// [`SchedulerBuilder::new`], system clock and no listeners. Without a current
/// runtime, supply a spawner with [`SchedulerBuilder::with_spawner`] or
/// [`SchedulerBuilder::build`] fails with [`SchedulerError::NoRuntime`].
///
/// ```rust,ignore
/// let log = Arc::new(InMemoryEventLog::new(1_000));
/// let scheduler = SchedulerBuilder::new(SchedulerConfig::from_env()?, executors)
///     .with_listener(log.clone())
///     .with_tracing()
///     .build()?;
/// ```
pub struct SchedulerBuilder<Q = InMemoryJobQueue, S = TokioSpawner> {
    config: SchedulerConfig,
    executors: ExecutorSet,
    queue: Q,
    spawner: Option<S>,
    clock: Arc<dyn Clock>,
    listeners: Vec<Arc<dyn JobEventListener>>,
}

impl SchedulerBuilder {
    /// Start a builder from configuration and the executor for each job type.
    #[must_use]
    pub fn new(config: SchedulerConfig, executors: ExecutorSet) -> Self {
        let queue = InMemoryJobQueue::with_capacity(config.max_queue_depth);
        Self {
            config,
            executors,
            queue,
            spawner: TokioSpawner::try_current().ok(),
            clock: Arc::new(SystemClock),
            listeners: Vec::new(),
        }
    }
}

impl<Q, S> SchedulerBuilder<Q, S> {
    /// Use a different pending-queue backend.
    pub fn with_queue<Q2: JobQueue>(self, queue: Q2) -> SchedulerBuilder<Q2, S> {
        SchedulerBuilder {
            config: self.config,
            executors: self.executors,
            queue,
            spawner: self.spawner,
            clock: self.clock,
            listeners: self.listeners,
        }
    }

    /// Use a different spawner.
    pub fn with_spawner<S2>(self, spawner: S2) -> SchedulerBuilder<Q, S2> {
        SchedulerBuilder {
            config: self.config,
            executors: self.executors,
            queue: self.queue,
            spawner: Some(spawner),
            clock: self.clock,
            listeners: self.listeners,
        }
    }

    /// Use a different wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a lifecycle listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn JobEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Log every lifecycle event through `tracing`.
    #[must_use]
    pub fn with_tracing(self) -> Self {
        self.with_listener(Arc::new(TracingListener))
    }
}

impl<Q, S> SchedulerBuilder<Q, S>
where
    Q: JobQueue + 'static,
{
    /// Validate configuration and construct the scheduler. Loops are not started.
    pub fn build(self) -> Result<JobScheduler<Q, S>, SchedulerError> {
        let spawner = self.spawner.ok_or(SchedulerError::NoRuntime)?;
        JobScheduler::new(
            self.config,
            self.queue,
            self.executors,
            spawner,
            self.clock,
            self.listeners,
        )
    }
}
