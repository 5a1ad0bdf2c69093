//! In-memory pending queue with priority bands and FIFO tie-breaking.

use crate::core::{Job, JobId, JobQueue};

/// In-memory queue storing pending jobs in dispatch order.
///
/// A job is inserted immediately before the first queued job whose priority is
/// strictly lower, or appended when there is none. Equal priorities therefore
/// keep arrival order. Insertion and removal are O(n); admission scans the
/// whole queue anyway, so a heap would not help.
#[derive(Debug, Default)]
pub struct InMemoryJobQueue {
    jobs: Vec<Job>,
}

impl InMemoryJobQueue {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Create an empty queue with room for `capacity` jobs.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: Vec::with_capacity(capacity.min(1024)),
        }
    }
}

impl JobQueue for InMemoryJobQueue {
    fn enqueue(&mut self, job: Job) {
        let position = self
            .jobs
            .iter()
            .position(|queued| queued.priority < job.priority)
            .unwrap_or(self.jobs.len());
        self.jobs.insert(position, job);
    }

    fn remove(&mut self, id: &JobId) -> Option<Job> {
        let position = self.jobs.iter().position(|job| job.id == *id)?;
        Some(self.jobs.remove(position))
    }

    fn get(&self, id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == *id)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Job> + '_> {
        Box::new(self.jobs.iter())
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }
}
