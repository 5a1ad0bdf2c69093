//! Pending-queue abstraction.

use crate::core::{Job, JobId};

/// Ordered holding area for jobs that have not been dispatched.
///
/// Implementations must iterate in dispatch order: strictly by priority band,
/// FIFO within a band.
pub trait JobQueue: Send {
    /// Insert a pending job at its priority position.
    fn enqueue(&mut self, job: Job);
    /// Remove a job by id, returning it if it was queued.
    fn remove(&mut self, id: &JobId) -> Option<Job>;
    /// Look up a queued job.
    fn get(&self, id: &JobId) -> Option<&Job>;
    /// Queued jobs in dispatch order.
    fn iter(&self) -> Box<dyn Iterator<Item = &Job> + '_>;
    /// Current depth.
    fn len(&self) -> usize;
    /// Whether the queue holds no jobs.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
