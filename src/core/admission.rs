//! Admission control: which pending job may start now.

use std::collections::BTreeMap;

use crate::core::{CostLedger, Job, JobId, JobType};

/// Concurrency caps enforced at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyLimits {
    /// Maximum jobs running at once, across all types.
    pub max_running: usize,
    /// Per-type caps. Types without an entry are bound only by `max_running`.
    pub per_type: BTreeMap<JobType, usize>,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self {
            max_running: 3,
            per_type: BTreeMap::from([(JobType::Ocr, 2)]),
        }
    }
}

/// Reason a queued job was passed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionBlock {
    /// The job's type is at its concurrency cap.
    TypeAtCapacity(JobType),
    /// The estimated cost no longer fits in today's budget.
    OverBudget,
}

/// Number of running jobs of each type.
pub type RunningCounts = BTreeMap<JobType, usize>;

/// Decides, per tick, whether a pending job may start.
#[derive(Debug, Clone, Default)]
pub struct AdmissionController {
    limits: ConcurrencyLimits,
}

impl AdmissionController {
    /// Create a controller enforcing `limits`.
    #[must_use]
    pub const fn new(limits: ConcurrencyLimits) -> Self {
        Self { limits }
    }

    /// Configured limits.
    #[must_use]
    pub const fn limits(&self) -> &ConcurrencyLimits {
        &self.limits
    }

    /// Whether the global cap leaves room for another job.
    #[must_use]
    pub const fn has_capacity(&self, running: usize) -> bool {
        running < self.limits.max_running
    }

    /// Check a single job against its type cap and the remaining budget.
    pub fn check(
        &self,
        job: &Job,
        running: &RunningCounts,
        ledger: &CostLedger,
    ) -> Result<(), AdmissionBlock> {
        if let Some(&cap) = self.limits.per_type.get(&job.job_type) {
            let active = running.get(&job.job_type).copied().unwrap_or(0);
            if active >= cap {
                return Err(AdmissionBlock::TypeAtCapacity(job.job_type));
            }
        }
        if !ledger.can_afford(job.estimated_cost) {
            return Err(AdmissionBlock::OverBudget);
        }
        Ok(())
    }

    /// First admissible job in dispatch order.
    ///
    /// Blocked jobs are skipped rather than blocking the scan, so a lower
    /// priority job can start ahead of a higher priority one that is waiting
    /// on its type cap or on budget. A job that keeps getting skipped this
    /// way can wait indefinitely.
    pub fn select<'a, I>(
        &self,
        pending: I,
        running: &RunningCounts,
        ledger: &CostLedger,
    ) -> Option<JobId>
    where
        I: IntoIterator<Item = &'a Job>,
    {
        pending.into_iter().find_map(|job| match self.check(job, running, ledger) {
            Ok(()) => Some(job.id),
            Err(block) => {
                tracing::trace!(job_id = %job.id, ?block, "skipping job at admission");
                None
            }
        })
    }
}
