//! Configuration models for the scheduler, job defaults and cost rates.

pub mod scheduler;

pub use scheduler::{JobDefaults, SchedulerConfig, ENV_PREFIX};
