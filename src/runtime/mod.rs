//! Runtime adapters (tokio) and API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{health, job_status, submit_job, Health, JobStatusResponse, JobSubmission};
pub use tokio_spawner::TokioSpawner;
