//! # Docflow Scheduler
//!
//! A budget-aware background job scheduler for document-generation workloads.
//!
//! The scheduler coordinates the expensive background work behind a
//! document-generation service: OCR of evidence files, table transformation,
//! image compression and storage uploads. Each unit of work is a [`core::Job`]
//! that waits in a priority queue until the admission controller lets it run.
//!
//! ## Core Problem Solved
//!
//! Background work in this domain is metered and bursty:
//!
//! - **Paid APIs**: OCR and storage cost money per megabyte, so total spend must
//!   stay under a daily budget that resets at local midnight
//! - **Scarce capacity**: OCR providers throttle concurrent requests harder than
//!   the rest of the pipeline
//! - **Flaky collaborators**: executors time out or fail and must be retried a
//!   bounded number of times without double-charging the budget
//!
//! ## Key Features
//!
//! - **Priority Queue**: strict `high > medium > low` ordering, FIFO within a band
//! - **Admission Control**: global and per-type concurrency caps plus budget checks,
//!   with head-of-line skipping so a saturated OCR lane never stalls other work
//! - **Cost Ledger**: actual cost is debited on success only; daily reset at midnight
//! - **Timeouts and Retries**: per-attempt timeouts, bounded retries, idempotent late timers
//! - **Typed Events**: `added / started / completed / failed` delivered to listeners
//!   passed in at construction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docflow_scheduler::builders::SchedulerBuilder;
//! use docflow_scheduler::config::SchedulerConfig;
//! use docflow_scheduler::core::{ExecutorSet, JobRequest, JobType, Priority};
//! use rust_decimal_macros::dec;
//!
//! let scheduler = SchedulerBuilder::new(SchedulerConfig::default(), executors).build()?;
//! scheduler.start();
//!
//! let id = scheduler.add_job(JobRequest::new(
//!     JobType::Ocr,
//!     Priority::High,
//!     serde_json::json!({ "file": "evidence.pdf" }),
//!     dec!(0.25),
//! ))?;
//!
//! let job = scheduler.job_status(&id);
//! scheduler.shutdown().await;
//! ```
//!
//! For complete examples, see `tests/scheduler_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions, job records and cost accounting.
pub mod core;
/// Configuration models for the scheduler, job defaults and cost rates.
pub mod config;
/// Builders to construct a scheduler from configuration.
pub mod builders;
/// Infrastructure adapters for pending-queue storage.
pub mod infra;
/// Runtime adapters (tokio) and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
