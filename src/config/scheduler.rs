//! Scheduler configuration structures.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{ConcurrencyLimits, CostModel, JobType};

/// Environment variable prefix read by [`SchedulerConfig::from_env`].
pub const ENV_PREFIX: &str = "DOCFLOW_";

/// Retry and timeout values applied when a job request omits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDefaults {
    /// Failed attempts allowed before a job fails permanently.
    pub max_retries: u32,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout_ms: 30_000,
        }
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Period of the admission tick.
    pub tick_interval_ms: u64,
    /// Global concurrency cap.
    pub max_concurrent_jobs: usize,
    /// Per-type concurrency caps.
    pub type_concurrency: BTreeMap<JobType, usize>,
    /// Daily spending limit.
    pub daily_budget: Decimal,
    /// Maximum pending jobs accepted by `add_job`.
    pub max_queue_depth: usize,
    /// Poll period while `shutdown` waits for running jobs.
    pub shutdown_poll_interval_ms: u64,
    /// Defaults for job requests.
    pub defaults: JobDefaults,
    /// Per-type cost rates.
    pub costs: CostModel,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let limits = ConcurrencyLimits::default();
        Self {
            tick_interval_ms: 1_000,
            max_concurrent_jobs: limits.max_running,
            type_concurrency: limits.per_type,
            daily_budget: Decimal::new(100, 0),
            max_queue_depth: 10_000,
            shutdown_poll_interval_ms: 100,
            defaults: JobDefaults::default(),
            costs: CostModel::default(),
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".into());
        }
        if self.max_concurrent_jobs == 0 {
            return Err("max_concurrent_jobs must be greater than 0".into());
        }
        for (job_type, cap) in &self.type_concurrency {
            if *cap == 0 {
                return Err(format!("type_concurrency for `{job_type}` must be greater than 0"));
            }
        }
        if self.daily_budget.is_sign_negative() {
            return Err("daily_budget must not be negative".into());
        }
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.shutdown_poll_interval_ms == 0 {
            return Err("shutdown_poll_interval_ms must be greater than 0".into());
        }
        if self.defaults.timeout_ms == 0 {
            return Err("defaults.timeout_ms must be greater than 0".into());
        }
        self.costs.validate().map_err(|e| format!("costs invalid: {e}"))
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `DOCFLOW_*` environment variables over the defaults.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Recognized variables: `TICK_INTERVAL_MS`, `MAX_CONCURRENT_JOBS`,
    /// `MAX_CONCURRENT_OCR`, `DAILY_BUDGET`, `MAX_QUEUE_DEPTH`,
    /// `SHUTDOWN_POLL_INTERVAL_MS`, `DEFAULT_MAX_RETRIES`, `DEFAULT_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Build configuration from an arbitrary key lookup (keys without the prefix).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = parse_var(&lookup, "TICK_INTERVAL_MS")? {
            cfg.tick_interval_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_CONCURRENT_JOBS")? {
            cfg.max_concurrent_jobs = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_CONCURRENT_OCR")? {
            cfg.type_concurrency.insert(JobType::Ocr, v);
        }
        if let Some(v) = parse_var(&lookup, "DAILY_BUDGET")? {
            cfg.daily_budget = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_QUEUE_DEPTH")? {
            cfg.max_queue_depth = v;
        }
        if let Some(v) = parse_var(&lookup, "SHUTDOWN_POLL_INTERVAL_MS")? {
            cfg.shutdown_poll_interval_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "DEFAULT_MAX_RETRIES")? {
            cfg.defaults.max_retries = v;
        }
        if let Some(v) = parse_var(&lookup, "DEFAULT_TIMEOUT_MS")? {
            cfg.defaults.timeout_ms = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Concurrency caps for the admission controller.
    #[must_use]
    pub fn limits(&self) -> ConcurrencyLimits {
        ConcurrencyLimits {
            max_running: self.max_concurrent_jobs,
            per_type: self.type_concurrency.clone(),
        }
    }

    /// Tick period.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Shutdown poll period.
    #[must_use]
    pub const fn shutdown_poll_interval(&self) -> Duration {
        Duration::from_millis(self.shutdown_poll_interval_ms)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| format!("{ENV_PREFIX}{key}: {e}"))
        })
        .transpose()
}
