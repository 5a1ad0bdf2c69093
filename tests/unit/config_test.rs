//! Tests for configuration validation

use std::collections::HashMap;

use docflow_scheduler::config::{SchedulerConfig, ENV_PREFIX};
use docflow_scheduler::core::{CostModel, JobType};
use rust_decimal_macros::dec;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_default_config_is_valid() {
    let config = SchedulerConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.tick_interval_ms, 1_000);
    assert_eq!(config.max_concurrent_jobs, 3);
    assert_eq!(config.type_concurrency.get(&JobType::Ocr), Some(&2));
    assert_eq!(config.daily_budget, dec!(100));
    assert_eq!(config.defaults.max_retries, 3);
    assert_eq!(config.defaults.timeout_ms, 30_000);
}

#[test]
fn test_config_invalid_tick_interval() {
    let invalid = SchedulerConfig {
        tick_interval_ms: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_concurrency() {
    let invalid = SchedulerConfig {
        max_concurrent_jobs: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());

    let mut invalid = SchedulerConfig::default();
    invalid.type_concurrency.insert(JobType::Storage, 0);
    let err = invalid.validate().unwrap_err();
    assert!(err.contains("storage"));
}

#[test]
fn test_config_invalid_budget_and_rates() {
    let invalid = SchedulerConfig {
        daily_budget: dec!(-1),
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());

    let invalid = SchedulerConfig {
        costs: CostModel {
            ocr_per_mb: dec!(-0.05),
            ..CostModel::default()
        },
        ..SchedulerConfig::default()
    };
    let err = invalid.validate().unwrap_err();
    assert!(err.contains("ocr_per_mb"));
}

#[test]
fn test_config_invalid_default_timeout() {
    let mut invalid = SchedulerConfig::default();
    invalid.defaults.timeout_ms = 0;
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "tick_interval_ms": 250,
        "max_concurrent_jobs": 5,
        "type_concurrency": { "ocr": 1, "storage": 4 },
        "daily_budget": "250.50",
        "defaults": { "max_retries": 5 },
        "costs": { "compress_flat": "0.01" }
    }"#;

    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.tick_interval_ms, 250);
    assert_eq!(config.max_concurrent_jobs, 5);
    assert_eq!(config.type_concurrency.get(&JobType::Ocr), Some(&1));
    assert_eq!(config.type_concurrency.get(&JobType::Storage), Some(&4));
    assert_eq!(config.daily_budget, dec!(250.50));
    assert_eq!(config.defaults.max_retries, 5);
    assert_eq!(config.defaults.timeout_ms, 30_000);
    assert_eq!(config.costs.compress_flat, dec!(0.01));
    assert_eq!(config.costs.ocr_per_mb, dec!(0.05));
}

#[test]
fn test_config_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str(r#"{ "max_concurrent_jobs": 0 }"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_from_lookup() {
    let config = SchedulerConfig::from_lookup(lookup(&[
        ("MAX_CONCURRENT_JOBS", "6"),
        ("MAX_CONCURRENT_OCR", " 3 "),
        ("DAILY_BUDGET", "42.5"),
        ("DEFAULT_TIMEOUT_MS", "1500"),
    ]))
    .unwrap();

    assert_eq!(config.max_concurrent_jobs, 6);
    assert_eq!(config.type_concurrency.get(&JobType::Ocr), Some(&3));
    assert_eq!(config.daily_budget, dec!(42.5));
    assert_eq!(config.defaults.timeout_ms, 1_500);
    assert_eq!(config.tick_interval_ms, 1_000);
}

#[test]
fn test_config_from_lookup_bad_value() {
    let err = SchedulerConfig::from_lookup(lookup(&[("DAILY_BUDGET", "lots")])).unwrap_err();
    assert!(err.starts_with(&format!("{ENV_PREFIX}DAILY_BUDGET")));

    assert!(SchedulerConfig::from_lookup(lookup(&[("TICK_INTERVAL_MS", "0")])).is_err());
}

#[test]
fn test_config_durations() {
    let config = SchedulerConfig::default();
    assert_eq!(config.tick_interval().as_millis(), 1_000);
    assert_eq!(config.shutdown_poll_interval().as_millis(), 100);

    let limits = config.limits();
    assert_eq!(limits.max_running, 3);
    assert_eq!(limits.per_type.get(&JobType::Ocr), Some(&2));
}
