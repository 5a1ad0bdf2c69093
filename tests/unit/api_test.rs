//! Tests for API request/response models

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docflow_scheduler::builders::SchedulerBuilder;
use docflow_scheduler::config::SchedulerConfig;
use docflow_scheduler::core::{
    AppResult, ExecutionOutput, ExecutorSet, JobExecutor, JobPayload, JobStatus, JobType,
    Priority, SchedulerError, Usage,
};
use docflow_scheduler::runtime::{health, job_status, submit_job, JobSubmission};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

struct Noop;

#[async_trait]
impl JobExecutor for Noop {
    async fn execute(&self, payload: JobPayload) -> AppResult<ExecutionOutput> {
        Ok(ExecutionOutput::new(payload, Usage::default()))
    }
}

#[test]
fn test_submission_defaults() {
    let submission: JobSubmission =
        serde_json::from_str(r#"{ "job_type": "ocr", "estimated_cost": "0.25" }"#).unwrap();

    assert_eq!(submission.job_type, JobType::Ocr);
    assert_eq!(submission.priority, Priority::Medium);
    assert!(submission.payload.is_null());
    assert_eq!(submission.estimated_cost, dec!(0.25));
    assert_eq!(submission.max_retries, None);
}

#[tokio::test]
async fn test_submit_status_and_health() {
    let config = SchedulerConfig {
        daily_budget: dec!(5),
        ..SchedulerConfig::default()
    };
    let scheduler = SchedulerBuilder::new(config, ExecutorSet::uniform(Arc::new(Noop)))
        .build()
        .unwrap();

    let submission = JobSubmission {
        job_type: JobType::Transform,
        priority: Priority::High,
        payload: serde_json::json!({ "rows": 3 }),
        estimated_cost: dec!(2),
        max_retries: Some(1),
        timeout_ms: None,
    };
    let response = submit_job(&scheduler, submission).unwrap();
    assert_eq!(response.status, JobStatus::Pending);
    assert_eq!(response.retries, 0);
    assert!(response.reason.is_none());

    let looked_up = job_status(&scheduler, &response.job_id).unwrap();
    assert_eq!(looked_up.job_id, response.job_id);

    let report = health(&scheduler);
    assert!(report.ok);
    assert_eq!(report.pending_jobs, 1);
    assert_eq!(report.running_jobs, 0);
    assert_eq!(report.remaining_budget, dec!(5));
}

#[tokio::test]
async fn test_submit_over_budget() {
    let config = SchedulerConfig {
        daily_budget: dec!(1),
        ..SchedulerConfig::default()
    };
    let scheduler = SchedulerBuilder::new(config, ExecutorSet::uniform(Arc::new(Noop)))
        .build()
        .unwrap();

    let submission = JobSubmission {
        job_type: JobType::Ocr,
        priority: Priority::Low,
        payload: serde_json::Value::Null,
        estimated_cost: dec!(1.5),
        max_retries: None,
        timeout_ms: None,
    };
    assert!(matches!(
        submit_job(&scheduler, submission),
        Err(SchedulerError::BudgetExceeded { .. })
    ));
    assert_eq!(health(&scheduler).pending_jobs, 0);
}

#[tokio::test]
async fn test_submit_huge_estimate_is_rejected() {
    let scheduler =
        SchedulerBuilder::new(SchedulerConfig::default(), ExecutorSet::uniform(Arc::new(Noop)))
            .build()
            .unwrap();

    let cheap: JobSubmission = serde_json::from_value(serde_json::json!({
        "job_type": "compress",
        "estimated_cost": "0.01",
    }))
    .unwrap();
    let first = submit_job(&scheduler, cheap).unwrap();
    assert_eq!(scheduler.tick(), Some(first.job_id));
    for _ in 0..100 {
        if scheduler.current_spend() > Decimal::ZERO {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let spent = scheduler.current_spend();
    assert!(spent > Decimal::ZERO);

    let huge: JobSubmission = serde_json::from_value(serde_json::json!({
        "job_type": "storage",
        "estimated_cost": Decimal::MAX.to_string(),
    }))
    .unwrap();
    assert!(matches!(
        submit_job(&scheduler, huge),
        Err(SchedulerError::BudgetExceeded { .. })
    ));
    assert_eq!(scheduler.current_spend(), spent);
    assert_eq!(health(&scheduler).pending_jobs, 0);
}
