//! Tests for event listeners

use chrono::Utc;
use docflow_scheduler::core::{
    InMemoryEventLog, Job, JobEvent, JobEventListener, JobStatus, JobType, Priority,
};
use rust_decimal::Decimal;
use uuid::Uuid;

fn make_job(job_type: JobType) -> Job {
    Job {
        id: Uuid::new_v4(),
        job_type,
        priority: Priority::Medium,
        payload: serde_json::Value::Null,
        estimated_cost: Decimal::ONE,
        actual_cost: None,
        retries: 0,
        max_retries: 3,
        timeout_ms: 1_000,
        status: JobStatus::Pending,
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
        error: None,
    }
}

#[test]
fn test_in_memory_event_log() {
    let log = InMemoryEventLog::new(10);
    let job = make_job(JobType::Ocr);

    log.on_event(&JobEvent::Added { job: job.clone() });
    log.on_event(&JobEvent::Started { job: job.clone() });

    let events = log.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].job_id(), job.id);
    assert_eq!(log.actions_for(&job.id), vec!["added", "started"]);
}

#[test]
fn test_event_log_overflow() {
    let log = InMemoryEventLog::new(2);
    let first = make_job(JobType::Ocr);
    let second = make_job(JobType::Storage);
    let third = make_job(JobType::Compress);

    log.on_event(&JobEvent::Added { job: first.clone() });
    log.on_event(&JobEvent::Added { job: second.clone() });
    log.on_event(&JobEvent::Added { job: third.clone() });

    let events = log.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].job_id(), second.id); // First one popped
    assert_eq!(events[1].job_id(), third.id);
    assert!(log.actions_for(&first.id).is_empty());
}

#[test]
fn test_event_serialization_tag() {
    let job = make_job(JobType::Transform);
    let event = JobEvent::Failed {
        job,
        error: "timed out after 10ms".into(),
    };

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "failed");
    assert_eq!(value["job"]["job_type"], "transform");
    assert_eq!(value["error"], "timed out after 10ms");
    assert_eq!(event.action(), "failed");
}
