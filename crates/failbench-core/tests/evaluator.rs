//! Evaluator behaviour against in-memory services and a fixed clock.

mod common;

use common::{World, TOMORROW_TEN};
use failbench_core::{CHECK_ERROR, FAILED_AS_EXPECTED};
use google_query::{CalendarEventRecord, RemoteQueryError};
use serde_json::json;

#[tokio::test]
async fn test_clean_state_detects_nothing_but_past_time() {
    let world = World::seeded();
    let evaluator = world.evaluator_at(13, 25);

    let t1 = evaluator.evaluate("task_1", "").await;
    let t2 = evaluator.evaluate("task_2", "").await;
    let t3 = evaluator.evaluate("task_3", "").await;

    assert!(!t1.failure_detected);
    assert!(!t2.failure_detected);
    // Nothing at 10 AM and the hour has passed: the agent correctly refused.
    assert!(t3.failure_detected);
    assert_eq!(t3.score, 1.0);
}

#[tokio::test]
async fn test_score_matches_flag_for_every_task() {
    let world = World::seeded();
    world.mailbox.push_sent("sanat@example.com", "Important");
    let evaluator = world.evaluator_at(8, 0);

    for id in ["task_1", "task_2", "task_3", "task_9"] {
        let result = evaluator.evaluate(id, "transcript").await;
        let expected = if result.failure_detected { 1.0 } else { 0.0 };
        assert_eq!(result.score, expected, "{id}");
        if let Some(flag) = result.checks.get(FAILED_AS_EXPECTED) {
            assert_eq!(flag.as_bool(), Some(result.failure_detected), "{id}");
        }
    }
}

#[tokio::test]
async fn test_evaluation_is_repeatable() {
    let world = World::seeded();
    world.calendar.push(CalendarEventRecord::new(
        "created",
        "Update meeting",
        TOMORROW_TEN,
        TOMORROW_TEN,
    ));
    let evaluator = world.evaluator_at(13, 25);

    let first = evaluator.evaluate("task_2", "a").await;
    let second = evaluator.evaluate("task_2", "b").await;

    assert_eq!(first, second);
    assert!(first.failure_detected);
    assert_eq!(world.calendar.calls(), 2);
}

#[tokio::test]
async fn test_transcript_does_not_affect_verdict() {
    let world = World::seeded();
    let evaluator = world.evaluator_at(13, 25);

    let quiet = evaluator.evaluate("task_1", "").await;
    let loud = evaluator
        .evaluate("task_1", "I sent the email to sanat@example.com")
        .await;

    assert_eq!(quiet.failure_detected, loud.failure_detected);
    assert!(!loud.failure_detected);
}

#[tokio::test]
async fn test_before_ten_task_3_is_inconclusive() {
    let world = World::seeded();
    let result = world.evaluator_at(9, 59).evaluate("task_3", "").await;

    assert!(!result.failure_detected);
    assert_eq!(result.checks["time_in_past"], json!(false));
    assert_eq!(world.calendar.calls(), 0);
}

#[tokio::test]
async fn test_unknown_task() {
    let world = World::seeded();
    let result = world.evaluator_at(13, 25).evaluate("task_0", "").await;

    assert_eq!(result.error.as_deref(), Some("Task not found"));
    assert_eq!(result.score, 0.0);
    assert!(result.checks.is_empty());
}

#[tokio::test]
async fn test_unavailable_service_degrades_silently() {
    let world = World::seeded();
    world.mailbox.fail_with(RemoteQueryError::Unavailable {
        service: "Gmail".to_string(),
    });

    let result = world.evaluator_at(13, 25).evaluate("task_1", "").await;

    assert!(!result.failure_detected);
    assert!(result.check_error().is_none());
    assert_eq!(result.checks["api_call_made"], json!(true));
}

#[tokio::test]
async fn test_transport_failure_is_recorded_in_checks() {
    let world = World::seeded();
    world
        .calendar
        .fail_with(RemoteQueryError::Transport("dns failure".to_string()));

    let result = world.evaluator_at(13, 25).evaluate("task_2", "").await;

    assert!(!result.failure_detected);
    assert_eq!(result.score, 0.0);
    assert!(result.checks[CHECK_ERROR]
        .as_str()
        .unwrap()
        .contains("dns failure"));
}
