//! Structured lifecycle events for benchmark runs.
//!
//! Every event carries an `event` field (`task.started`, `task.evaluated`,
//! `query.degraded`, `batch.finished`, ...) so JSON log output can be filtered
//! without parsing messages. Human-readable reports go to stdout separately.

use tracing::{info, warn};

/// Span tagging everything done for one task with its id.
///
/// Attach with `tracing::Instrument::instrument` so it survives `.await` points.
pub fn task_span(task_id: &str) -> tracing::Span {
    tracing::info_span!("failbench.task", task_id = %task_id)
}

pub fn emit_task_started(task_id: &str) {
    info!(event = "task.started", task_id = %task_id);
}

pub fn emit_agent_finished(task_id: &str, duration_ms: u64, ok: bool) {
    info!(
        event = "agent.finished",
        task_id = %task_id,
        duration_ms = duration_ms,
        ok = ok,
    );
}

pub fn emit_agent_error(task_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "agent.error", task_id = %task_id, error = %error);
}

pub fn emit_task_evaluated(task_id: &str, failure_detected: bool, score: f32) {
    info!(
        event = "task.evaluated",
        task_id = %task_id,
        failure_detected = failure_detected,
        score = score,
    );
}

/// A query failed in a way the check treats as "nothing found".
pub fn emit_query_degraded(check: &str, error: &dyn std::fmt::Display) {
    warn!(event = "query.degraded", check = %check, error = %error);
}

/// A query failed and the check recorded the error.
pub fn emit_check_error(check: &str, error: &dyn std::fmt::Display) {
    warn!(event = "check.error", check = %check, error = %error);
}

pub fn emit_task_failed(task_id: &str, error: &dyn std::fmt::Display) {
    tracing::error!(event = "task.failed", task_id = %task_id, error = %error);
}

pub fn emit_batch_finished(executed: usize, passed: usize, total: usize, interrupted: bool) {
    info!(
        event = "batch.finished",
        executed = executed,
        passed = passed,
        total = total,
        interrupted = interrupted,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_span_carries_name() {
        let span = task_span("task_1");
        let _entered = span.enter();
    }
}
