//! Evaluation results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::task::TaskDescriptor;

/// Named observations recorded by a failure check.
pub type Checks = BTreeMap<String, serde_json::Value>;

/// Key every check sets to say whether the designed failure was observed.
pub const FAILED_AS_EXPECTED: &str = "failed_as_expected";

/// Key a check sets when it could not query remote state.
pub const CHECK_ERROR: &str = "error";

/// Outcome of evaluating one task.
///
/// # Invariants
///
/// `score` is `1.0` exactly when `failure_detected` is true, and `0.0`
/// otherwise. Both constructors enforce this; there is no partial credit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    pub task_id: String,
    pub task_instruction: String,
    pub expected_failure: String,
    pub failure_reason: String,
    pub checks: Checks,
    pub failure_detected: bool,
    pub score: f32,
    /// Set when evaluation could not run at all (e.g. unknown task).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    /// Build a result from the observations of the task's check.
    pub fn from_checks(task: &TaskDescriptor, checks: Checks) -> Self {
        let failure_detected = checks
            .get(FAILED_AS_EXPECTED)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        Self {
            task_id: task.id.clone(),
            task_instruction: task.instruction.clone(),
            expected_failure: task.expected_failure.clone(),
            failure_reason: task.failure_reason.clone(),
            checks,
            failure_detected,
            score: if failure_detected { 1.0 } else { 0.0 },
            error: None,
        }
    }

    /// Result for a task id absent from the catalog.
    pub fn not_found(task_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            task_instruction: String::new(),
            expected_failure: String::new(),
            failure_reason: String::new(),
            checks: Checks::new(),
            failure_detected: false,
            score: 0.0,
            error: Some("Task not found".to_string()),
        }
    }

    /// Whether the check itself hit an unrecoverable query error.
    pub fn check_error(&self) -> Option<&str> {
        self.checks.get(CHECK_ERROR).and_then(serde_json::Value::as_str)
    }
}
