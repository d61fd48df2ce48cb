//! Post-hoc evaluation of a finished task against live remote state.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::TaskCatalog;
use crate::checks::CheckContext;
use crate::domain::EvaluationResult;

/// Dispatches a task id to its check and turns the observations into a verdict.
///
/// Holds no per-call state: the outcome depends only on the task id, what the
/// remote services return, and the clock in the context.
#[derive(Clone)]
pub struct Evaluator {
    catalog: Arc<TaskCatalog>,
    ctx: CheckContext,
}

impl Evaluator {
    pub fn new(catalog: Arc<TaskCatalog>, ctx: CheckContext) -> Self {
        Self { catalog, ctx }
    }

    pub fn catalog(&self) -> &Arc<TaskCatalog> {
        &self.catalog
    }

    /// Evaluate `task_id`. The transcript is kept for the record only; the
    /// verdict comes from remote state. Unknown ids yield a zero-score result.
    pub async fn evaluate(&self, task_id: &str, transcript: &str) -> EvaluationResult {
        let Some(entry) = self.catalog.get(task_id) else {
            warn!(task_id = %task_id, "evaluation requested for unknown task");
            return EvaluationResult::not_found(task_id);
        };

        debug!(
            task_id = %task_id,
            check = entry.check.name(),
            transcript_len = transcript.len(),
            "running failure check"
        );
        let checks = entry.check.run(&self.ctx).await;
        EvaluationResult::from_checks(&entry.task, checks)
    }
}
