//! Sequential task execution: run the agent, evaluate, report.

use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::Instrument;

use crate::agent::AgentRunner;
use crate::domain::{BenchError, EvaluationResult, TaskDescriptor};
use crate::evaluator::Evaluator;
use crate::metrics::METRICS;
use crate::obs;
use crate::reporting;

/// Number of transcript characters kept in a run record.
pub const PREVIEW_CHARS: usize = 150;

/// Outcome of one executed task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRunRecord {
    pub task_id: String,
    pub instruction: String,
    pub failure_reason: String,
    pub agent_response_preview: String,
    pub validation: EvaluationResult,
    pub reward_score: f32,
}

impl TaskRunRecord {
    pub fn new(task: &TaskDescriptor, transcript: &str, validation: EvaluationResult) -> Self {
        Self {
            task_id: task.id.clone(),
            instruction: task.instruction.clone(),
            failure_reason: task.failure_reason.clone(),
            agent_response_preview: transcript.chars().take(PREVIEW_CHARS).collect(),
            reward_score: validation.score,
            validation,
        }
    }
}

/// Aggregate over the executed tasks of a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkSummary {
    pub total_tasks: usize,
    pub executed: usize,
    pub passed: usize,
    pub failed: usize,
    pub interrupted: bool,
    pub runs: Vec<TaskRunRecord>,
}

impl BenchmarkSummary {
    pub fn from_runs(total_tasks: usize, runs: Vec<TaskRunRecord>, interrupted: bool) -> Self {
        let passed = runs.iter().filter(|r| r.validation.failure_detected).count();
        Self {
            total_tasks,
            executed: runs.len(),
            passed,
            failed: runs.len() - passed,
            interrupted,
            runs,
        }
    }

    /// At least one task ran and every executed task failed as designed.
    pub fn all_passed(&self) -> bool {
        self.executed > 0 && self.passed == self.executed
    }
}

// ---------------------------------------------------------------------------
// Interrupt
// ---------------------------------------------------------------------------

/// Cancellation signal, observed only between tasks.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// A signal fired by sending `true` on the returned sender.
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, interrupt) = Self::channel();
        interrupt
    }

    /// Fires on the first Ctrl-C. Must be called inside a Tokio runtime.
    pub fn ctrl_c() -> Self {
        let (tx, interrupt) = Self::channel();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(true);
            }
        });
        interrupt
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}

// ---------------------------------------------------------------------------
// BatchRunner
// ---------------------------------------------------------------------------

/// Runs catalog tasks one at a time and writes human-readable reports to `out`.
pub struct BatchRunner<W: Write + Send = std::io::Stdout> {
    agent: Arc<dyn AgentRunner>,
    evaluator: Evaluator,
    out: W,
}

impl BatchRunner<std::io::Stdout> {
    pub fn new(agent: Arc<dyn AgentRunner>, evaluator: Evaluator) -> Self {
        Self::with_output(agent, evaluator, std::io::stdout())
    }
}

impl<W: Write + Send> BatchRunner<W> {
    pub fn with_output(agent: Arc<dyn AgentRunner>, evaluator: Evaluator, out: W) -> Self {
        Self {
            agent,
            evaluator,
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn print(&mut self, text: &str) {
        // A closed stdout must not abort the run.
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    /// Run one task end to end. `position` is its 1-based place in the catalog.
    ///
    /// Agent errors do not propagate: the transcript becomes `Error: <message>`
    /// and evaluation proceeds against whatever state the agent left behind.
    pub async fn run_task(&mut self, position: usize, task: &TaskDescriptor) -> TaskRunRecord {
        let span = obs::task_span(&task.id);
        async {
            obs::emit_task_started(&task.id);
            self.print(&reporting::render_task_header(position, task));

            let started = Instant::now();
            let agent_result = self.agent.run(task).await;
            let duration_ms = started.elapsed().as_millis() as u64;
            obs::emit_agent_finished(&task.id, duration_ms, agent_result.is_ok());

            let transcript = match agent_result {
                Ok(transcript) => transcript,
                Err(e) => {
                    obs::emit_agent_error(&task.id, &e);
                    METRICS.inc_agent_errors();
                    format!("Error: {e}")
                }
            };
            self.print(&reporting::render_agent_response(&transcript));

            let validation = self.evaluator.evaluate(&task.id, &transcript).await;
            obs::emit_task_evaluated(&task.id, validation.failure_detected, validation.score);
            METRICS.inc_tasks_executed();
            if validation.failure_detected {
                METRICS.inc_failures_detected();
            }
            self.print(&reporting::render_validation_report(&validation));

            TaskRunRecord::new(task, &transcript, validation)
        }
        .instrument(span)
        .await
    }

    /// Run the task with `task_id`, or print a notice and return `None` if the catalog lacks it.
    pub async fn run_task_by_id(&mut self, task_id: &str) -> Option<TaskRunRecord> {
        let catalog = Arc::clone(self.evaluator.catalog());
        let found = catalog
            .tasks()
            .enumerate()
            .find(|(_, t)| t.id == task_id);
        match found {
            Some((index, task)) => Some(self.run_task(index + 1, task).await),
            None => {
                self.print(&format!("Task '{}' not found\n", task_id));
                None
            }
        }
    }

    /// Run every catalog task in order and print the summary.
    ///
    /// An interrupt lets the in-flight task finish and be scored, then stops
    /// before the next one. A task that panics is reported and skipped.
    pub async fn run_all(&mut self, interrupt: &Interrupt) -> BenchmarkSummary {
        let catalog = Arc::clone(self.evaluator.catalog());
        self.print(&reporting::render_batch_banner());

        let mut runs = Vec::new();
        let mut interrupted = false;

        for (index, task) in catalog.tasks().enumerate() {
            if interrupt.is_triggered() {
                interrupted = true;
                break;
            }

            match AssertUnwindSafe(self.run_task(index + 1, task))
                .catch_unwind()
                .await
            {
                Ok(record) => runs.push(record),
                Err(payload) => {
                    let err = BenchError::TaskPanicked {
                        task_id: task.id.clone(),
                        message: panic_message(payload.as_ref()),
                    };
                    obs::emit_task_failed(&task.id, &err);
                    self.print(&format!("Error running task: {err}\n"));
                }
            }
        }

        if interrupted {
            self.print("\n\nInterrupted by user. Stopping task execution.\n");
        }

        let summary = BenchmarkSummary::from_runs(catalog.len(), runs, interrupted);
        self.print(&reporting::render_summary(&summary));
        obs::emit_batch_finished(
            summary.executed,
            summary.passed,
            summary.total_tasks,
            summary.interrupted,
        );
        METRICS.flush();
        summary
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(detected: bool) -> EvaluationResult {
        let mut v = EvaluationResult::not_found("task_1");
        v.error = None;
        v.failure_detected = detected;
        v.score = if detected { 1.0 } else { 0.0 };
        v
    }

    #[test]
    fn test_preview_is_truncated_on_char_boundary() {
        let task = TaskDescriptor::new("task_1", "i", "r", "e");
        let transcript = "é".repeat(200);
        let record = TaskRunRecord::new(&task, &transcript, validation(true));
        assert_eq!(record.agent_response_preview.chars().count(), PREVIEW_CHARS);
        assert_eq!(record.reward_score, 1.0);
    }

    #[test]
    fn test_summary_counts() {
        let task = TaskDescriptor::new("task_1", "i", "r", "e");
        let runs = vec![
            TaskRunRecord::new(&task, "", validation(true)),
            TaskRunRecord::new(&task, "", validation(false)),
        ];
        let summary = BenchmarkSummary::from_runs(3, runs, false);
        assert_eq!(summary.executed, 2);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_passed());
        assert!(!BenchmarkSummary::from_runs(3, Vec::new(), false).all_passed());
    }

    #[test]
    fn test_interrupt_channel() {
        let (tx, interrupt) = Interrupt::channel();
        let observer = interrupt.clone();
        assert!(!interrupt.is_triggered());
        tx.send(true).unwrap();
        assert!(interrupt.is_triggered());
        assert!(observer.is_triggered());
    }

    #[test]
    fn test_never_interrupt_stays_clear() {
        let interrupt = Interrupt::never();
        assert!(!interrupt.is_triggered());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
