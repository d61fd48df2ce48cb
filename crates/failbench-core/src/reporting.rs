//! Console reports and the JSON results artifact.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::batch::{BenchmarkSummary, TaskRunRecord};
use crate::domain::{EvaluationResult, TaskDescriptor, FAILED_AS_EXPECTED};

const RULE_WIDTH: usize = 70;
const TABLE_WIDTH: usize = 55;

fn rule(ch: char, width: usize) -> String {
    std::iter::repeat(ch).take(width).collect()
}

fn check_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Banner printed before the agent runs. `position` is 1-based.
pub fn render_task_header(position: usize, task: &TaskDescriptor) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule('=', RULE_WIDTH));
    let _ = writeln!(out, "TASK {}: {}", position, task.id);
    let _ = writeln!(out, "{}", rule('=', RULE_WIDTH));
    let _ = writeln!(out, "Instruction: {}", task.instruction);
    let _ = writeln!(out, "Why it should fail: {}", task.failure_reason);
    let _ = writeln!(out, "Expected failure: {}", task.expected_failure);
    let _ = writeln!(out, "{}", rule('-', RULE_WIDTH));
    out
}

pub fn render_agent_response(transcript: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Agent Response:");
    let _ = writeln!(out, "{}", rule('-', RULE_WIDTH));
    if !transcript.is_empty() {
        let _ = writeln!(out, "{}", transcript);
    }
    let _ = writeln!(out, "{}", rule('-', RULE_WIDTH));
    out
}

/// Verdict block for one task. `failed_as_expected` is summarised by the
/// verdict line and not repeated among the checks.
pub fn render_validation_report(result: &EvaluationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule('=', RULE_WIDTH));
    let _ = writeln!(out, "VALIDATION REPORT");
    let _ = writeln!(out, "{}", rule('=', RULE_WIDTH));
    let _ = writeln!(
        out,
        "Failure Detected: {}",
        if result.failure_detected { "✓ YES" } else { "✗ NO" }
    );
    let _ = writeln!(out, "Score: {:.1}", result.score);

    if let Some(error) = &result.error {
        let _ = writeln!(out, "Error: {}", error);
    }

    if !result.checks.is_empty() {
        let _ = writeln!(out, "\nChecks Performed:");
        for (name, value) in &result.checks {
            if name != FAILED_AS_EXPECTED {
                let _ = writeln!(out, "  • {}: {}", name, check_value(value));
            }
        }
    }

    if result.failure_detected {
        let _ = writeln!(out, "\n✓ RESULT: Task FAILED AS EXPECTED");
        let _ = writeln!(out, "  Score: 1 (PASS - Benchmark correctly detected failure)");
    } else {
        let _ = writeln!(out, "\n✗ RESULT: Task SUCCEEDED when it should have FAILED");
        let _ = writeln!(out, "  Score: 0 (FAIL - Benchmark did not catch the error)");
    }
    let _ = writeln!(out, "{}", rule('=', RULE_WIDTH));
    out
}

pub fn render_batch_banner() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule('=', RULE_WIDTH));
    let _ = writeln!(out, "FAILING TASK BENCHMARK - REWARD EVALUATION");
    let _ = writeln!(out, "Testing if LLM tasks fail as expected");
    let _ = writeln!(out, "{}", rule('=', RULE_WIDTH));
    out
}

/// Totals, verdict line, and the per-task table.
pub fn render_summary(summary: &BenchmarkSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule('=', RULE_WIDTH));
    let _ = writeln!(out, "BENCHMARK SUMMARY");
    let _ = writeln!(out, "{}", rule('=', RULE_WIDTH));
    let _ = writeln!(out, "Total tasks: {}", summary.total_tasks);
    let _ = writeln!(out, "Tasks executed: {}", summary.executed);

    if summary.executed > 0 {
        let _ = writeln!(out, "\nResults:");
        let _ = writeln!(
            out,
            "  Tasks that failed as expected (PASS): {}/{}",
            summary.passed, summary.executed
        );
        let _ = writeln!(
            out,
            "  Tasks that succeeded wrongly (FAIL): {}/{}",
            summary.failed, summary.executed
        );
        if summary.all_passed() {
            let _ = writeln!(
                out,
                "\n✓ ALL TESTS PASSED - Benchmark correctly detected all failures!"
            );
        } else {
            let _ = writeln!(
                out,
                "\n⚠ Some tests failed - Benchmark missed {} failure case(s)",
                summary.failed
            );
        }
    }

    let _ = writeln!(out, "\n{:<10} {:<35} {:<10}", "Task", "Result", "Score");
    let _ = writeln!(out, "{}", rule('-', TABLE_WIDTH));
    for run in &summary.runs {
        let _ = writeln!(out, "{}", render_table_row(run));
    }
    let _ = writeln!(out, "{}", rule('=', RULE_WIDTH));
    out
}

fn render_table_row(run: &TaskRunRecord) -> String {
    let status = if run.validation.failure_detected {
        "✓ Failed as expected"
    } else {
        "✗ Succeeded wrongly"
    };
    let score = if run.reward_score == 1.0 {
        "1 (PASS)"
    } else {
        "0 (FAIL)"
    };
    format!("{:<10} {:<35} {:<10}", run.task_id, status, score)
        .trim_end()
        .to_string()
}

/// On-disk results artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultsArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub summary: BenchmarkSummary,
}

impl ResultsArtifact {
    pub fn new(summary: BenchmarkSummary) -> Self {
        Self {
            schema_version: "1".to_string(),
            generated_at: Utc::now(),
            summary,
        }
    }
}

/// Write the results artifact as pretty JSON, creating parent directories.
pub fn write_results_json(path: &Path, artifact: &ResultsArtifact) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
    }
    let content = serde_json::to_string_pretty(artifact).context("serialize results")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}
