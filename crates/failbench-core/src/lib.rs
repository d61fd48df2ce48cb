//! failbench core: failing-task catalog, failure checks, agent runners and
//! the batch runner that ties them together.
//!
//! Flow per task: the agent receives the instruction, acts on the live mail
//! and calendar services through its own tools, and the task's
//! [`FailureCheck`] then queries those services to decide whether the agent
//! made the mistake the task was designed to provoke.

pub mod agent;
pub mod batch;
pub mod catalog;
pub mod checks;
pub mod clock;
pub mod config;
pub mod domain;
pub mod evaluator;
pub mod metrics;
pub mod obs;
pub mod reporting;
pub mod telemetry;

pub use agent::{AgentRunner, CommandAgent, MessagesApiAgent, SYSTEM_PROMPT};
pub use batch::{BatchRunner, BenchmarkSummary, Interrupt, TaskRunRecord};
pub use catalog::{CatalogEntry, TaskCatalog};
pub use checks::{
    CheckContext, DoubleBookingCheck, FailureCheck, PastTimeCheck, RecipientValidityCheck,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AgentConfig, AgentKind, BenchConfig};
pub use domain::{
    AgentError, BenchError, Checks, EvaluationResult, Result, TaskDescriptor, CHECK_ERROR,
    FAILED_AS_EXPECTED,
};
pub use evaluator::Evaluator;
pub use metrics::METRICS;
pub use obs::{
    emit_agent_error, emit_agent_finished, emit_batch_finished, emit_check_error,
    emit_query_degraded, emit_task_evaluated, emit_task_failed, emit_task_started, task_span,
};
pub use reporting::{write_results_json, ResultsArtifact};
pub use telemetry::init_tracing;
