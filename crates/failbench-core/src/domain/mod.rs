//! Domain models for failbench.
//!
//! - `TaskDescriptor`: immutable description of a failing task
//! - `EvaluationResult`: per-task verdict and the observations behind it

pub mod error;
pub mod eval;
pub mod task;

pub use error::{AgentError, BenchError, Result};
pub use eval::{Checks, EvaluationResult, CHECK_ERROR, FAILED_AS_EXPECTED};
pub use task::TaskDescriptor;
