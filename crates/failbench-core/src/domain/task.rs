//! Task descriptors.

use serde::{Deserialize, Serialize};

/// A natural-language task designed to make the agent fail in a known way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskDescriptor {
    /// Stable identifier, e.g. `task_1`.
    pub id: String,

    /// Instruction handed verbatim to the agent.
    pub instruction: String,

    /// Why the task should make the agent fail.
    pub failure_reason: String,

    /// The mistake the agent is expected to make.
    pub expected_failure: String,
}

impl TaskDescriptor {
    pub fn new(id: &str, instruction: &str, failure_reason: &str, expected_failure: &str) -> Self {
        Self {
            id: id.to_string(),
            instruction: instruction.to_string(),
            failure_reason: failure_reason.to_string(),
            expected_failure: expected_failure.to_string(),
        }
    }
}
