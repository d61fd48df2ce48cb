//! Domain-level error taxonomy for failbench.

/// Errors produced while invoking the agent under test.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent not configured: {0}")]
    Configuration(String),

    #[error("agent request failed: {0}")]
    Http(String),

    #[error("agent API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("agent process exited with code {exit_code}: {stderr}")]
    Process { exit_code: i32, stderr: String },

    #[error("agent timed out after {0} seconds")]
    Timeout(u64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::Http(err.to_string())
    }
}

/// failbench domain errors.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("task {task_id} panicked: {message}")]
    TaskPanicked { task_id: String, message: String },

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for failbench domain operations.
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_error_display() {
        let err = BenchError::TaskNotFound("task_9".to_string());
        assert!(err.to_string().contains("task_9"));

        let err = BenchError::TaskPanicked {
            task_id: "task_1".to_string(),
            message: "boom".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("task_1"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_agent_error_wraps() {
        let err: BenchError = AgentError::Timeout(30).into();
        assert!(err.to_string().contains("30 seconds"));
    }
}
