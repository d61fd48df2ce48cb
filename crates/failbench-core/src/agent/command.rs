//! Agent implemented by an external program.
//!
//! The configured command is run with the task instruction appended as its
//! last argument; stdout is the transcript.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{AgentRunner, SYSTEM_PROMPT};
use crate::domain::{AgentError, TaskDescriptor};

#[derive(Debug, Clone)]
pub struct CommandAgent {
    program: String,
    args: Vec<String>,
    /// 0 disables the timeout.
    timeout_secs: u64,
}

impl CommandAgent {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout_secs: 0,
        }
    }

    /// Split a command line with POSIX shell quoting rules.
    pub fn from_command_line(line: &str) -> Result<Self, AgentError> {
        let words = shlex::split(line).ok_or_else(|| {
            AgentError::Configuration(format!("agent command has unbalanced quoting: {line}"))
        })?;
        let mut parts = words.into_iter();
        let program = parts
            .next()
            .ok_or_else(|| AgentError::Configuration("agent command is empty".to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[async_trait]
impl AgentRunner for CommandAgent {
    fn name(&self) -> &str {
        &self.program
    }

    async fn run(&self, task: &TaskDescriptor) -> Result<String, AgentError> {
        debug!(program = %self.program, task_id = %task.id, "spawning agent command");
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(&task.instruction)
            .env("FAILBENCH_SYSTEM_PROMPT", SYSTEM_PROMPT)
            .env("FAILBENCH_TASK_ID", &task.id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = if self.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(self.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| AgentError::Timeout(self.timeout_secs))??
        } else {
            child.wait_with_output().await?
        };

        if !output.status.success() {
            return Err(AgentError::Process {
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn task() -> TaskDescriptor {
        TaskDescriptor::new("task_1", "hello agent", "r", "e")
    }

    #[tokio::test]
    async fn test_instruction_is_last_argument() {
        let agent = CommandAgent::new("echo", vec!["got:".to_string()]);
        let out = agent.run(&task()).await.unwrap();
        assert_eq!(out, "got: hello agent");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_process_error() {
        let agent = CommandAgent::new(
            "sh",
            vec!["-c".to_string(), "echo nope >&2; exit 3".to_string()],
        );
        match agent.run(&task()).await.unwrap_err() {
            AgentError::Process { exit_code, stderr } => {
                assert_eq!(exit_code, 3);
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let agent = CommandAgent::new("sleep", Vec::new()).with_timeout(1);
        let mut t = task();
        t.instruction = "5".to_string();
        let err = agent.run(&t).await.unwrap_err();
        assert!(matches!(err, AgentError::Timeout(1)));
    }

    #[test]
    fn test_empty_command_line_rejected() {
        assert!(CommandAgent::from_command_line("   ").is_err());
        let agent = CommandAgent::from_command_line("my-agent --fast").unwrap();
        assert_eq!(agent.program, "my-agent");
        assert_eq!(agent.args, vec!["--fast".to_string()]);
    }

    #[test]
    fn test_command_line_honours_quoting() {
        let agent = CommandAgent::from_command_line("my-agent --prompt 'two words'").unwrap();
        assert_eq!(agent.program, "my-agent");
        assert_eq!(agent.args, vec!["--prompt".to_string(), "two words".to_string()]);

        let err = CommandAgent::from_command_line("my-agent \"unterminated").unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }
}
