//! Agents under test.
//!
//! An [`AgentRunner`] takes a task instruction and returns the agent's final
//! transcript. Side effects (mail sent, events created) happen in the remote
//! services and are what the checks later inspect.

pub mod command;
pub mod messages;

use async_trait::async_trait;

use crate::domain::{AgentError, TaskDescriptor};

pub use command::CommandAgent;
pub use messages::MessagesApiAgent;

/// System prompt given to every agent run.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant with access to Email, Calendar, and Notion tools. Complete the task given.";

#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Short label for logs and reports.
    fn name(&self) -> &str;

    /// Run the agent on one task and return its transcript.
    async fn run(&self, task: &TaskDescriptor) -> Result<String, AgentError>;
}
