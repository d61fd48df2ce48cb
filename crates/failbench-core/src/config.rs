//! Agent and benchmark configuration from the environment.

use std::sync::Arc;

use google_query::GoogleConfig;

use crate::agent::messages::{McpServer, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::agent::{AgentRunner, CommandAgent, MessagesApiAgent};
use crate::domain::{BenchError, Result};

/// Which agent implementation to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentKind {
    #[default]
    Messages,
    Command,
}

impl std::str::FromStr for AgentKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "messages" => Ok(AgentKind::Messages),
            "command" => Ok(AgentKind::Command),
            other => Err(BenchError::Configuration(format!(
                "unknown agent kind '{other}' (expected 'messages' or 'command')"
            ))),
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub kind: AgentKind,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub mcp_url: Option<String>,
    pub mcp_token: Option<String>,
    pub command: Option<String>,
    /// 0 disables the timeout.
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            kind: AgentKind::Messages,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            mcp_url: None,
            mcp_token: None,
            command: None,
            timeout_secs: 0,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AgentConfig {
    /// Reads `FAILBENCH_AGENT`, `ANTHROPIC_API_KEY`, `FAILBENCH_AGENT_MODEL`,
    /// `ANTHROPIC_BASE_URL`, `FAILBENCH_MCP_URL`, `FAILBENCH_MCP_TOKEN`,
    /// `FAILBENCH_AGENT_COMMAND` and `FAILBENCH_AGENT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let kind = match non_empty_var("FAILBENCH_AGENT") {
            Some(v) => v.parse()?,
            None => AgentKind::default(),
        };
        let timeout_secs = match non_empty_var("FAILBENCH_AGENT_TIMEOUT_SECS") {
            Some(v) => v.trim().parse().map_err(|_| {
                BenchError::Configuration(format!(
                    "FAILBENCH_AGENT_TIMEOUT_SECS must be a whole number of seconds, got '{v}'"
                ))
            })?,
            None => 0,
        };

        Ok(Self {
            kind,
            api_key: non_empty_var("ANTHROPIC_API_KEY"),
            model: non_empty_var("FAILBENCH_AGENT_MODEL").unwrap_or(defaults.model),
            base_url: non_empty_var("ANTHROPIC_BASE_URL").unwrap_or(defaults.base_url),
            mcp_url: non_empty_var("FAILBENCH_MCP_URL"),
            mcp_token: non_empty_var("FAILBENCH_MCP_TOKEN"),
            command: non_empty_var("FAILBENCH_AGENT_COMMAND"),
            timeout_secs,
        })
    }

    pub fn with_kind(mut self, kind: AgentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Build the configured agent.
    pub fn build_agent(&self) -> Result<Arc<dyn AgentRunner>> {
        match self.kind {
            AgentKind::Messages => {
                let mut agent = MessagesApiAgent::new(self.api_key.clone(), self.model.clone())
                    .with_base_url(self.base_url.clone());
                if let Some(url) = &self.mcp_url {
                    agent = agent.with_mcp_server(McpServer {
                        name: "workspace".to_string(),
                        url: url.clone(),
                        authorization_token: self.mcp_token.clone(),
                    });
                }
                Ok(Arc::new(agent))
            }
            AgentKind::Command => {
                let line = self.command.as_deref().ok_or_else(|| {
                    BenchError::Configuration(
                        "FAILBENCH_AGENT_COMMAND is required for the command agent".to_string(),
                    )
                })?;
                let agent = CommandAgent::from_command_line(line)?.with_timeout(self.timeout_secs);
                Ok(Arc::new(agent))
            }
        }
    }
}

/// Everything a benchmark run needs.
#[derive(Debug, Clone, Default)]
pub struct BenchConfig {
    pub google: GoogleConfig,
    pub agent: AgentConfig,
}

impl BenchConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            google: GoogleConfig::from_env(),
            agent: AgentConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_kind_parse() {
        assert_eq!("messages".parse::<AgentKind>().unwrap(), AgentKind::Messages);
        assert_eq!("Command".parse::<AgentKind>().unwrap(), AgentKind::Command);
        assert!("shell".parse::<AgentKind>().is_err());
    }

    #[test]
    fn test_command_agent_requires_command() {
        let config = AgentConfig::default().with_kind(AgentKind::Command);
        let err = config.build_agent().err().unwrap();
        assert!(err.to_string().contains("FAILBENCH_AGENT_COMMAND"));
    }

    #[test]
    fn test_build_command_agent() {
        let agent = AgentConfig::default()
            .with_kind(AgentKind::Command)
            .with_command("my-agent --flag")
            .build_agent()
            .unwrap();
        assert_eq!(agent.name(), "my-agent");
    }

    #[test]
    fn test_messages_agent_builds_without_key() {
        let agent = AgentConfig::default().build_agent().unwrap();
        assert_eq!(agent.name(), "messages-api");
    }
}
