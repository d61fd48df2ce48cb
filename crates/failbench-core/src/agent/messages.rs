//! Agent backed by the Anthropic Messages API, with the email/calendar tools
//! exposed through a remote MCP server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AgentRunner, SYSTEM_PROMPT};
use crate::domain::{AgentError, TaskDescriptor};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MCP_BETA: &str = "mcp-client-2025-04-04";
const MAX_TOKENS: u32 = 4096;

/// Remote MCP server the model may call tools on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpServer {
    pub name: String,
    pub url: String,
    pub authorization_token: Option<String>,
}

pub struct MessagesApiAgent {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    mcp_server: Option<McpServer>,
}

impl MessagesApiAgent {
    /// A missing key is accepted here and reported when a task runs, so the
    /// batch still evaluates every task.
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            mcp_server: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_mcp_server(mut self, server: McpServer) -> Self {
        self.mcp_server = Some(server);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, task: &'a TaskDescriptor) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![RequestMessage {
                role: "user",
                content: &task.instruction,
            }],
            mcp_servers: self
                .mcp_server
                .iter()
                .map(|s| RequestMcpServer {
                    kind: "url",
                    url: &s.url,
                    name: &s.name,
                    authorization_token: s.authorization_token.as_deref(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<RequestMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    mcp_servers: Vec<RequestMcpServer<'a>>,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct RequestMcpServer<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    url: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_token: Option<&'a str>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Concatenate the text blocks of a response, skipping tool-use blocks.
fn transcript(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl AgentRunner for MessagesApiAgent {
    fn name(&self) -> &str {
        "messages-api"
    }

    async fn run(&self, task: &TaskDescriptor) -> Result<String, AgentError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AgentError::Configuration("ANTHROPIC_API_KEY is not set".to_string()))?;

        let mut request = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(task));
        if self.mcp_server.is_some() {
            request = request.header("anthropic-beta", MCP_BETA);
        }

        debug!(task_id = %task.id, model = %self.model, "calling Messages API");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        Ok(transcript(parsed))
    }
}
