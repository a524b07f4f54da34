use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("API error: {0}")]
    Api(String),
}

/// One message in the wire-format conversation sent to the planner.
///
/// Tool plumbing follows the strict OpenAI chat-completions shape: an
/// assistant message that requested a tool carries a `tool_calls` array, and
/// the corresponding result is a `tool`-role message bound by `tool_call_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Normalized planner response: free text, structured tool calls, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: String,
}

#[async_trait]
pub trait Planner: Send + Sync {
    /// Send the full conversation plus the declared tool vocabulary and wait
    /// for the planner's next step.
    async fn generate(
        &self,
        messages: &[ChatMessage],
        tools: &[serde_json::Value],
    ) -> Result<PlannerReply, ProviderError>;

    fn name(&self) -> &str;
}
