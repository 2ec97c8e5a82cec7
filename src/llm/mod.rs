//! LLM client abstraction and message types.
//!
//! All providers speak through one capability: given an ordered message
//! history and the available tool definitions, produce the next assistant
//! message. The assistant message may carry text, tool invocation requests,
//! or both.

mod anthropic;
mod azure;
mod openai;

pub use anthropic::AnthropicClient;
pub use azure::AzureOpenAiClient;
pub use openai::OpenAiClient;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{LlmConfig, LlmProvider};

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Tool result, answering a prior tool call
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier, unique within one assistant turn
    pub id: String,

    /// The requested function
    pub function: FunctionCall,
}

/// Name and raw JSON arguments of a requested tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,

    /// Arguments as the raw JSON string the provider sent
    pub arguments: String,
}

/// A single conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,

    /// Text content; absent for assistant messages that only carry tool calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool invocations requested by an assistant message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// For tool messages, the call identifier this result answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(payload.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    /// Whether this assistant message requests at least one tool invocation.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}

/// Definition of a tool advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,

    /// JSON schema of the tool's arguments
    pub parameters: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),
}

/// One capability: produce the next assistant message for a history.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDef],
    ) -> Result<ChatMessage, LlmError>;
}

/// Build the client for the configured backend.
///
/// Selection happens exactly once, here; the rest of the crate only sees
/// `Arc<dyn LlmClient>`.
pub fn build_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::OpenAi => Arc::new(OpenAiClient::new(config)?),
        LlmProvider::Azure => Arc::new(AzureOpenAiClient::new(config)?),
        LlmProvider::Anthropic => Arc::new(AnthropicClient::new(config)?),
    };
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), "\"tool\"");
    }

    #[test]
    fn message_skips_absent_fields() {
        let msg = ChatMessage::user("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");
        assert!(json.get("tool_calls").is_none());
        assert!(json.get("tool_call_id").is_none());
    }

    #[test]
    fn has_tool_calls_requires_nonempty_list() {
        let mut msg = ChatMessage::assistant("done");
        assert!(!msg.has_tool_calls());

        msg.tool_calls = Some(vec![]);
        assert!(!msg.has_tool_calls());

        msg.tool_calls = Some(vec![ToolCall {
            id: "call_1".to_string(),
            function: FunctionCall {
                name: "get_weather".to_string(),
                arguments: "{\"city\":\"Paris\"}".to_string(),
            },
        }]);
        assert!(msg.has_tool_calls());
    }

    #[test]
    fn tool_result_carries_call_id() {
        let msg = ChatMessage::tool_result("call_7", "{\"temp\":21}");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
        assert_eq!(msg.content.as_deref(), Some("{\"temp\":21}"));
    }
}
