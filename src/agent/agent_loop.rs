//! Core agent loop implementation.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::llm::{self, ChatMessage, LlmClient, LlmError, Role};
use crate::memory::MemoryWindow;
use crate::tools::ToolRegistry;
use crate::weather_api::{IpLocator, OwmClient};

use super::prompt::build_system_prompt;

/// Errors that terminate a turn.
///
/// Tool execution failures are not listed here: they are converted to
/// error-shaped tool results and fed back to the model instead.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model invocation failed: {0}")]
    Model(#[from] LlmError),

    #[error("model requested unknown tool: {0}")]
    UnknownTool(String),

    #[error("no final answer after {0} tool rounds")]
    ToolRoundsExceeded(usize),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("turn cancelled")]
    Cancelled,
}

/// The conversational weather agent.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    memory: MemoryWindow,
    max_tool_rounds: usize,
}

impl Agent {
    /// Create an agent with the given configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let llm = llm::build_client(&config.llm)?;
        let owm = Arc::new(OwmClient::new(&config.weather)?);
        let locator = Arc::new(IpLocator::new(&config.weather)?);
        let tools = ToolRegistry::with_weather_tools(owm, locator);

        Ok(Self::from_parts(
            llm,
            tools,
            config.memory_window,
            config.max_tool_rounds,
        ))
    }

    /// Assemble an agent from pre-built parts (useful for testing and for
    /// callers that bring their own tools or model client).
    pub fn from_parts(
        llm: Arc<dyn LlmClient>,
        tools: ToolRegistry,
        memory_window: usize,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            llm,
            tools,
            memory: MemoryWindow::new(memory_window),
            max_tool_rounds,
        }
    }

    /// Drive one full turn for a user message and return the final answer.
    ///
    /// The history is updated in place: the user message, any tool traffic
    /// and the final assistant message are appended, and older exchanges
    /// beyond the memory window are dropped.
    pub async fn chat(
        &self,
        history: &mut Vec<ChatMessage>,
        input: &str,
    ) -> Result<String, AgentError> {
        self.chat_with_cancellation(history, input, &CancellationToken::new())
            .await
    }

    /// Like [`Agent::chat`], checking the token before every model call.
    pub async fn chat_with_cancellation(
        &self,
        history: &mut Vec<ChatMessage>,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        // First turn of a conversation gets the system prompt.
        if !history.iter().any(|m| m.role == Role::System) {
            history.insert(0, ChatMessage::system(build_system_prompt(&self.tools)));
        }

        history.push(ChatMessage::user(input));
        *history = self.memory.trim(history);

        let tool_schemas = self.tools.schemas();

        for round in 0..self.max_tool_rounds {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            tracing::debug!("Agent round {}", round + 1);
            let response = self.llm.chat(history, &tool_schemas).await?;

            if response.has_tool_calls() {
                let calls = response.tool_calls.clone().unwrap_or_default();

                // Fail the turn before running anything if the model asked
                // for a tool we do not have.
                if let Some(missing) = calls
                    .iter()
                    .find(|call| !self.tools.contains(&call.function.name))
                {
                    return Err(AgentError::UnknownTool(missing.function.name.clone()));
                }

                history.push(response);

                // Resolve every call in request order.
                for call in &calls {
                    let args: Value = serde_json::from_str(&call.function.arguments)
                        .unwrap_or(Value::Null);

                    tracing::debug!(
                        "Dispatching tool {} with args {}",
                        call.function.name,
                        call.function.arguments
                    );
                    let result = self.tools.dispatch(&call.function.name, args).await;
                    history.push(ChatMessage::tool_result(&call.id, result.to_string()));
                }

                continue;
            }

            // No tool calls - this is the final response.
            let answer = response.content.clone().ok_or(AgentError::EmptyResponse)?;
            history.push(response);
            return Ok(answer);
        }

        Err(AgentError::ToolRoundsExceeded(self.max_tool_rounds))
    }
}
