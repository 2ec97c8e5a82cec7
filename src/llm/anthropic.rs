//! Anthropic Messages API client.
//!
//! The Messages API uses content blocks (`tool_use` / `tool_result`) and a
//! top-level `system` field, so conversion to and from the flat message
//! model happens here. Tool results are folded into user messages because
//! the API requires user/assistant roles to alternate.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::LlmConfig;

use super::{ChatMessage, FunctionCall, LlmError, Role, ToolCall, ToolDef};

const BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| BASE_URL.to_string()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait::async_trait]
impl super::LlmClient for AnthropicClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDef],
    ) -> Result<ChatMessage, LlmError> {
        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));
        let body = build_request_body(&self.model, messages, tools);

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(format!("{}", e)))?;

        Ok(to_chat_message(parsed))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion to the Messages API shape
// ─────────────────────────────────────────────────────────────────────────────

fn build_request_body(model: &str, messages: &[ChatMessage], tools: &[ToolDef]) -> Value {
    let mut system: Option<String> = None;
    let mut wire_messages: Vec<Value> = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => {
                system = msg.content.clone();
            }
            Role::User => {
                wire_messages.push(json!({
                    "role": "user",
                    "content": msg.content.clone().unwrap_or_default(),
                }));
            }
            Role::Assistant => {
                let mut blocks: Vec<Value> = Vec::new();
                if let Some(text) = msg.content.as_deref() {
                    if !text.is_empty() {
                        blocks.push(json!({"type": "text", "text": text}));
                    }
                }
                for call in msg.tool_calls.iter().flatten() {
                    let input: Value =
                        serde_json::from_str(&call.function.arguments).unwrap_or_else(|_| json!({}));
                    blocks.push(json!({
                        "type": "tool_use",
                        "id": call.id,
                        "name": call.function.name,
                        "input": input,
                    }));
                }
                wire_messages.push(json!({"role": "assistant", "content": blocks}));
            }
            Role::Tool => {
                let block = json!({
                    "type": "tool_result",
                    "tool_use_id": msg.tool_call_id.clone().unwrap_or_default(),
                    "content": msg.content.clone().unwrap_or_default(),
                });
                // Roles must alternate: fold consecutive tool results into
                // the previous user message when it is already a block list.
                if let Some(Value::Array(results)) = wire_messages
                    .last_mut()
                    .filter(|last| last["role"] == "user")
                    .map(|last| &mut last["content"])
                {
                    results.push(block);
                } else {
                    wire_messages.push(json!({"role": "user", "content": [block]}));
                }
            }
        }
    }

    let mut body = json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "messages": wire_messages,
    });

    if let Some(system) = system {
        body["system"] = Value::String(system);
    }

    if !tools.is_empty() {
        let wire_tools: Vec<Value> = tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "input_schema": tool.parameters,
                })
            })
            .collect();
        body["tools"] = Value::Array(wire_tools);
    }

    body
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion from the Messages API shape
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

fn to_chat_message(response: MessagesResponse) -> ChatMessage {
    let mut text_parts: Vec<String> = Vec::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    for block in response.content {
        match block {
            ContentBlock::Text { text } => text_parts.push(text),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                id,
                function: FunctionCall {
                    name,
                    arguments: input.to_string(),
                },
            }),
            ContentBlock::Other => {}
        }
    }

    ChatMessage {
        role: Role::Assistant,
        content: if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join("\n"))
        },
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
        tool_call_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_call(id: &str, name: &str, args: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: args.to_string(),
            },
        }
    }

    #[test]
    fn system_message_moves_to_top_level_field() {
        let messages = vec![ChatMessage::system("be helpful"), ChatMessage::user("hi")];
        let body = build_request_body("claude-3-5-haiku-latest", &messages, &[]);

        assert_eq!(body["system"], "be helpful");
        let wire = body["messages"].as_array().unwrap();
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0]["role"], "user");
    }

    #[test]
    fn assistant_tool_calls_become_tool_use_blocks() {
        let messages = vec![ChatMessage {
            role: Role::Assistant,
            content: Some("checking".to_string()),
            tool_calls: Some(vec![tool_call("call_1", "get_weather", "{\"city\":\"Rome\"}")]),
            tool_call_id: None,
        }];
        let body = build_request_body("claude-3-5-haiku-latest", &messages, &[]);
        let blocks = body["messages"][0]["content"].as_array().unwrap();

        assert_eq!(blocks[0]["type"], "text");
        assert_eq!(blocks[1]["type"], "tool_use");
        assert_eq!(blocks[1]["name"], "get_weather");
        assert_eq!(blocks[1]["input"]["city"], "Rome");
    }

    #[test]
    fn consecutive_tool_results_fold_into_one_user_message() {
        let messages = vec![
            ChatMessage {
                role: Role::Assistant,
                content: None,
                tool_calls: Some(vec![
                    tool_call("call_1", "get_weather", "{\"city\":\"Rome\"}"),
                    tool_call("call_2", "get_forecast", "{\"city\":\"Rome\"}"),
                ]),
                tool_call_id: None,
            },
            ChatMessage::tool_result("call_1", "{\"temp\":20}"),
            ChatMessage::tool_result("call_2", "{\"list\":[]}"),
        ];
        let body = build_request_body("claude-3-5-haiku-latest", &messages, &[]);
        let wire = body["messages"].as_array().unwrap();

        assert_eq!(wire.len(), 2);
        let results = wire[1]["content"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["tool_use_id"], "call_1");
        assert_eq!(results[1]["tool_use_id"], "call_2");
    }

    #[test]
    fn tools_serialize_with_input_schema() {
        let tools = vec![ToolDef {
            name: "get_air_pollution".to_string(),
            description: "Air quality by coordinates".to_string(),
            parameters: json!({"type": "object"}),
        }];
        let body = build_request_body("claude-3-5-haiku-latest", &[ChatMessage::user("hi")], &tools);
        assert_eq!(body["tools"][0]["name"], "get_air_pollution");
        assert!(body["tools"][0]["input_schema"].is_object());
    }

    #[test]
    fn response_tool_use_parses_into_tool_calls() {
        let raw = json!({
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "Let me look that up."},
                {"type": "tool_use", "id": "toolu_1", "name": "get_weather",
                 "input": {"city": "Kyiv"}}
            ],
            "stop_reason": "tool_use"
        });
        let parsed: MessagesResponse = serde_json::from_value(raw).unwrap();
        let msg = to_chat_message(parsed);

        assert_eq!(msg.content.as_deref(), Some("Let me look that up."));
        let calls = msg.tool_calls.unwrap();
        assert_eq!(calls[0].id, "toolu_1");
        let args: Value = serde_json::from_str(&calls[0].function.arguments).unwrap();
        assert_eq!(args["city"], "Kyiv");
    }

    #[test]
    fn response_without_tool_use_is_plain_text() {
        let raw = json!({
            "content": [{"type": "text", "text": "Clear skies."}],
            "stop_reason": "end_turn"
        });
        let parsed: MessagesResponse = serde_json::from_value(raw).unwrap();
        let msg = to_chat_message(parsed);
        assert_eq!(msg.content.as_deref(), Some("Clear skies."));
        assert!(msg.tool_calls.is_none());
    }
}
