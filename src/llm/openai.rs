//! OpenAI chat-completions client.
//!
//! Also used as the wire format for OpenAI-compatible gateways (via
//! `LLM_BASE_URL`) and for Azure OpenAI deployments (`azure.rs`), which
//! accept the same request body against a different URL/auth scheme.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::LlmConfig;

use super::{ChatMessage, FunctionCall, LlmError, Role, ToolCall, ToolDef};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait::async_trait]
impl super::LlmClient for OpenAiClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDef],
    ) -> Result<ChatMessage, LlmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = build_request_body(&self.model, messages, tools);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        parse_response(response).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire format (shared with the Azure client)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireToolCall<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a FunctionCall,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    // OpenAI requires `content` even when null on tool-call messages
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

/// Build the chat-completions request body.
pub(super) fn build_request_body(model: &str, messages: &[ChatMessage], tools: &[ToolDef]) -> Value {
    let wire_messages: Vec<WireMessage<'_>> = messages
        .iter()
        .map(|msg| WireMessage {
            role: msg.role,
            content: msg.content.as_deref(),
            tool_calls: msg.tool_calls.as_ref().map(|calls| {
                calls
                    .iter()
                    .map(|call| WireToolCall {
                        id: &call.id,
                        kind: "function",
                        function: &call.function,
                    })
                    .collect()
            }),
            tool_call_id: msg.tool_call_id.as_deref(),
        })
        .collect();

    let mut body = serde_json::json!({
        "model": model,
        "messages": wire_messages,
    });

    if !tools.is_empty() {
        let wire_tools: Vec<Value> = tools
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect();
        body["tools"] = Value::Array(wire_tools);
        body["tool_choice"] = Value::String("auto".to_string());
    }

    body
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    id: String,
    function: FunctionCall,
}

/// Turn an HTTP response into the assistant message, surfacing API errors.
pub(super) async fn parse_response(response: reqwest::Response) -> Result<ChatMessage, LlmError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(LlmError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let completion: CompletionResponse = response
        .json()
        .await
        .map_err(|e| LlmError::MalformedResponse(format!("{}", e)))?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::MalformedResponse("response contained no choices".to_string()))?;

    let tool_calls = choice.message.tool_calls.map(|calls| {
        calls
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                function: call.function,
            })
            .collect::<Vec<_>>()
    });

    Ok(ChatMessage {
        role: Role::Assistant,
        content: choice.message.content,
        tool_calls,
        tool_call_id: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    fn sample_tools() -> Vec<ToolDef> {
        vec![ToolDef {
            name: "get_weather".to_string(),
            description: "Get current weather for a city".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }),
        }]
    }

    #[test]
    fn request_body_includes_tools_and_tool_choice() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("weather?")];
        let body = build_request_body("gpt-4o-mini", &messages, &sample_tools());

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "get_weather");
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn request_body_omits_tools_when_none_registered() {
        let messages = vec![ChatMessage::user("hi")];
        let body = build_request_body("gpt-4o-mini", &messages, &[]);
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn assistant_tool_call_message_serializes_with_function_type() {
        let messages = vec![ChatMessage {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(vec![ToolCall {
                id: "call_1".to_string(),
                function: FunctionCall {
                    name: "get_weather".to_string(),
                    arguments: "{\"city\":\"Paris\"}".to_string(),
                },
            }]),
            tool_call_id: None,
        }];
        let body = build_request_body("gpt-4o-mini", &messages, &[]);
        let wire = &body["messages"][0];

        assert_eq!(wire["role"], "assistant");
        assert!(wire["content"].is_null());
        assert_eq!(wire["tool_calls"][0]["type"], "function");
        assert_eq!(wire["tool_calls"][0]["function"]["name"], "get_weather");
    }

    #[test]
    fn completion_response_parses_tool_calls() {
        let raw = serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "get_forecast",
                            "arguments": "{\"city\":\"Oslo\"}"
                        }
                    }]
                }
            }]
        });

        let completion: CompletionResponse = serde_json::from_value(raw).unwrap();
        let message = &completion.choices[0].message;
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].id, "call_abc");
        assert_eq!(calls[0].function.name, "get_forecast");
    }

    #[test]
    fn completion_response_parses_plain_text() {
        let raw = serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Sunny and mild."}
            }]
        });
        let completion: CompletionResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some("Sunny and mild.")
        );
    }
}
