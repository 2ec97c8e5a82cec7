//! Azure OpenAI client.
//!
//! Same chat-completions body as the OpenAI client, but addressed to a
//! deployment URL on the resource endpoint and authenticated with the
//! `api-key` header instead of a bearer token.

use crate::config::LlmConfig;

use super::openai::{build_request_body, parse_response};
use super::{ChatMessage, LlmError, ToolDef};

const API_VERSION: &str = "2024-06-01";

pub struct AzureOpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    deployment: String,
    api_key: String,
    model: String,
}

impl AzureOpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        // Config validation guarantees these are present for the azure provider.
        let endpoint = config.azure_endpoint.clone().unwrap_or_default();
        let deployment = config.azure_deployment.clone().unwrap_or_default();

        Ok(Self {
            http,
            endpoint,
            deployment,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait::async_trait]
impl super::LlmClient for AzureOpenAiClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDef],
    ) -> Result<ChatMessage, LlmError> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint.trim_end_matches('/'),
            self.deployment
        );
        let body = build_request_body(&self.model, messages, tools);

        let response = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .query(&[("api-version", API_VERSION)])
            .json(&body)
            .send()
            .await?;

        parse_response(response).await
    }
}
