//! OpenAI-compatible chat completion gateway

use async_trait::async_trait;
use memchat_core::{CompletionRequest, LanguageModelGateway, MemchatError};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::core::config::LlmConfig;
use crate::models::error::GatewayError;
use crate::models::openai::{ChatCompletionRequest, ChatCompletionResponse};

/// Gateway posting to `{base_url}/chat/completions`
///
/// Built once from configuration and handed to the session; holds the only
/// copy of the API key.
pub struct OpenAiGateway {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiGateway {
    pub fn new(config: &LlmConfig) -> Result<Self, GatewayError> {
        if config.api_key.trim().is_empty() {
            return Err(GatewayError::Config("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: completions_endpoint(&config.base_url),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let body = ChatCompletionRequest::from(request);
        debug!(
            "POST {} ({} messages, model {})",
            self.endpoint,
            body.messages.len(),
            body.model
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status, &text));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        if let Some(usage) = &completion.usage {
            debug!(
                "{}: {} prompt + {} completion tokens",
                request.purpose.label(),
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        completion
            .first_content()
            .map(str::to_string)
            .ok_or(GatewayError::EmptyCompletion)
    }
}

#[async_trait]
impl LanguageModelGateway for OpenAiGateway {
    async fn complete(&self, request: &CompletionRequest) -> memchat_core::Result<String> {
        self.send(request)
            .await
            .map_err(|e| MemchatError::gateway(request.purpose, e.to_string()))
    }
}

fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim().trim_end_matches('/'))
}
