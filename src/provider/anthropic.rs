//! Anthropic Messages API transport.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::http::{anthropic_headers, post_stream};
use super::{ModelProvider, ProviderRequest, RawEventStream};
use crate::decoder::{AnthropicDecoder, EventDecoder};
use crate::error::RobotError;
use crate::types::Role;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    model_id: String,
    api_key: String,
    base_url: String,
    decoder: AnthropicDecoder,
}

impl AnthropicProvider {
    pub fn new(model_id: String, api_key: String, base_url: Option<String>) -> Self {
        Self {
            model_id,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            decoder: AnthropicDecoder,
        }
    }

    fn build_request_body(&self, request: &ProviderRequest) -> Value {
        // System text travels in the top-level `system` field; the API
        // only accepts user/assistant roles in `messages`.
        let mut system = request.system.clone();
        let mut messages = Vec::with_capacity(request.messages.len());
        for message in &request.messages {
            match message.role {
                Role::System => {
                    if !system.is_empty() {
                        system.push_str("\n\n");
                    }
                    system.push_str(&message.text);
                }
                Role::User | Role::Assistant => messages.push(json!({
                    "role": message.role,
                    "content": message.text,
                })),
            }
        }

        let mut body = json!({
            "model": self.model_id,
            "max_tokens": request.max_tokens,
            "messages": messages,
            "stream": true,
        });
        if !system.is_empty() {
            body["system"] = json!(system);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if !request.tools.is_empty() {
            body["tools"] = request
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description,
                        "input_schema": tool.parameters,
                    })
                })
                .collect();
        }
        body
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn decoder(&self) -> &dyn EventDecoder {
        &self.decoder
    }

    async fn open_stream(&self, request: &ProviderRequest) -> Result<RawEventStream, RobotError> {
        let body = self.build_request_body(request);
        let url = format!("{}/messages", self.base_url);

        debug!(model = %self.model_id, tools = request.tools.len(), "Anthropic open_stream");

        post_stream(&url, anthropic_headers(&self.api_key, API_VERSION), &body).await
    }
}
