//! OpenAI Responses API transport.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::http::{bearer_headers, post_stream};
use super::{ModelProvider, ProviderRequest, RawEventStream};
use crate::decoder::{EventDecoder, OpenAiResponsesDecoder};
use crate::error::RobotError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiResponsesProvider {
    model_id: String,
    api_key: String,
    base_url: String,
    decoder: OpenAiResponsesDecoder,
}

impl OpenAiResponsesProvider {
    pub fn new(model_id: String, api_key: String, base_url: Option<String>) -> Self {
        Self {
            model_id,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            decoder: OpenAiResponsesDecoder,
        }
    }

    fn build_request_body(&self, request: &ProviderRequest) -> Value {
        let input: Vec<Value> = request
            .messages
            .iter()
            .map(|message| json!({ "role": message.role, "content": message.text }))
            .collect();

        let mut body = json!({
            "model": self.model_id,
            "input": input,
            "stream": true,
            "max_output_tokens": request.max_tokens,
        });
        if !request.system.is_empty() {
            body["instructions"] = json!(request.system);
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
                        "type": "function",
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    })
                })
                .collect();
        }
        body
    }
}

#[async_trait]
impl ModelProvider for OpenAiResponsesProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn decoder(&self) -> &dyn EventDecoder {
        &self.decoder
    }

    async fn open_stream(&self, request: &ProviderRequest) -> Result<RawEventStream, RobotError> {
        let body = self.build_request_body(request);
        let url = format!("{}/responses", self.base_url);

        debug!(model = %self.model_id, tools = request.tools.len(), "OpenAI open_stream");

        post_stream(&url, bearer_headers(&self.api_key), &body).await
    }
}
