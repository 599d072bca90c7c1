//! Model provider trait and transports.

pub mod http;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "openai")]
pub mod openai;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::RobotConfig;
use crate::decoder::EventDecoder;
use crate::error::RobotError;
use crate::models::{LanguageModel, ProviderKind};
use crate::tools::ToolSchema;
use crate::types::ModelMessage;

/// Raw provider payloads, one per SSE `data:` line.
pub type RawEventStream = BoxStream<'static, Result<serde_json::Value, RobotError>>;

/// A request sent to a model provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Static system instructions.
    pub system: String,
    pub messages: Vec<ModelMessage>,
    pub tools: Vec<ToolSchema>,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

/// Core trait implemented by all model providers.
///
/// A provider opens a stream of raw events; the matching [`EventDecoder`]
/// turns each into a provider-neutral event.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "anthropic").
    fn provider_name(&self) -> &str;

    fn model_id(&self) -> &str;

    fn decoder(&self) -> &dyn EventDecoder;

    /// Open a streaming response.
    async fn open_stream(&self, request: &ProviderRequest) -> Result<RawEventStream, RobotError>;
}

/// Create a provider for the given model, using the provided config.
#[allow(unused_variables)]
pub fn create_provider(
    model: &LanguageModel,
    config: &RobotConfig,
) -> Result<Box<dyn ModelProvider>, RobotError> {
    let name = model.provider.to_string();
    let missing_key =
        || RobotError::Authentication(format!("Missing {}", model.provider.api_key_env()));
    match model.provider {
        #[cfg(feature = "anthropic")]
        ProviderKind::Anthropic => {
            let api_key = config.get_api_key(&name).ok_or_else(missing_key)?;
            Ok(Box::new(anthropic::AnthropicProvider::new(
                model.model_id.clone(),
                api_key,
                config.get_base_url(&name),
            )))
        }
        #[cfg(feature = "openai")]
        ProviderKind::OpenAi => {
            let api_key = config.get_api_key(&name).ok_or_else(missing_key)?;
            Ok(Box::new(openai::OpenAiResponsesProvider::new(
                model.model_id.clone(),
                api_key,
                config.get_base_url(&name),
            )))
        }
        #[allow(unreachable_patterns)]
        _ => Err(RobotError::ModelNotFound(format!(
            "Provider for model '{model}' not enabled via feature flags"
        ))),
    }
}
