//! Model selection: `provider:model_id` strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::RobotError;

/// Providers with a built-in transport and event decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    #[strum(serialize = "openai")]
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    /// Environment variable holding this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// A concrete model on a concrete provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageModel {
    pub provider: ProviderKind,
    pub model_id: String,
}

impl LanguageModel {
    pub fn new(provider: ProviderKind, model_id: impl Into<String>) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
        }
    }

    /// Parse "provider:model_id".
    ///
    /// Examples: "anthropic:claude-sonnet-4-5", "openai:gpt-4.1"
    pub fn parse(s: &str) -> Result<Self, RobotError> {
        let (provider, model_id) = s.split_once(':').ok_or_else(|| {
            RobotError::InvalidArgument(format!(
                "Invalid model selector '{s}': expected 'provider:model_id'"
            ))
        })?;
        let model_id = model_id.trim();
        if model_id.is_empty() {
            return Err(RobotError::InvalidArgument(format!(
                "Invalid model selector '{s}': empty model id"
            )));
        }
        let provider = ProviderKind::from_str(&provider.trim().to_ascii_lowercase())
            .map_err(|_| RobotError::ModelNotFound(format!("Unknown provider '{provider}'")))?;
        Ok(Self::new(provider, model_id))
    }
}

impl FromStr for LanguageModel {
    type Err = RobotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LanguageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model_id)
    }
}
