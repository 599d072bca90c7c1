//! Configuration (layered: code > env > `.env` file > settings file).

pub mod settings;

pub use settings::RobotSettings;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::models::ProviderKind;

/// Provider credentials and endpoint overrides.
///
/// Cheap to clone; clones share the same underlying maps. Passed
/// explicitly to whoever builds providers, never read from a global.
#[derive(Debug, Clone, Default)]
pub struct RobotConfig {
    api_keys: Arc<RwLock<HashMap<String, String>>>,
    base_urls: Arc<RwLock<HashMap<String, String>>>,
}

impl RobotConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from environment variables (and `.env` if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let config = Self::new();

        let key_mappings = [
            ("ANTHROPIC_API_KEY", ProviderKind::Anthropic),
            ("OPENAI_API_KEY", ProviderKind::OpenAi),
        ];
        for (env_var, provider) in &key_mappings {
            if let Ok(key) = std::env::var(env_var) {
                config.set_api_key(&provider.to_string(), key);
            }
        }

        let url_mappings = [
            ("ANTHROPIC_BASE_URL", ProviderKind::Anthropic),
            ("OPENAI_BASE_URL", ProviderKind::OpenAi),
        ];
        for (env_var, provider) in &url_mappings {
            if let Ok(url) = std::env::var(env_var) {
                config.set_base_url(&provider.to_string(), url);
            }
        }

        config
    }

    pub fn set_api_key(&self, provider: &str, key: String) {
        self.api_keys
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(provider.to_string(), key);
    }

    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(provider)
            .cloned()
    }

    pub fn set_base_url(&self, provider: &str, url: String) {
        self.base_urls
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(provider.to_string(), url);
    }

    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(provider)
            .cloned()
    }

    pub fn has_credentials(&self, provider: &str) -> bool {
        self.get_api_key(provider).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_are_shared_between_clones() {
        let config = RobotConfig::new();
        let clone = config.clone();
        config.set_api_key("anthropic", "sk-test".into());
        config.set_base_url("anthropic", "http://localhost:9999".into());

        assert_eq!(clone.get_api_key("anthropic").as_deref(), Some("sk-test"));
        assert_eq!(
            clone.get_base_url("anthropic").as_deref(),
            Some("http://localhost:9999")
        );
        assert!(!clone.has_credentials("openai"));
    }
}
