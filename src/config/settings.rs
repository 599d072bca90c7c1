//! Per-robot orchestration settings, loadable from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::RobotError;
use crate::models::LanguageModel;

const DEFAULT_MODEL: &str = "anthropic:claude-sonnet-4-5";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available tools when \
    the user asks for an action they can perform, and summarize what you did.";
const DEFAULT_FOLLOW_UP_PROMPT: &str = "Follow up on your previous answer with any additional \
    details or next steps the user should know about.";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TIMEOUT_MS: u64 = 120_000;

const SETTINGS_FILE: &str = "robot.toml";

/// Settings for one robot configuration.
///
/// ```
/// use robochat::config::RobotSettings;
///
/// let settings = RobotSettings::builder()
///     .model("openai:gpt-4.1")
///     .response_timeout_ms(30_000)
///     .build();
/// assert_eq!(settings.max_tokens, 4096);
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RobotSettings {
    /// Model selector, `provider:model_id`.
    #[builder(into, default = DEFAULT_MODEL.to_string())]
    pub model: String,
    /// Static system instructions sent with every request.
    #[builder(into, default = DEFAULT_SYSTEM_PROMPT.to_string())]
    pub system_prompt: String,
    #[builder(default = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    /// Upper bound for one orchestration run; 0 disables the bound.
    #[builder(default = DEFAULT_TIMEOUT_MS)]
    pub response_timeout_ms: u64,
    /// Prompt for the second run of a multi-part response.
    #[builder(into, default = DEFAULT_FOLLOW_UP_PROMPT.to_string())]
    pub follow_up_prompt: String,
    #[builder(default)]
    pub follow_up_delay_ms: u64,
}

impl Default for RobotSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RobotSettings {
    pub fn from_toml_str(raw: &str) -> Result<Self, RobotError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, RobotError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Platform config location, e.g. `~/.config/robochat/robot.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "robochat")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load_default() -> Result<Self, RobotError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply `ROBOCHAT_*` environment overrides.
    pub fn apply_env_overrides(mut self) -> Result<Self, RobotError> {
        if let Ok(model) = std::env::var("ROBOCHAT_MODEL") {
            self.model = model;
        }
        if let Ok(prompt) = std::env::var("ROBOCHAT_SYSTEM_PROMPT") {
            self.system_prompt = prompt;
        }
        if let Ok(raw) = std::env::var("ROBOCHAT_TIMEOUT_MS") {
            self.response_timeout_ms = raw.trim().parse().map_err(|_| {
                RobotError::Configuration(format!("ROBOCHAT_TIMEOUT_MS is not a number: '{raw}'"))
            })?;
        }
        Ok(self)
    }

    pub fn language_model(&self) -> Result<LanguageModel, RobotError> {
        self.model.parse()
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        (self.response_timeout_ms > 0).then(|| Duration::from_millis(self.response_timeout_ms))
    }

    pub fn follow_up_delay(&self) -> Duration {
        Duration::from_millis(self.follow_up_delay_ms)
    }
}
