//! Error types for robochat.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all robochat operations.
#[derive(Error, Debug)]
pub enum RobotError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Protocol anomaly: {0}")]
    ProtocolAnomaly(String),

    #[error("Invalid arguments for {tool_name}: {message} (raw: {raw})")]
    ToolArgumentParse {
        tool_name: String,
        raw: String,
        message: String,
    },

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Canceled: {0}")]
    Canceled(String),
}

impl RobotError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) | Self::Transport(_) => ErrorCategory::Transport,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Canceled(_) => ErrorCategory::Canceled,
            Self::Configuration(_) | Self::ConfigParse(_) | Self::ModelNotFound(_) => {
                ErrorCategory::Configuration
            }
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::ProtocolAnomaly(_) => ErrorCategory::Protocol,
            Self::ToolArgumentParse { .. } => ErrorCategory::ToolArguments,
            Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            Self::Io(_) | Self::InvalidArgument(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error ends the orchestration run it occurred in.
    ///
    /// Recoverable kinds are surfaced as inline diagnostic text instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self.category(),
            ErrorCategory::Protocol | ErrorCategory::ToolArguments | ErrorCategory::ToolExecution
        )
    }

    /// Whether this error is potentially retryable by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Transport
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::RateLimit
            | ErrorCategory::Transport
            | ErrorCategory::Server => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::ToolExecution | ErrorCategory::ToolArguments => {
                RecoverySuggestion::CheckToolImplementation
            }
            _ => RecoverySuggestion::ContactSupport,
        }
    }

    /// Human-readable sentence for end users.
    ///
    /// Tool failures, provider connection failures and timeouts read
    /// differently so callers can pick the right remediation.
    pub fn user_message(&self) -> String {
        match self {
            Self::ToolExecution { tool_name, message } => {
                format!("Error executing {tool_name}: {message}")
            }
            Self::ToolArgumentParse {
                tool_name, message, ..
            } => format!("Error executing {tool_name}: invalid arguments ({message})"),
            Self::ProtocolAnomaly(message) => {
                format!("The provider sent an unexpected event: {message}")
            }
            Self::Timeout(ms) => format!("The response timed out after {ms}ms."),
            Self::Canceled(message) => format!("The response was canceled: {message}"),
            Self::Authentication(message) => {
                format!("The provider rejected the credentials: {message}")
            }
            Self::RateLimited { .. } => {
                "The provider is rate limiting requests; try again shortly.".to_string()
            }
            Self::Configuration(_) | Self::ConfigParse(_) | Self::ModelNotFound(_) => {
                format!("The robot is misconfigured: {self}")
            }
            other => format!("The provider connection failed: {other}"),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, RobotError>;
