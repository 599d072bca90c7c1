//! Caller-facing response envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::Role;
use crate::error::{ErrorCategory, RobotError};

/// Approximate token count: one token per four characters, rounded up.
///
/// This is a length heuristic, not a tokenizer.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Why an envelope is error-flavored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFailure {
    pub category: ErrorCategory,
    pub message: String,
}

/// The unit handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub estimated_tokens: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseFailure>,
}

impl ResponseEnvelope {
    /// Successful assistant response.
    pub fn assistant(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            role: Role::Assistant,
            estimated_tokens: estimate_tokens(&text),
            text,
            created_at: Utc::now(),
            error: None,
        }
    }

    /// Error-flavored response. Any text produced before the failure is
    /// kept, followed by a user-facing description of the failure.
    pub fn failed(partial_text: &str, error: &RobotError) -> Self {
        let message = error.user_message();
        let text = if partial_text.is_empty() {
            message.clone()
        } else {
            format!("{partial_text}\n\n{message}")
        };
        Self {
            role: Role::Assistant,
            estimated_tokens: estimate_tokens(&text),
            text,
            created_at: Utc::now(),
            error: Some(ResponseFailure {
                category: error.category(),
                message,
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Text the model produced. For an error-flavored envelope this drops
    /// the failure description appended by [`failed`](Self::failed).
    pub fn partial_text(&self) -> &str {
        match &self.error {
            None => &self.text,
            Some(failure) => self
                .text
                .strip_suffix(failure.message.as_str())
                .map(str::trim_end)
                .unwrap_or(""),
        }
    }
}
