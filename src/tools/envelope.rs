//! The success/error envelope returned by tool executions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One error reported by a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolErrorItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl ToolErrorItem {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Outcome of one tool execution. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultEnvelope {
    pub is_success: bool,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<ToolErrorItem>>,
    /// Short inline text shown in the response stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Structured message delivered on the full-message channel only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_message: Option<Value>,
}

impl ToolResultEnvelope {
    pub fn success(payload: Value) -> Self {
        Self {
            is_success: true,
            payload: Some(payload),
            errors: None,
            summary: None,
            full_message: None,
        }
    }

    pub fn failure(errors: Vec<ToolErrorItem>) -> Self {
        Self {
            is_success: false,
            payload: None,
            errors: Some(errors),
            summary: None,
            full_message: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_full_message(mut self, message: Value) -> Self {
        self.full_message = Some(message);
        self
    }

    /// Error messages joined for display.
    pub fn error_text(&self) -> String {
        let joined = self
            .errors
            .iter()
            .flatten()
            .map(|item| match &item.code {
                Some(code) => format!("{} ({code})", item.message),
                None => item.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        if joined.is_empty() {
            "the tool reported a failure without details".to_string()
        } else {
            joined
        }
    }

    /// Inline text for the response stream.
    pub fn render_text(&self, tool_name: &str) -> String {
        if !self.is_success {
            return format!("Error executing {tool_name}: {}", self.error_text());
        }
        if let Some(summary) = &self.summary {
            return summary.clone();
        }
        match &self.payload {
            Some(Value::Null) | None => format!("{tool_name} completed successfully."),
            Some(Value::String(text)) => text.clone(),
            Some(payload) => {
                serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
            }
        }
    }
}
