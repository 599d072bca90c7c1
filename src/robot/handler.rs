//! Caller-side hooks for the streaming contract.

use std::sync::Mutex;

use serde_json::Value;

use crate::error::RobotError;
use crate::orchestrator::Chunk;

/// Receives output of one streaming response.
///
/// `on_start` fires once, `on_chunk` once per chunk in order, `on_error` at
/// most once, and `on_finish` exactly once with the text delivered so far.
pub trait StreamHandler: Send + Sync {
    fn on_start(&self) {}

    fn on_chunk(&self, chunk: &Chunk);

    /// Structured message attached to a tool result.
    fn on_full_message(&self, _tool_name: &str, _message: &Value) {}

    fn on_error(&self, _error: &RobotError) {}

    fn on_finish(&self, _full_text: &str) {}
}

impl<F> StreamHandler for F
where
    F: Fn(&Chunk) + Send + Sync,
{
    fn on_chunk(&self, chunk: &Chunk) {
        self(chunk)
    }
}

/// Collects chunk text; backs the immediate contract.
#[derive(Debug, Default)]
pub struct BufferingHandler {
    buffer: Mutex<String>,
}

impl BufferingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl StreamHandler for BufferingHandler {
    fn on_chunk(&self, chunk: &Chunk) {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_str(&chunk.text);
    }
}
