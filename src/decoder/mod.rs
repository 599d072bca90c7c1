//! Provider event decoding into [`StreamEvent`]s.
//!
//! Decoders are pure and total: every raw provider payload maps to exactly
//! one [`StreamEvent`], with [`StreamEvent::Ignored`] for envelope events
//! that carry no text or tool data. Missing fields degrade to empty values.

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "openai")]
pub mod openai;

use serde_json::Value;

use crate::types::StreamEvent;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicDecoder;
#[cfg(feature = "openai")]
pub use openai::OpenAiResponsesDecoder;

/// Maps one raw provider payload (an SSE `data:` JSON object) to a
/// [`StreamEvent`].
pub trait EventDecoder: Send + Sync {
    fn decode(&self, raw: &Value) -> StreamEvent;
}

pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}
