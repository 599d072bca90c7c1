//! Decoded provider stream events.

use serde::{Deserialize, Serialize};

/// Identifier of one tool invocation within a single provider stream.
pub type InvocationId = String;

/// Provider-neutral stream vocabulary produced by an
/// [`EventDecoder`](crate::decoder::EventDecoder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental assistant text.
    TextDelta { text: String },
    /// The model opened a tool invocation.
    ToolInvocationStarted {
        invocation_id: InvocationId,
        tool_name: String,
    },
    /// A piece of the invocation's JSON arguments.
    ToolArgumentFragment {
        invocation_id: InvocationId,
        json_fragment: String,
    },
    /// The invocation's arguments are complete.
    ToolInvocationCompleted { invocation_id: InvocationId },
    /// The provider finished the response.
    StreamEnded,
    /// The provider reported a failure inside the stream.
    StreamFailed { cause: String },
    /// Envelope/bookkeeping events with no bearing on text or tools.
    Ignored,
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::StreamEnded | Self::StreamFailed { .. })
    }
}
