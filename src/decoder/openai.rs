//! OpenAI Responses API stream decoder.

use serde_json::Value;

use super::{str_field, EventDecoder};
use crate::types::StreamEvent;

/// Decoder for `response.*` streaming events. Function calls are keyed by
/// their output item id, which every argument event repeats.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiResponsesDecoder;

fn failure_cause(raw: &Value) -> String {
    let error = raw
        .get("response")
        .and_then(|r| r.get("error"))
        .filter(|e| !e.is_null())
        .or_else(|| raw.get("error").filter(|e| e.is_object()))
        .unwrap_or(raw);
    let message = str_field(error, "message");
    if !message.is_empty() {
        return message.to_string();
    }
    let reason = raw
        .get("response")
        .and_then(|r| r.get("incomplete_details"))
        .map(|d| str_field(d, "reason"))
        .unwrap_or("");
    if !reason.is_empty() {
        return format!("response incomplete: {reason}");
    }
    "unknown provider error".to_string()
}

impl EventDecoder for OpenAiResponsesDecoder {
    fn decode(&self, raw: &Value) -> StreamEvent {
        match str_field(raw, "type") {
            "response.output_text.delta" => StreamEvent::TextDelta {
                text: str_field(raw, "delta").to_string(),
            },
            "response.output_item.added" => {
                let Some(item) = raw.get("item") else {
                    return StreamEvent::Ignored;
                };
                if str_field(item, "type") != "function_call" {
                    return StreamEvent::Ignored;
                }
                StreamEvent::ToolInvocationStarted {
                    invocation_id: str_field(item, "id").to_string(),
                    tool_name: str_field(item, "name").to_string(),
                }
            }
            "response.function_call_arguments.delta" => StreamEvent::ToolArgumentFragment {
                invocation_id: str_field(raw, "item_id").to_string(),
                json_fragment: str_field(raw, "delta").to_string(),
            },
            "response.function_call_arguments.done" => StreamEvent::ToolInvocationCompleted {
                invocation_id: str_field(raw, "item_id").to_string(),
            },
            "response.completed" => StreamEvent::StreamEnded,
            "response.failed" | "response.incomplete" | "error" => StreamEvent::StreamFailed {
                cause: failure_cause(raw),
            },
            _ => StreamEvent::Ignored,
        }
    }
}
