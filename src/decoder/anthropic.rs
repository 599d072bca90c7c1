//! Anthropic Messages API stream decoder.

use serde_json::Value;

use super::{str_field, EventDecoder};
use crate::types::StreamEvent;

/// Decoder for Anthropic `content_block_*` / `message_*` events.
///
/// Tool input deltas only carry the content block index, so the index is
/// used as the invocation id. `content_block_stop` does not repeat the
/// block type; a stop for a text block becomes a completion for an id the
/// accumulator never opened, which the orchestrator treats as a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnthropicDecoder;

fn block_id(event: &Value) -> String {
    match event.get("index") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

impl EventDecoder for AnthropicDecoder {
    fn decode(&self, raw: &Value) -> StreamEvent {
        match str_field(raw, "type") {
            "content_block_start" => {
                let Some(block) = raw.get("content_block") else {
                    return StreamEvent::Ignored;
                };
                match str_field(block, "type") {
                    "tool_use" => StreamEvent::ToolInvocationStarted {
                        invocation_id: block_id(raw),
                        tool_name: str_field(block, "name").to_string(),
                    },
                    "text" => {
                        let text = str_field(block, "text");
                        if text.is_empty() {
                            StreamEvent::Ignored
                        } else {
                            StreamEvent::TextDelta {
                                text: text.to_string(),
                            }
                        }
                    }
                    _ => StreamEvent::Ignored,
                }
            }
            "content_block_delta" => {
                let Some(delta) = raw.get("delta") else {
                    return StreamEvent::Ignored;
                };
                match str_field(delta, "type") {
                    "text_delta" => StreamEvent::TextDelta {
                        text: str_field(delta, "text").to_string(),
                    },
                    "input_json_delta" => StreamEvent::ToolArgumentFragment {
                        invocation_id: block_id(raw),
                        json_fragment: str_field(delta, "partial_json").to_string(),
                    },
                    _ => StreamEvent::Ignored,
                }
            }
            "content_block_stop" => StreamEvent::ToolInvocationCompleted {
                invocation_id: block_id(raw),
            },
            "message_stop" => StreamEvent::StreamEnded,
            "error" => {
                let cause = raw
                    .get("error")
                    .map(|e| {
                        let kind = str_field(e, "type");
                        let message = str_field(e, "message");
                        match (kind.is_empty(), message.is_empty()) {
                            (false, false) => format!("{kind}: {message}"),
                            (true, false) => message.to_string(),
                            (false, true) => kind.to_string(),
                            (true, true) => "unknown provider error".to_string(),
                        }
                    })
                    .unwrap_or_else(|| "unknown provider error".to_string());
                StreamEvent::StreamFailed { cause }
            }
            _ => StreamEvent::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(raw: Value) -> StreamEvent {
        AnthropicDecoder.decode(&raw)
    }

    #[test]
    fn text_delta() {
        let event = decode(json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": "Hello"}
        }));
        assert_eq!(event, StreamEvent::TextDelta { text: "Hello".into() });
    }

    #[test]
    fn text_delta_without_text_is_empty() {
        let event = decode(json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta"}
        }));
        assert_eq!(event, StreamEvent::TextDelta { text: String::new() });
    }

    #[test]
    fn tool_use_lifecycle_is_keyed_by_block_index() {
        let start = decode(json!({
            "type": "content_block_start",
            "index": 1,
            "content_block": {"type": "tool_use", "id": "toolu_01", "name": "formCreate", "input": {}}
        }));
        assert_eq!(
            start,
            StreamEvent::ToolInvocationStarted {
                invocation_id: "1".into(),
                tool_name: "formCreate".into()
            }
        );

        let fragment = decode(json!({
            "type": "content_block_delta",
            "index": 1,
            "delta": {"type": "input_json_delta", "partial_json": "{\"name\":"}
        }));
        assert_eq!(
            fragment,
            StreamEvent::ToolArgumentFragment {
                invocation_id: "1".into(),
                json_fragment: "{\"name\":".into()
            }
        );

        let stop = decode(json!({"type": "content_block_stop", "index": 1}));
        assert_eq!(
            stop,
            StreamEvent::ToolInvocationCompleted {
                invocation_id: "1".into()
            }
        );
    }

    #[test]
    fn message_stop_ends_stream() {
        assert_eq!(decode(json!({"type": "message_stop"})), StreamEvent::StreamEnded);
    }

    #[test]
    fn error_event_fails_stream() {
        let event = decode(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        }));
        assert_eq!(
            event,
            StreamEvent::StreamFailed {
                cause: "overloaded_error: Overloaded".into()
            }
        );
    }

    #[test]
    fn envelope_events_are_ignored() {
        for raw in [
            json!({"type": "message_start", "message": {"id": "msg_1"}}),
            json!({"type": "ping"}),
            json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}}),
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "thinking_delta", "thinking": "hm"}}),
            json!({"no_type": true}),
        ] {
            assert_eq!(decode(raw), StreamEvent::Ignored);
        }
    }
}
