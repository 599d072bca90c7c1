//! Shared test helpers: a scripted provider and canned tools.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use robochat::decoder::{AnthropicDecoder, EventDecoder};
use robochat::error::RobotError;
use robochat::provider::{ModelProvider, ProviderRequest, RawEventStream};
use robochat::tools::{AgentTool, StaticToolRegistry, ToolParameters, ToolResultEnvelope};

/// One scripted reply: raw Anthropic-shaped events, replayed in order.
#[derive(Clone, Default)]
pub struct Script {
    events: Vec<Result<Value, String>>,
    open_error: Option<String>,
    delay: Option<Duration>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, index: u64, text: &str) -> Self {
        self.events.push(Ok(json!({
            "type": "content_block_start",
            "index": index,
            "content_block": {"type": "text", "text": ""}
        })));
        self.events.push(Ok(json!({
            "type": "content_block_delta",
            "index": index,
            "delta": {"type": "text_delta", "text": text}
        })));
        self.stop(index)
    }

    pub fn tool_start(mut self, index: u64, name: &str) -> Self {
        self.events.push(Ok(json!({
            "type": "content_block_start",
            "index": index,
            "content_block": {"type": "tool_use", "id": format!("toolu_{index}"), "name": name, "input": {}}
        })));
        self
    }

    pub fn fragment(mut self, index: u64, partial_json: &str) -> Self {
        self.events.push(Ok(json!({
            "type": "content_block_delta",
            "index": index,
            "delta": {"type": "input_json_delta", "partial_json": partial_json}
        })));
        self
    }

    pub fn stop(mut self, index: u64) -> Self {
        self.events
            .push(Ok(json!({"type": "content_block_stop", "index": index})));
        self
    }

    /// A complete tool block with arguments split into `pieces` fragments.
    pub fn tool(self, index: u64, name: &str, args: &str, pieces: usize) -> Self {
        let chars: Vec<char> = args.chars().collect();
        let size = chars.len().div_ceil(pieces.max(1)).max(1);
        let mut script = self.tool_start(index, name);
        for chunk in chars.chunks(size) {
            script = script.fragment(index, &chunk.iter().collect::<String>());
        }
        script.stop(index)
    }

    pub fn raw(mut self, event: Value) -> Self {
        self.events.push(Ok(event));
        self
    }

    pub fn end(self) -> Self {
        self.raw(json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}}))
            .raw(json!({"type": "message_stop"}))
    }

    pub fn provider_error(self, kind: &str, message: &str) -> Self {
        self.raw(json!({"type": "error", "error": {"type": kind, "message": message}}))
    }

    /// Transport failure mid-stream.
    pub fn broken(mut self, message: &str) -> Self {
        self.events.push(Err(message.to_string()));
        self
    }

    /// Fail before any event is produced.
    pub fn refuse(mut self, message: &str) -> Self {
        self.open_error = Some(message.to_string());
        self
    }

    /// Wait this long before each event.
    pub fn paced(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Provider that replays one [`Script`] per `open_stream` call. The last
/// script repeats once the queue is exhausted.
pub struct ScriptedProvider {
    scripts: Mutex<Vec<Script>>,
    last: Mutex<Option<Script>>,
    decoder: AnthropicDecoder,
    pub requests: Mutex<Vec<ProviderRequest>>,
    pub opened: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts),
            last: Mutex::new(None),
            decoder: AnthropicDecoder,
            requests: Mutex::new(Vec::new()),
            opened: AtomicUsize::new(0),
        })
    }

    pub fn single(script: Script) -> Arc<Self> {
        Self::new(vec![script])
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    fn decoder(&self) -> &dyn EventDecoder {
        &self.decoder
    }

    async fn open_stream(&self, request: &ProviderRequest) -> Result<RawEventStream, RobotError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let script = {
            let mut scripts = self.scripts.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            if !scripts.is_empty() {
                *last = Some(scripts.remove(0));
            }
            last.clone().unwrap_or_default()
        };

        if let Some(message) = script.open_error {
            return Err(RobotError::Transport(message));
        }

        let delay = script.delay;
        let stream = async_stream::stream! {
            for event in script.events {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                yield event.map_err(RobotError::Transport);
            }
        };
        Ok(Box::pin(stream))
    }
}

/// `formCreate`: succeeds with a summary naming the form.
pub fn form_create_tool() -> AgentTool {
    AgentTool::new(
        "formCreate",
        "Create a form",
        ToolParameters::object()
            .string("name", "Form name", true)
            .string_array("fields", "Field names", true)
            .build(),
        |args| async move {
            let name = args.get_str("name")?.to_string();
            let fields = args.get_array("fields")?.len();
            Ok(ToolResultEnvelope::success(json!({"id": 42, "name": name}))
                .with_summary(format!("Created form \"{name}\" with {fields} fields."))
                .with_full_message(json!({"kind": "form", "id": 42})))
        },
    )
}

/// `formDelete`: always returns an error.
pub fn failing_tool() -> AgentTool {
    AgentTool::new(
        "formDelete",
        "Delete a form",
        ToolParameters::empty(),
        |_args| async move { Err(RobotError::tool("formDelete", "permission denied")) },
    )
}

/// `explode`: panics.
pub fn panicking_tool() -> AgentTool {
    AgentTool::new(
        "explode",
        "Panics",
        ToolParameters::empty(),
        |_args| async move {
            if true {
                panic!("kaboom");
            }
            Ok(ToolResultEnvelope::success(Value::Null))
        },
    )
}

pub fn registry() -> Arc<StaticToolRegistry> {
    Arc::new(
        StaticToolRegistry::new()
            .with_tool(Arc::new(form_create_tool()))
            .with_tool(Arc::new(failing_tool()))
            .with_tool(Arc::new(panicking_tool())),
    )
}

pub const FORM_ARGS: &str =
    r#"{"name":"Customer Contact Form","fields":["name","email","message"]}"#;
pub const FORM_SUMMARY: &str = "Created form \"Customer Contact Form\" with 3 fields.";
