//! Per-turn orchestration: stream decoding, tool execution and output
//! assembly.

pub mod accumulator;
pub mod events;

pub use accumulator::{CompletedInvocation, ToolCallAccumulator, ToolInvocationState};
pub use events::{
    Chunk, ChunkKind, OrchestrationOutcome, RunEvent, RunEventPayload, RunEventSink, RunId,
};

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::error::RobotError;
use crate::provider::{ModelProvider, ProviderRequest};
use crate::tools::ToolRegistry;
use crate::types::{ConversationTurn, InvocationId, StreamEvent};
use crate::util::with_optional_timeout;

use events::RunEventEmitter;

const BLOCK_SEPARATOR: &str = "\n\n";

/// Lifecycle of a single orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    Idle,
    Streaming,
    Executing,
    Finishing,
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Drives one conversation turn against a provider and a tool registry.
///
/// Holds no per-run state; concurrent runs on clones are independent.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<dyn ToolRegistry>,
    system_prompt: String,
    max_tokens: u32,
    temperature: Option<f64>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn ModelProvider>, tools: Arc<dyn ToolRegistry>) -> Self {
        Self {
            provider,
            tools,
            system_prompt: String::new(),
            max_tokens: 4096,
            temperature: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    /// Provider request for a turn: history, the turn itself and the
    /// registry's current tool list.
    pub fn build_request(&self, turn: &ConversationTurn) -> ProviderRequest {
        ProviderRequest {
            system: self.system_prompt.clone(),
            messages: turn.to_messages(),
            tools: self.tools.list_tools(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Run one turn to completion.
    ///
    /// Events go to `sink` as they happen, ending with exactly one
    /// `Completed` or `Failed`. Recoverable problems (bad tool arguments,
    /// tool failures, protocol anomalies) become inline diagnostic chunks;
    /// only transport-level failures return `Err`.
    pub async fn run(
        &self,
        turn: &ConversationTurn,
        sink: Option<RunEventSink>,
    ) -> Result<OrchestrationOutcome, RobotError> {
        self.run_with_timeout(turn, sink, None).await
    }

    /// [`run`](Self::run) bounded by `limit` (`None` waits indefinitely).
    ///
    /// When the bound elapses the run is dropped, a `Failed` event carrying
    /// the timeout is emitted and `RobotError::Timeout` is returned.
    pub async fn run_with_timeout(
        &self,
        turn: &ConversationTurn,
        sink: Option<RunEventSink>,
        limit: Option<Duration>,
    ) -> Result<OrchestrationOutcome, RobotError> {
        let run = Run::new(self, sink);
        let run_id = run.run_id;
        let emitter = Arc::clone(&run.emitter);

        // The inner result is wrapped so the outer error can only be the
        // elapsed bound.
        let bounded = async move { Ok::<_, RobotError>(run.drive(turn).await) };
        match with_optional_timeout(limit, bounded).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(run_id = %run_id, error = %err, "orchestration run timed out");
                emitter.emit(RunEventPayload::Failed {
                    error: err.user_message(),
                    category: err.category(),
                });
                Err(err)
            }
        }
    }

    /// Run a turn on a background task and expose its events as a stream.
    ///
    /// The stream ends after the terminal event, which is a timeout
    /// `Failed` if `limit` elapses first.
    pub fn spawn_events(
        &self,
        turn: ConversationTurn,
        limit: Option<Duration>,
    ) -> (
        UnboundedReceiverStream<RunEvent>,
        JoinHandle<Result<OrchestrationOutcome, RobotError>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink: RunEventSink = Arc::new(move |event: RunEvent| {
            let _ = tx.send(event);
        });
        let orchestrator = self.clone();
        let handle = tokio::spawn(async move {
            orchestrator
                .run_with_timeout(&turn, Some(sink), limit)
                .await
        });
        (UnboundedReceiverStream::new(rx), handle)
    }
}

/// Mutable state for a single run.
struct Run<'a> {
    orchestrator: &'a Orchestrator,
    run_id: Uuid,
    emitter: Arc<RunEventEmitter>,
    state: RunState,
    accumulator: ToolCallAccumulator,
    text: String,
    tool_invocations: usize,
    diagnostics: usize,
    /// Set after a tool block so following prose starts on a new paragraph.
    separator_pending: bool,
    reported_orphans: HashSet<InvocationId>,
}

impl<'a> Run<'a> {
    fn new(orchestrator: &'a Orchestrator, sink: Option<RunEventSink>) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            orchestrator,
            run_id,
            emitter: Arc::new(RunEventEmitter::new(run_id, sink)),
            state: RunState::Idle,
            accumulator: ToolCallAccumulator::new(),
            text: String::new(),
            tool_invocations: 0,
            diagnostics: 0,
            separator_pending: false,
            reported_orphans: HashSet::new(),
        }
    }

    fn transition(&mut self, next: RunState) {
        tracing::trace!(run_id = %self.run_id, from = %self.state, to = %next, "run state");
        self.state = next;
    }

    async fn drive(mut self, turn: &ConversationTurn) -> Result<OrchestrationOutcome, RobotError> {
        let provider = Arc::clone(&self.orchestrator.provider);
        tracing::debug!(
            run_id = %self.run_id,
            provider = provider.provider_name(),
            model = provider.model_id(),
            "orchestration run start"
        );
        self.emitter.emit(RunEventPayload::Started);

        let request = self.orchestrator.build_request(turn);
        let mut stream = match provider.open_stream(&request).await {
            Ok(stream) => stream,
            Err(err) => return Err(self.fail(err)),
        };
        self.transition(RunState::Streaming);

        let decoder = provider.decoder();
        loop {
            let raw = match stream.next().await {
                Some(Ok(raw)) => raw,
                Some(Err(err)) => return Err(self.fail(err)),
                None => {
                    return Err(self.fail(RobotError::Transport(
                        "provider stream closed before completion".to_string(),
                    )))
                }
            };

            match decoder.decode(&raw) {
                StreamEvent::TextDelta { text } => self.push_text(&text),
                StreamEvent::ToolInvocationStarted {
                    invocation_id,
                    tool_name,
                } => {
                    tracing::debug!(run_id = %self.run_id, %invocation_id, %tool_name, "tool invocation started");
                    if let Err(err) = self.accumulator.on_start(&invocation_id, &tool_name) {
                        self.diagnose(err, Some(tool_name));
                    }
                }
                StreamEvent::ToolArgumentFragment {
                    invocation_id,
                    json_fragment,
                } => {
                    if let Err(err) = self.accumulator.on_fragment(&invocation_id, &json_fragment) {
                        if self.reported_orphans.insert(invocation_id) {
                            self.diagnose(err, None);
                        }
                    }
                }
                StreamEvent::ToolInvocationCompleted { invocation_id } => {
                    match self.accumulator.on_complete(&invocation_id) {
                        Ok(Some(invocation)) => self.execute(invocation).await,
                        Ok(None) => {}
                        Err(err) => {
                            self.tool_invocations += 1;
                            let tool_name = match &err {
                                RobotError::ToolArgumentParse { tool_name, .. } => {
                                    Some(tool_name.clone())
                                }
                                _ => None,
                            };
                            self.diagnose(err, tool_name);
                        }
                    }
                }
                StreamEvent::StreamEnded => return Ok(self.finish()),
                StreamEvent::StreamFailed { cause } => {
                    return Err(self.fail(RobotError::Transport(cause)))
                }
                StreamEvent::Ignored => {}
            }
        }
    }

    async fn execute(&mut self, invocation: CompletedInvocation) {
        self.transition(RunState::Executing);
        self.tool_invocations += 1;
        let CompletedInvocation {
            invocation_id,
            tool_name,
            arguments,
        } = invocation;
        tracing::debug!(run_id = %self.run_id, %invocation_id, %tool_name, "executing tool");

        let registry = Arc::clone(&self.orchestrator.tools);
        let outcome = AssertUnwindSafe(registry.execute(&tool_name, arguments))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(envelope)) => {
                let rendered = envelope.render_text(&tool_name);
                if envelope.is_success {
                    self.push_block(ChunkKind::ToolResult, rendered, Some(tool_name.clone()));
                } else {
                    tracing::warn!(run_id = %self.run_id, %tool_name, "tool returned failure envelope");
                    self.diagnostics += 1;
                    self.push_block(ChunkKind::Diagnostic, rendered, Some(tool_name.clone()));
                }
                if let Some(message) = envelope.full_message {
                    self.emitter.emit(RunEventPayload::FullMessage {
                        tool_name,
                        message,
                    });
                }
            }
            Ok(Err(err)) => {
                let err = match err {
                    err @ RobotError::ToolExecution { .. } => err,
                    other => RobotError::tool(&tool_name, other.to_string()),
                };
                self.diagnose(err, Some(tool_name));
            }
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                self.diagnose(
                    RobotError::tool(&tool_name, format!("tool panicked: {detail}")),
                    Some(tool_name),
                );
            }
        }
        self.transition(RunState::Streaming);
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let text = if std::mem::take(&mut self.separator_pending) {
            format!("{BLOCK_SEPARATOR}{text}")
        } else {
            text.to_string()
        };
        self.emit_chunk(ChunkKind::Text, text, None);
    }

    /// Tool output and diagnostics sit in their own paragraph.
    fn push_block(&mut self, kind: ChunkKind, body: String, tool_name: Option<String>) {
        let text = if self.text.is_empty() {
            body
        } else {
            format!("{BLOCK_SEPARATOR}{body}")
        };
        self.emit_chunk(kind, text, tool_name);
        self.separator_pending = true;
    }

    fn emit_chunk(&mut self, kind: ChunkKind, text: String, tool_name: Option<String>) {
        self.text.push_str(&text);
        self.emitter.emit(RunEventPayload::Chunk {
            chunk: Chunk {
                kind,
                text,
                tool_name,
            },
        });
    }

    fn diagnose(&mut self, err: RobotError, tool_name: Option<String>) {
        tracing::warn!(run_id = %self.run_id, category = %err.category(), error = %err, "recoverable run error");
        self.diagnostics += 1;
        self.push_block(ChunkKind::Diagnostic, err.user_message(), tool_name);
    }

    fn finish(mut self) -> OrchestrationOutcome {
        self.transition(RunState::Finishing);
        for leftover in self.accumulator.drain_open() {
            self.diagnose(
                RobotError::ProtocolAnomaly(format!(
                    "tool invocation {} ({}) never completed",
                    leftover.invocation_id, leftover.tool_name
                )),
                Some(leftover.tool_name),
            );
        }
        let outcome = OrchestrationOutcome {
            text: std::mem::take(&mut self.text),
            tool_invocations: self.tool_invocations,
            diagnostics: self.diagnostics,
        };
        self.emitter.emit(RunEventPayload::Completed {
            outcome: outcome.clone(),
        });
        self.transition(RunState::Done);
        tracing::debug!(
            run_id = %self.run_id,
            tool_invocations = outcome.tool_invocations,
            diagnostics = outcome.diagnostics,
            text_len = outcome.text.len(),
            "orchestration run complete"
        );
        outcome
    }

    fn fail(mut self, err: RobotError) -> RobotError {
        tracing::warn!(run_id = %self.run_id, state = %self.state, error = %err, "orchestration run failed");
        self.emitter.emit(RunEventPayload::Failed {
            error: err.user_message(),
            category: err.category(),
        });
        self.transition(RunState::Failed);
        err
    }
}
