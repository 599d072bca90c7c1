//! Response adapters: streaming, immediate and multi-part contracts over
//! one orchestration engine.

pub mod handler;
pub mod multipart;

pub use handler::{BufferingHandler, StreamHandler};
pub use multipart::{
    follow_up_turn, DelayedCallback, DelayedResponse, ImmediateCallback, MultiPartResponse,
};

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::config::{RobotConfig, RobotSettings};
use crate::error::RobotError;
use crate::orchestrator::{Orchestrator, RunEvent, RunEventPayload, RunEventSink};
use crate::provider::create_provider;
use crate::tools::ToolRegistry;
use crate::types::{estimate_tokens, ConversationTurn, ResponseEnvelope};

/// Caller-facing chat contract.
///
/// All three response styles run the same orchestration; they differ only
/// in how output reaches the caller. Failures never escape as `Err`: they
/// come back as error-flavored envelopes.
#[async_trait]
pub trait ChatRobot: Send + Sync {
    /// Rough token count for `text`.
    fn estimate_tokens(&self, text: &str) -> usize {
        estimate_tokens(text)
    }

    /// Deliver chunks to `handler` as they are produced.
    async fn respond_streaming(
        &self,
        turn: ConversationTurn,
        handler: Arc<dyn StreamHandler>,
    ) -> ResponseEnvelope;

    /// Buffer the whole run and return one envelope.
    async fn respond_immediate(&self, turn: ConversationTurn) -> ResponseEnvelope;

    /// Return the immediate envelope, then run a follow-up turn in the
    /// background.
    async fn respond_multi_part(&self, turn: ConversationTurn) -> MultiPartResponse;

    /// Callback form of [`respond_multi_part`](Self::respond_multi_part).
    ///
    /// `on_immediate` receives the immediate envelope first; `on_delayed`
    /// is attached only after it returns, so it always fires second, once.
    /// The immediate envelope is also returned.
    async fn respond_multi_part_with(
        &self,
        turn: ConversationTurn,
        on_immediate: ImmediateCallback,
        on_delayed: DelayedCallback,
    ) -> ResponseEnvelope {
        let MultiPartResponse { immediate, delayed } = self.respond_multi_part(turn).await;
        on_immediate(&immediate);
        delayed.on_ready(on_delayed);
        immediate
    }
}

/// Default [`ChatRobot`] over an [`Orchestrator`].
#[derive(Clone)]
pub struct Robot {
    orchestrator: Orchestrator,
    settings: Arc<RobotSettings>,
}

impl Robot {
    pub fn new(orchestrator: Orchestrator, settings: RobotSettings) -> Self {
        Self {
            orchestrator,
            settings: Arc::new(settings),
        }
    }

    /// Build a robot from settings: resolve the model, create its provider
    /// and wire the registry in.
    pub fn from_settings(
        settings: RobotSettings,
        config: &RobotConfig,
        tools: Arc<dyn ToolRegistry>,
    ) -> Result<Self, RobotError> {
        let model = settings.language_model()?;
        let provider = create_provider(&model, config)?;
        let orchestrator = Orchestrator::new(Arc::from(provider), tools)
            .with_system_prompt(settings.system_prompt.clone())
            .with_max_tokens(settings.max_tokens)
            .with_temperature(settings.temperature);
        tracing::info!(model = %model, "robot ready");
        Ok(Self::new(orchestrator, settings))
    }

    pub fn settings(&self) -> &RobotSettings {
        &self.settings
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}

#[async_trait]
impl ChatRobot for Robot {
    async fn respond_streaming(
        &self,
        turn: ConversationTurn,
        handler: Arc<dyn StreamHandler>,
    ) -> ResponseEnvelope {
        let delivered = Arc::new(Mutex::new(String::new()));
        let sink: RunEventSink = {
            let handler = Arc::clone(&handler);
            let delivered = Arc::clone(&delivered);
            Arc::new(move |event: RunEvent| match event.payload {
                RunEventPayload::Started => handler.on_start(),
                RunEventPayload::Chunk { chunk } => {
                    delivered
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .push_str(&chunk.text);
                    handler.on_chunk(&chunk);
                }
                RunEventPayload::FullMessage { tool_name, message } => {
                    handler.on_full_message(&tool_name, &message)
                }
                // Terminal signalling happens below, once the run result
                // (or a timeout) is known.
                RunEventPayload::Completed { .. } | RunEventPayload::Failed { .. } => {}
            })
        };

        let result = self
            .orchestrator
            .run_with_timeout(&turn, Some(sink), self.settings.response_timeout())
            .await;

        match result {
            Ok(outcome) => {
                handler.on_finish(&outcome.text);
                ResponseEnvelope::assistant(outcome.text)
            }
            Err(err) => {
                let partial = delivered
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .clone();
                tracing::warn!(error = %err, partial_len = partial.len(), "streaming response failed");
                handler.on_error(&err);
                handler.on_finish(&partial);
                ResponseEnvelope::failed(&partial, &err)
            }
        }
    }

    async fn respond_immediate(&self, turn: ConversationTurn) -> ResponseEnvelope {
        let buffer = Arc::new(BufferingHandler::new());
        let envelope = self.respond_streaming(turn, buffer.clone()).await;
        if envelope.is_error() {
            envelope
        } else {
            ResponseEnvelope::assistant(buffer.text())
        }
    }

    async fn respond_multi_part(&self, turn: ConversationTurn) -> MultiPartResponse {
        let immediate = self.respond_immediate(turn.clone()).await;

        let follow_up = follow_up_turn(&turn, &immediate, &self.settings.follow_up_prompt);
        let delay = self.settings.follow_up_delay();
        let robot = self.clone();
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let envelope = robot.respond_immediate(follow_up).await;
            if tx.send(envelope).is_err() {
                tracing::debug!("follow-up response dropped by caller");
            }
        });

        MultiPartResponse {
            immediate,
            delayed: DelayedResponse::new(rx, task),
        }
    }
}
