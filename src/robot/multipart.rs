//! Two-part responses: an immediate answer plus a delayed follow-up.

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::RobotError;
use crate::types::{ConversationTurn, ModelMessage, ResponseEnvelope, Role};

/// Callback invoked once with the follow-up response.
pub type DelayedCallback = Box<dyn FnOnce(ResponseEnvelope) + Send + 'static>;

/// Callback invoked once with the immediate response, before the follow-up
/// can be delivered.
pub type ImmediateCallback = Box<dyn FnOnce(&ResponseEnvelope) + Send + 'static>;

/// Result of the multi-part contract.
///
/// The follow-up may already be running, but it is only observable through
/// `delayed`, after the caller holds `immediate`.
#[derive(Debug)]
pub struct MultiPartResponse {
    pub immediate: ResponseEnvelope,
    pub delayed: DelayedResponse,
}

/// Handle to the follow-up response, resolved by a background task.
#[derive(Debug)]
pub struct DelayedResponse {
    rx: oneshot::Receiver<ResponseEnvelope>,
    task: JoinHandle<()>,
}

impl DelayedResponse {
    pub(crate) fn new(rx: oneshot::Receiver<ResponseEnvelope>, task: JoinHandle<()>) -> Self {
        Self { rx, task }
    }

    /// Wait for the follow-up. A follow-up task that ends without a
    /// response resolves to an error envelope.
    pub async fn wait(self) -> ResponseEnvelope {
        match self.rx.await {
            Ok(envelope) => envelope,
            Err(_) => ResponseEnvelope::failed(
                "",
                &RobotError::Canceled("follow-up ended without a response".to_string()),
            ),
        }
    }

    /// Deliver the follow-up to `callback` from a background task.
    pub fn on_ready(self, callback: DelayedCallback) -> JoinHandle<()> {
        tokio::spawn(async move { callback(self.wait().await) })
    }

    /// Stop the follow-up if it has not produced a response yet.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Turn that asks for the follow-up: original history, the original turn
/// and the immediate reply, then `prompt` as a new user turn.
///
/// Only model output goes back as the assistant message: a failed reply
/// contributes its partial text, or nothing if there was none.
pub fn follow_up_turn(
    turn: &ConversationTurn,
    immediate: &ResponseEnvelope,
    prompt: &str,
) -> ConversationTurn {
    let mut history = turn.prior_history.clone();
    history.push(ModelMessage::new(turn.role, turn.text.clone()));
    let reply = immediate.partial_text();
    if !reply.is_empty() {
        history.push(ModelMessage::new(Role::Assistant, reply));
    }
    ConversationTurn::user(prompt).with_history(history)
}
