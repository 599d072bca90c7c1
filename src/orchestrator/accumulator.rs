//! Reassembly of tool arguments streamed as JSON fragments.

use std::collections::HashMap;

use crate::error::RobotError;
use crate::tools::ToolArguments;
use crate::types::InvocationId;

/// One in-flight tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocationState {
    pub invocation_id: InvocationId,
    pub tool_name: String,
    pub argument_buffer: String,
}

/// A finished invocation with parsed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedInvocation {
    pub invocation_id: InvocationId,
    pub tool_name: String,
    pub arguments: ToolArguments,
}

/// Per-run table of open tool invocations keyed by invocation id.
///
/// Fragments of several open invocations may interleave; each is appended
/// to its own buffer.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    open: HashMap<InvocationId, ToolInvocationState>,
    /// Start order, so leftovers are reported deterministically.
    order: Vec<InvocationId>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new invocation. A second start for an open id is an
    /// anomaly and leaves the existing buffer untouched.
    pub fn on_start(
        &mut self,
        invocation_id: &str,
        tool_name: &str,
    ) -> Result<(), RobotError> {
        if let Some(existing) = self.open.get(invocation_id) {
            return Err(RobotError::ProtocolAnomaly(format!(
                "tool invocation {invocation_id} started twice ({} then {tool_name})",
                existing.tool_name
            )));
        }
        self.open.insert(
            invocation_id.to_string(),
            ToolInvocationState {
                invocation_id: invocation_id.to_string(),
                tool_name: tool_name.to_string(),
                argument_buffer: String::new(),
            },
        );
        self.order.push(invocation_id.to_string());
        Ok(())
    }

    /// Append a fragment to an open invocation.
    pub fn on_fragment(&mut self, invocation_id: &str, fragment: &str) -> Result<(), RobotError> {
        match self.open.get_mut(invocation_id) {
            Some(state) => {
                state.argument_buffer.push_str(fragment);
                Ok(())
            }
            None => Err(RobotError::ProtocolAnomaly(format!(
                "argument fragment for unknown tool invocation {invocation_id}"
            ))),
        }
    }

    /// Close an invocation and parse its arguments.
    ///
    /// Returns `Ok(None)` when no invocation with this id is open. A parse
    /// failure consumes the invocation and reports the raw buffer.
    pub fn on_complete(
        &mut self,
        invocation_id: &str,
    ) -> Result<Option<CompletedInvocation>, RobotError> {
        let Some(state) = self.open.remove(invocation_id) else {
            return Ok(None);
        };
        self.order.retain(|id| id != invocation_id);

        let raw = state.argument_buffer.trim();
        let value = if raw.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(raw).map_err(|e| RobotError::ToolArgumentParse {
                tool_name: state.tool_name.clone(),
                raw: state.argument_buffer.clone(),
                message: e.to_string(),
            })?
        };

        Ok(Some(CompletedInvocation {
            invocation_id: state.invocation_id,
            tool_name: state.tool_name,
            arguments: ToolArguments::new(value),
        }))
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Remove and return every still-open invocation, oldest first.
    pub fn drain_open(&mut self) -> Vec<ToolInvocationState> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.open.remove(&id))
            .collect()
    }
}
