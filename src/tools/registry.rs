//! Tool registry: name -> executable tool, shared read-only across runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::envelope::ToolResultEnvelope;
use super::tool::Tool;
use super::types::ToolSchema;
use crate::error::RobotError;

/// Dispatch table consumed by the orchestrator.
///
/// Implementations must be safe to call from many concurrent runs; any
/// mutable state a tool needs is that tool's own business.
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    /// Schemas advertised to the provider.
    fn list_tools(&self) -> Vec<ToolSchema>;

    /// Execute a tool by name.
    async fn execute(
        &self,
        name: &str,
        args: ToolArguments,
    ) -> Result<ToolResultEnvelope, RobotError>;
}

/// Registry over a fixed set of [`Tool`]s.
#[derive(Default, Clone)]
pub struct StaticToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl StaticToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any previous tool with the same name.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl ToolRegistry for StaticToolRegistry {
    fn list_tools(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|tool| tool.schema()).collect()
    }

    async fn execute(
        &self,
        name: &str,
        args: ToolArguments,
    ) -> Result<ToolResultEnvelope, RobotError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| RobotError::tool(name, format!("Tool '{name}' not found")))?;
        tool.execute(&args).await
    }
}

impl std::fmt::Debug for StaticToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
