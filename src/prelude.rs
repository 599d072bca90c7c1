//! Convenience re-exports for common use.

pub use crate::config::{RobotConfig, RobotSettings};
pub use crate::error::{Result, RobotError};
pub use crate::models::LanguageModel;
pub use crate::orchestrator::{Chunk, ChunkKind, OrchestrationOutcome, Orchestrator};
pub use crate::provider::ModelProvider;
pub use crate::robot::{ChatRobot, MultiPartResponse, Robot, StreamHandler};
pub use crate::tools::{
    AgentTool, StaticToolRegistry, Tool, ToolArguments, ToolParameters, ToolRegistry,
    ToolResultEnvelope,
};
pub use crate::types::{ConversationTurn, ModelMessage, ResponseEnvelope, Role};
