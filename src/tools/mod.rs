//! Tool system: schemas, tools, registries and result envelopes.

pub mod arguments;
pub mod envelope;
pub mod registry;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
pub use envelope::{ToolErrorItem, ToolResultEnvelope};
pub use registry::{StaticToolRegistry, ToolRegistry};
pub use tool::{AgentTool, Tool};
pub use types::{ParameterBuilder, ToolParameters, ToolSchema};
