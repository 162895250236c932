//! Tool capability discovery, exposure policy, and schema dialects.
//!
//! The registry fetches the memory service's advertised tools once,
//! restricts them to a fixed exposed allowlist, and renders each schema
//! in the two provider dialects the bridge speaks. Discovery failure is a
//! legitimate state: the registry stays empty-but-valid and the gateway
//! runs without tools.

mod catalog;
mod descriptor;
mod dialects;
mod registry;

pub use catalog::{
    dot_name_for, is_exposed_name, is_mutating_operation, underscore_name, BLOCKED_TOOL_NAMES,
    EXPOSED_TOOL_NAMES, MUTATING_TOOL_NAMES,
};
pub use descriptor::{ToolDescriptor, ToolInvoker};
pub use dialects::{anthropic_tool, is_valid_anthropic_tool_name, ollama_tool};
pub use registry::ToolRegistry;
