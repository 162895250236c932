//! Provider call contract consumed by the conversation bridge.
mod provider;
mod types;

pub use provider::Provider;
pub use types::{
    ChatRequest, ChatResponse, ChatUsage, ContentBlock, LlmClient, Message, MessageRole,
    RelayAiError, ToolCall,
};
