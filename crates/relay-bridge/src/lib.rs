//! Conversation bridge between channel sessions and the LLM provider.
//!
//! Resolves the effective model per (provider, channel), assembles the
//! system prompt, and runs the bounded tool-use protocol: the model may
//! request exposed memory-service operations for a configured number of
//! rounds before a final text-only completion is forced. Tool failures
//! never escape the executor; provider failures surface as one
//! `BridgeError` per turn.

mod bridge;
mod config;
mod prompt;

pub use bridge::{BridgeError, BridgeReply, BridgeRequest, ConversationBridge, SessionTurn};
pub use config::{
    load_bridge_config, parse_bridge_config, BridgeConfig, ChannelOverride,
    BRIDGE_CONFIG_SCHEMA_VERSION, DEFAULT_MAX_TOOL_ROUNDS,
};
pub use prompt::{build_system_prompt, PersonaLoader};
