//! Sender authorization for the Relay gateway.
//!
//! Decides whether a (channel, user) pair may reach the conversation
//! bridge, from a global allowlist plus per-channel allowlists. Decisions
//! are pure; configuration-hygiene findings are surfaced as `tracing`
//! warnings and never change the boolean outcome.

mod allowlist;

pub use allowlist::{
    load_authorization_config, parse_authorization_config, suspect_handle_entries,
    AuthorizationConfig, UserId, AUTHORIZATION_CONFIG_SCHEMA_VERSION,
};
