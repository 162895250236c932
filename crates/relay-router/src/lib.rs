//! Message routing between channel adapters and the conversation bridge.
//!
//! The router owns all per-(channel, user) session state, consults the
//! authorization gate on every inbound message, dispatches authorized
//! messages to the bridge one task per message, and delivers replies
//! back through the originating adapter. A proactive-send path exists
//! for server-initiated traffic and bypasses both the gate and history.

mod adapter;
mod router;
mod session;

pub use adapter::{ChannelAdapter, InboundMessage};
pub use router::{MessageRouter, GENERIC_FAILURE_REPLY};
pub use session::{SessionKey, SessionStore, DEFAULT_MAX_SESSION_TURNS};
