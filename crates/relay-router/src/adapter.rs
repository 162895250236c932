//! Channel adapter contract.
//!
//! Adapters own platform connections and formatting; the router only
//! needs an inbound event feed, an outbound send, and lifecycle/status
//! reporting.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
/// Public struct `InboundMessage` used across Relay components.
pub struct InboundMessage {
    pub channel: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    /// Pre-fetched memory context, when the ingest layer supplies one.
    pub memory_context: Option<String>,
    /// Transport reply target; empty means "reply to the sender".
    pub reply_target: String,
    pub metadata: BTreeMap<String, Value>,
}

impl InboundMessage {
    pub fn reply_recipient(&self) -> &str {
        if self.reply_target.trim().is_empty() {
            self.user_id.as_str()
        } else {
            self.reply_target.as_str()
        }
    }
}

#[async_trait]
/// Trait contract for `ChannelAdapter` behavior.
pub trait ChannelAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Attaches the adapter's inbound listener to the router's ingest
    /// queue. Called by `MessageRouter::start`.
    async fn start(&self, inbound: mpsc::Sender<InboundMessage>) -> Result<()>;

    /// Detaches the listener and releases the transport.
    async fn stop(&self) -> Result<()>;

    async fn send_message(&self, recipient: &str, text: &str) -> Result<()>;

    fn is_running(&self) -> bool;

    /// Transport-specific status summary for diagnostics.
    fn status(&self) -> Value;
}
