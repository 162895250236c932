//! The dispatch loop: auth gate, bridge hand-off, reply delivery.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use relay_access::AuthorizationConfig;
use relay_bridge::{BridgeRequest, ConversationBridge, SessionTurn};
use relay_core::current_unix_timestamp_ms;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::adapter::{ChannelAdapter, InboundMessage};
use crate::session::{SessionKey, SessionStore};

/// Sent to the user when a turn fails at the provider boundary.
pub const GENERIC_FAILURE_REPLY: &str =
    "Sorry, something went wrong while generating a reply. Please try again.";

const INGEST_QUEUE_DEPTH: usize = 64;

struct RouterInner {
    adapters: HashMap<String, Arc<dyn ChannelAdapter>>,
    authorization: Arc<AuthorizationConfig>,
    bridge: Arc<ConversationBridge>,
    sessions: Mutex<SessionStore>,
}

impl RouterInner {
    async fn deliver(&self, channel: &str, recipient: &str, text: &str) {
        let Some(adapter) = self.adapters.get(channel) else {
            warn!(channel, "reply for unknown channel adapter dropped");
            return;
        };
        if let Err(error) = adapter.send_message(recipient, text).await {
            warn!(channel, recipient, error = %format!("{error:#}"), "reply delivery failed");
        }
    }
}

/// Public struct `MessageRouter` used across Relay components.
///
/// Owns all session state between `start()` and `stop()`. One dispatch
/// task per inbound message; sessions never share mutable state across
/// (channel, user) keys.
pub struct MessageRouter {
    inner: Arc<RouterInner>,
    ingest_task: Option<JoinHandle<()>>,
}

impl MessageRouter {
    pub fn new(
        adapters: Vec<Arc<dyn ChannelAdapter>>,
        authorization: Arc<AuthorizationConfig>,
        bridge: Arc<ConversationBridge>,
        max_session_turns: usize,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.name().to_string(), adapter))
            .collect();
        Self {
            inner: Arc::new(RouterInner {
                adapters,
                authorization,
                bridge,
                sessions: Mutex::new(SessionStore::new(max_session_turns)),
            }),
            ingest_task: None,
        }
    }

    /// Attaches every adapter to a fresh ingest queue and starts the
    /// dispatch loop.
    pub async fn start(&mut self) -> Result<()> {
        if self.ingest_task.is_some() {
            bail!("router is already started");
        }
        let (tx, mut rx) = mpsc::channel::<InboundMessage>(INGEST_QUEUE_DEPTH);
        for adapter in self.inner.adapters.values() {
            adapter.start(tx.clone()).await?;
        }
        drop(tx);

        let inner = Arc::clone(&self.inner);
        self.ingest_task = Some(tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                tokio::spawn(dispatch_message(Arc::clone(&inner), message));
            }
        }));
        Ok(())
    }

    /// Detaches every adapter and ends the dispatch loop.
    pub async fn stop(&mut self) {
        for adapter in self.inner.adapters.values() {
            if let Err(error) = adapter.stop().await {
                warn!(adapter = adapter.name(), error = %format!("{error:#}"), "adapter stop failed");
            }
        }
        if let Some(task) = self.ingest_task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.ingest_task.is_some()
    }

    /// Server-initiated delivery: bypasses the auth gate and session
    /// history. True iff delivery was attempted against a known, running
    /// adapter — a failed send still counts as attempted.
    pub async fn send_proactive(&self, channel: &str, user_id: &str, text: &str) -> bool {
        let Some(adapter) = self.inner.adapters.get(channel) else {
            debug!(channel, "proactive send to unknown adapter");
            return false;
        };
        if !adapter.is_running() {
            debug!(channel, "proactive send to stopped adapter");
            return false;
        }
        if let Err(error) = adapter.send_message(user_id, text).await {
            warn!(channel, user_id, error = %format!("{error:#}"), "proactive send failed");
        }
        true
    }

    /// Diagnostic snapshot: per-adapter status plus session counts.
    pub async fn status(&self) -> Value {
        let adapters = self
            .inner
            .adapters
            .iter()
            .map(|(name, adapter)| (name.clone(), adapter.status()))
            .collect::<serde_json::Map<_, _>>();
        json!({
            "timestamp_unix_ms": current_unix_timestamp_ms(),
            "running": self.is_running(),
            "sessions": self.inner.sessions.lock().await.session_count(),
            "adapters": adapters,
        })
    }
}

/// One inbound message: gate, snapshot, bridge, append, reply. History
/// mutation happens only after the bridge returns, so two concurrent
/// messages for the same session both see the pre-dispatch snapshot and
/// the later completion wins the append.
async fn dispatch_message(inner: Arc<RouterInner>, message: InboundMessage) {
    if !inner
        .authorization
        .is_authorized(message.channel.as_str(), message.user_id.as_str())
    {
        debug!(
            channel = %message.channel,
            user_id = %message.user_id,
            "dropping unauthorized message"
        );
        return;
    }

    let key = SessionKey::new(message.channel.as_str(), message.user_id.as_str());
    let history = inner.sessions.lock().await.snapshot(&key);
    let request = BridgeRequest {
        channel: message.channel.clone(),
        user_id: message.user_id.clone(),
        user_name: message.user_name.clone(),
        text: message.text.clone(),
        memory_context: message.memory_context.clone(),
    };

    match inner.bridge.process_message(&request, &history).await {
        Ok(reply) => {
            inner.sessions.lock().await.append(
                key,
                SessionTurn {
                    user: message.text.clone(),
                    assistant: reply.text.clone(),
                },
            );
            debug!(
                channel = %message.channel,
                user_id = %message.user_id,
                input_tokens = reply.usage.input_tokens,
                output_tokens = reply.usage.output_tokens,
                "turn completed"
            );
            inner
                .deliver(message.channel.as_str(), message.reply_recipient(), &reply.text)
                .await;
        }
        Err(error) => {
            warn!(
                channel = %message.channel,
                user_id = %message.user_id,
                error = %error,
                "bridge failed; sending generic failure reply"
            );
            inner
                .deliver(
                    message.channel.as_str(),
                    message.reply_recipient(),
                    GENERIC_FAILURE_REPLY,
                )
                .await;
        }
    }
}
