//! Bounded per-(channel, user) conversation history.
//!
//! Insertion order is significant; the oldest turn is evicted once the
//! configured cap is exceeded. The store hands out snapshots — the
//! bridge never sees the live deque.

use std::collections::{HashMap, VecDeque};

use relay_bridge::SessionTurn;

pub const DEFAULT_MAX_SESSION_TURNS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Public struct `SessionKey` used across Relay components.
pub struct SessionKey {
    pub channel: String,
    pub user_id: String,
}

impl SessionKey {
    pub fn new(channel: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            user_id: user_id.into(),
        }
    }
}

#[derive(Debug)]
/// Public struct `SessionStore` used across Relay components.
pub struct SessionStore {
    sessions: HashMap<SessionKey, VecDeque<SessionTurn>>,
    max_turns: usize,
}

impl SessionStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            max_turns: max_turns.max(1),
        }
    }

    /// Cloned history for a session, oldest first. Unknown sessions are
    /// empty, not an error.
    pub fn snapshot(&self, key: &SessionKey) -> Vec<SessionTurn> {
        self.sessions
            .get(key)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Appends a completed turn, evicting the oldest past the cap.
    pub fn append(&mut self, key: SessionKey, turn: SessionTurn) {
        let turns = self.sessions.entry(key).or_default();
        turns.push_back(turn);
        while turns.len() > self.max_turns {
            turns.pop_front();
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSION_TURNS)
    }
}
