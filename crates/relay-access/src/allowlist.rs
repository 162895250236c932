//! Allowlist configuration schema and the authorization decision.
//!
//! Identifiers are compared as normalized strings regardless of whether
//! they arrive as JSON numbers or strings, and regardless of the Rust
//! type at the call site. A user is authorized for a channel iff the id
//! is in the global set or that channel's set; an unknown channel is an
//! empty set, not an error.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use relay_core::normalize_optional_text;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

pub const AUTHORIZATION_CONFIG_SCHEMA_VERSION: u32 = 1;

fn authorization_config_schema_version() -> u32 {
    AUTHORIZATION_CONFIG_SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Normalized user identifier accepted from numeric or string sources.
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|ch| ch.is_ascii_digit())
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }
}

impl From<String> for UserId {
    fn from(raw: String) -> Self {
        Self(raw.trim().to_string())
    }
}

impl From<u64> for UserId {
    fn from(raw: u64) -> Self {
        Self(raw.to_string())
    }
}

impl From<i64> for UserId {
    fn from(raw: i64) -> Self {
        Self(raw.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Public struct `AuthorizationConfig` used across Relay components.
pub struct AuthorizationConfig {
    #[serde(default = "authorization_config_schema_version")]
    pub schema_version: u32,
    #[serde(default, deserialize_with = "deserialize_id_set")]
    pub allowed_users: BTreeSet<String>,
    #[serde(default, deserialize_with = "deserialize_channel_sets")]
    pub channels: BTreeMap<String, BTreeSet<String>>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            schema_version: AUTHORIZATION_CONFIG_SCHEMA_VERSION,
            allowed_users: BTreeSet::new(),
            channels: BTreeMap::new(),
        }
    }
}

impl AuthorizationConfig {
    /// Returns true iff `user_id` is in the global set or the channel's
    /// set. Absent channel means an empty channel set. Emits hygiene
    /// warnings on a miss when the incoming id is numeric but configured
    /// entries look like display-name handles; the outcome is unaffected.
    pub fn is_authorized(&self, channel: &str, user_id: impl Into<UserId>) -> bool {
        let user_id = user_id.into();
        let channel_set = self.channels.get(channel);

        if self.allowed_users.contains(user_id.as_str())
            || channel_set
                .map(|set| set.contains(user_id.as_str()))
                .unwrap_or(false)
        {
            return true;
        }

        if user_id.is_numeric() {
            let configured = self
                .allowed_users
                .iter()
                .chain(channel_set.into_iter().flatten());
            for entry in suspect_handle_entries(configured) {
                warn!(
                    channel,
                    entry,
                    "allowlist entry looks like a display-name handle, not a user id"
                );
            }
        }
        debug!(channel, user_id = %user_id, "no allowlist match");
        false
    }
}

/// Returns configured entries that look like display-name handles rather
/// than platform user ids: a leading `@`, or no ASCII digit at all.
pub fn suspect_handle_entries<'a>(
    entries: impl IntoIterator<Item = &'a String>,
) -> Vec<&'a str> {
    entries
        .into_iter()
        .map(String::as_str)
        .filter(|entry| entry.starts_with('@') || !entry.chars().any(|ch| ch.is_ascii_digit()))
        .collect()
}

pub fn load_authorization_config(path: &Path) -> Result<AuthorizationConfig> {
    if !path.exists() {
        return Ok(AuthorizationConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read authorization config {}", path.display()))?;
    parse_authorization_config(&raw)
        .with_context(|| format!("invalid authorization config {}", path.display()))
}

pub fn parse_authorization_config(raw: &str) -> Result<AuthorizationConfig> {
    let mut parsed = serde_json::from_str::<AuthorizationConfig>(raw)
        .context("failed to parse authorization config")?;
    normalize_authorization_config(&mut parsed)?;
    Ok(parsed)
}

fn normalize_authorization_config(config: &mut AuthorizationConfig) -> Result<()> {
    if config.schema_version != AUTHORIZATION_CONFIG_SCHEMA_VERSION {
        bail!(
            "unsupported authorization config schema_version {} (expected {})",
            config.schema_version,
            AUTHORIZATION_CONFIG_SCHEMA_VERSION
        );
    }

    let channels = std::mem::take(&mut config.channels);
    for (channel, users) in channels {
        let Some(channel) = normalize_optional_text(Some(channel.as_str())) else {
            bail!("channel name cannot be empty");
        };
        for entry in suspect_handle_entries(users.iter()) {
            warn!(
                channel = %channel,
                entry,
                "allowlist entry looks like a display-name handle, not a user id"
            );
        }
        config.channels.insert(channel, users);
    }
    for entry in suspect_handle_entries(config.allowed_users.iter()) {
        warn!(
            entry,
            "allowlist entry looks like a display-name handle, not a user id"
        );
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdEntry {
    Number(serde_json::Number),
    Text(String),
}

impl RawIdEntry {
    fn normalized(self) -> Option<String> {
        match self {
            Self::Number(number) => Some(number.to_string()),
            Self::Text(text) => normalize_optional_text(Some(text.as_str())),
        }
    }
}

fn deserialize_id_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<RawIdEntry>::deserialize(deserializer)?;
    Ok(raw.into_iter().filter_map(RawIdEntry::normalized).collect())
}

fn deserialize_channel_sets<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, BTreeSet<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Vec<RawIdEntry>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(channel, entries)| {
            (
                channel,
                entries
                    .into_iter()
                    .filter_map(RawIdEntry::normalized)
                    .collect(),
            )
        })
        .collect())
}
