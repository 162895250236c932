//! Bridge configuration: provider family, model defaults, per-channel
//! overrides, tool-use policy, and the round budget.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use relay_ai::Provider;
use serde::{Deserialize, Serialize};

pub const BRIDGE_CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

fn bridge_config_schema_version() -> u32 {
    BRIDGE_CONFIG_SCHEMA_VERSION
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1".to_string()
}

fn default_max_tool_rounds() -> usize {
    DEFAULT_MAX_TOOL_ROUNDS
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
/// Per-channel overrides. Empty model strings mean "no override".
pub struct ChannelOverride {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub ollama_model: String,
    #[serde(default)]
    pub tool_use: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Public struct `BridgeConfig` used across Relay components.
pub struct BridgeConfig {
    #[serde(default = "bridge_config_schema_version")]
    pub schema_version: u32,
    pub provider: Provider,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelOverride>,
    #[serde(default)]
    pub tool_use: Option<bool>,
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            schema_version: BRIDGE_CONFIG_SCHEMA_VERSION,
            provider: Provider::Anthropic,
            anthropic_model: default_anthropic_model(),
            ollama_model: default_ollama_model(),
            channels: BTreeMap::new(),
            tool_use: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            max_tokens: None,
            temperature: None,
        }
    }
}

impl BridgeConfig {
    /// Effective model for a channel: a non-empty per-channel override of
    /// the active provider family wins, else the family's global default.
    /// Unknown channels behave as if no override exists.
    pub fn resolve_model(&self, channel: &str) -> &str {
        let override_entry = self.channels.get(channel);
        let (channel_model, global_model) = match self.provider {
            Provider::Anthropic => (
                override_entry.map(|entry| entry.model.as_str()),
                self.anthropic_model.as_str(),
            ),
            Provider::Ollama => (
                override_entry.map(|entry| entry.ollama_model.as_str()),
                self.ollama_model.as_str(),
            ),
        };
        channel_model
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(global_model)
    }

    /// Tool-use policy: channel override, else the global flag, else the
    /// provider default (enabled for Anthropic, disabled for Ollama).
    pub fn tool_use_enabled(&self, channel: &str) -> bool {
        if let Some(value) = self.channels.get(channel).and_then(|entry| entry.tool_use) {
            return value;
        }
        if let Some(value) = self.tool_use {
            return value;
        }
        matches!(self.provider, Provider::Anthropic)
    }
}

pub fn load_bridge_config(path: &Path) -> Result<BridgeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bridge config {}", path.display()))?;
    parse_bridge_config(&raw).with_context(|| format!("invalid bridge config {}", path.display()))
}

pub fn parse_bridge_config(raw: &str) -> Result<BridgeConfig> {
    let parsed =
        serde_json::from_str::<BridgeConfig>(raw).context("failed to parse bridge config")?;
    validate_bridge_config(&parsed)?;
    Ok(parsed)
}

fn validate_bridge_config(config: &BridgeConfig) -> Result<()> {
    if config.schema_version != BRIDGE_CONFIG_SCHEMA_VERSION {
        bail!(
            "unsupported bridge config schema_version {} (expected {})",
            config.schema_version,
            BRIDGE_CONFIG_SCHEMA_VERSION
        );
    }
    if config.max_tool_rounds == 0 {
        bail!("max_tool_rounds must be greater than 0");
    }
    if config.anthropic_model.trim().is_empty() || config.ollama_model.trim().is_empty() {
        bail!("provider default models cannot be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_override(provider: Provider, entry: ChannelOverride) -> BridgeConfig {
        let mut config = BridgeConfig {
            provider,
            ..BridgeConfig::default()
        };
        config.channels.insert("discord".to_string(), entry);
        config
    }

    #[test]
    fn unit_resolve_model_prefers_nonempty_channel_override() {
        let config = config_with_override(
            Provider::Anthropic,
            ChannelOverride {
                model: "claude-haiku-4-5-20251001".to_string(),
                ..ChannelOverride::default()
            },
        );
        assert_eq!(config.resolve_model("discord"), "claude-haiku-4-5-20251001");
        assert_eq!(config.resolve_model("telegram"), config.anthropic_model);
    }

    #[test]
    fn unit_resolve_model_treats_empty_override_as_absent() {
        let config = config_with_override(Provider::Anthropic, ChannelOverride::default());
        assert_eq!(config.resolve_model("discord"), config.anthropic_model);
    }

    #[test]
    fn unit_resolve_model_uses_family_specific_fields() {
        let config = config_with_override(
            Provider::Ollama,
            ChannelOverride {
                model: "claude-haiku-4-5-20251001".to_string(),
                ollama_model: "qwen2.5".to_string(),
                tool_use: None,
            },
        );
        assert_eq!(config.resolve_model("discord"), "qwen2.5");
    }

    #[test]
    fn unit_tool_use_precedence_channel_then_global_then_provider() {
        let mut config = config_with_override(
            Provider::Ollama,
            ChannelOverride {
                tool_use: Some(true),
                ..ChannelOverride::default()
            },
        );
        assert!(config.tool_use_enabled("discord"));
        assert!(!config.tool_use_enabled("telegram"));

        config.tool_use = Some(true);
        assert!(config.tool_use_enabled("telegram"));

        config.channels.get_mut("discord").expect("override").tool_use = Some(false);
        assert!(!config.tool_use_enabled("discord"));
    }

    #[test]
    fn unit_tool_use_defaults_by_provider_family() {
        let anthropic = BridgeConfig::default();
        assert!(anthropic.tool_use_enabled("anywhere"));

        let ollama = BridgeConfig {
            provider: Provider::Ollama,
            ..BridgeConfig::default()
        };
        assert!(!ollama.tool_use_enabled("anywhere"));
    }

    #[test]
    fn functional_parse_fills_defaults_and_validates() {
        let config = parse_bridge_config(r#"{ "provider": "anthropic" }"#).expect("parse config");
        assert_eq!(config.max_tool_rounds, DEFAULT_MAX_TOOL_ROUNDS);
        assert_eq!(config.anthropic_model, "claude-sonnet-4-20250514");
        assert!(config.channels.is_empty());
    }

    #[test]
    fn functional_load_reads_config_from_disk() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("bridge.json");
        std::fs::write(
            &path,
            r#"{ "provider": "ollama", "channels": { "discord": { "ollama_model": "qwen2.5" } } }"#,
        )
        .expect("write config");
        let config = load_bridge_config(&path).expect("load config");
        assert_eq!(config.provider, Provider::Ollama);
        assert_eq!(config.resolve_model("discord"), "qwen2.5");
    }

    #[test]
    fn regression_zero_round_budget_is_rejected() {
        let error = parse_bridge_config(r#"{ "provider": "anthropic", "max_tool_rounds": 0 }"#)
            .expect_err("zero budget should fail");
        assert!(format!("{error:#}").contains("max_tool_rounds"));
    }

    #[test]
    fn regression_unknown_provider_is_rejected_at_parse() {
        parse_bridge_config(r#"{ "provider": "openai" }"#)
            .expect_err("unknown provider family should fail");
    }
}
