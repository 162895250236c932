//! Fetch-once registry over the backend's advertised tools.

use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::is_exposed_name;
use crate::descriptor::{ToolDescriptor, ToolInvoker};
use crate::dialects::{anthropic_tool, ollama_tool};

#[derive(Debug, Clone, Default)]
/// Public struct `ToolRegistry` used across Relay components.
///
/// Read-only after initialization; shared across sessions without
/// locking. "No tools" is a legitimate state, not an error.
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
    ready: bool,
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Discovers the backend's full tool list once. Transport failure
    /// leaves the registry empty-but-valid rather than propagating.
    pub async fn initialize(invoker: &dyn ToolInvoker) -> Self {
        let mut registry = Self::empty();
        registry.refresh(invoker).await;
        registry
    }

    /// Re-fetches the descriptor list, replacing the cached one.
    pub async fn refresh(&mut self, invoker: &dyn ToolInvoker) {
        match invoker.list_tools().await {
            Ok(descriptors) => {
                for descriptor in &descriptors {
                    if !is_exposed_name(&descriptor.name) {
                        debug!(tool = %descriptor.name, "advertised tool is not exposed");
                    }
                }
                self.descriptors = descriptors;
            }
            Err(error) => {
                warn!(error = %error, "tool discovery failed; continuing without tools");
                self.descriptors = Vec::new();
            }
        }
        let ready = self.exposed_descriptors().next().is_some();
        self.ready = ready;
    }

    /// Allowlist membership, accepting dot or underscore naming.
    pub fn is_exposed(&self, name: &str) -> bool {
        is_exposed_name(name)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of discovered tools that pass the exposure allowlist.
    pub fn tool_count(&self) -> usize {
        self.exposed_descriptors().count()
    }

    /// Anthropic-dialect rendering of every exposed tool. Pure projection
    /// over the cached list; never re-fetches.
    pub fn anthropic_tools(&self) -> Vec<Value> {
        self.exposed_descriptors().map(anthropic_tool).collect()
    }

    /// Ollama-dialect rendering of every exposed tool.
    pub fn ollama_tools(&self) -> Vec<Value> {
        self.exposed_descriptors().map(ollama_tool).collect()
    }

    fn exposed_descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.descriptors
            .iter()
            .filter(|descriptor| is_exposed_name(&descriptor.name))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;

    struct StaticInvoker {
        tools: Vec<ToolDescriptor>,
        fail_listing: bool,
    }

    #[async_trait]
    impl ToolInvoker for StaticInvoker {
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
            if self.fail_listing {
                bail!("backend unreachable");
            }
            Ok(self.tools.clone())
        }

        async fn invoke(&self, _name: &str, _arguments: Value) -> Result<Value> {
            Ok(json!({ "ok": true }))
        }
    }

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: format!("{name} operation"),
            input_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    #[tokio::test]
    async fn unit_discovery_failure_leaves_registry_empty_but_valid() {
        let invoker = StaticInvoker {
            tools: Vec::new(),
            fail_listing: true,
        };
        let registry = ToolRegistry::initialize(&invoker).await;
        assert!(!registry.is_ready());
        assert_eq!(registry.tool_count(), 0);
        assert!(registry.anthropic_tools().is_empty());
        assert!(registry.ollama_tools().is_empty());
    }

    #[tokio::test]
    async fn functional_projections_filter_to_exposed_tools_only() {
        let invoker = StaticInvoker {
            tools: vec![
                descriptor("memory.recall"),
                descriptor("memory.remember"),
                descriptor("memory.purge"),
                descriptor("filesystem.read"),
            ],
            fail_listing: false,
        };
        let registry = ToolRegistry::initialize(&invoker).await;
        assert!(registry.is_ready());
        assert_eq!(registry.tool_count(), 2);

        let anthropic = registry.anthropic_tools();
        let names = anthropic
            .iter()
            .map(|tool| tool["name"].as_str().unwrap_or_default().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["memory_recall", "memory_remember"]);

        let ollama = registry.ollama_tools();
        assert_eq!(ollama[0]["function"]["name"], "memory.recall");
        assert_eq!(ollama[1]["function"]["name"], "memory.remember");
    }

    #[tokio::test]
    async fn functional_is_exposed_accepts_both_naming_forms() {
        let registry = ToolRegistry::empty();
        assert!(registry.is_exposed("memory.recall"));
        assert!(registry.is_exposed("memory_recall"));
        assert!(!registry.is_exposed("memory.purge"));
        assert!(!registry.is_exposed("memory_purge"));
    }

    #[tokio::test]
    async fn regression_backend_advertising_only_blocked_tools_is_not_ready() {
        let invoker = StaticInvoker {
            tools: vec![descriptor("memory.purge"), descriptor("memory.merge_entities")],
            fail_listing: false,
        };
        let registry = ToolRegistry::initialize(&invoker).await;
        assert!(!registry.is_ready());
        assert_eq!(registry.tool_count(), 0);
    }

    #[tokio::test]
    async fn regression_refresh_replaces_previous_descriptor_list() {
        let invoker = StaticInvoker {
            tools: vec![descriptor("memory.recall")],
            fail_listing: false,
        };
        let mut registry = ToolRegistry::initialize(&invoker).await;
        assert_eq!(registry.tool_count(), 1);

        let failing = StaticInvoker {
            tools: Vec::new(),
            fail_listing: true,
        };
        registry.refresh(&failing).await;
        assert!(!registry.is_ready());
        assert_eq!(registry.tool_count(), 0);
    }
}
