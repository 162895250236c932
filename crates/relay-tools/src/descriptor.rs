use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// A tool as advertised by the capability backend: dot-separated name,
/// human description, and a JSON-Schema-shaped input schema.
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", alias = "input_schema", default)]
    pub input_schema: Value,
}

#[async_trait]
/// Trait contract for `ToolInvoker` behavior: the generic client through
/// which tool discovery and execution reach the capability backend.
pub trait ToolInvoker: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    async fn invoke(&self, name: &str, arguments: Value) -> Result<Value>;
}
