//! The conversation bridge and its bounded tool-use protocol.

use std::sync::Arc;

use futures_util::future::join_all;
use relay_ai::{ChatRequest, ChatUsage, LlmClient, Message, Provider, RelayAiError};
use relay_core::truncate_chars;
use relay_tools::{dot_name_for, is_mutating_operation, ToolInvoker, ToolRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::prompt::{build_system_prompt, PersonaLoader};

const TOOL_RESULT_LOG_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
/// Enumerates supported `BridgeError` values. Tool-side failures never
/// reach this type; only the provider boundary is fatal to a turn.
pub enum BridgeError {
    #[error("provider call failed: {0}")]
    Provider(#[from] RelayAiError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// One completed exchange in a session's history.
pub struct SessionTurn {
    pub user: String,
    pub assistant: String,
}

#[derive(Debug, Clone, PartialEq)]
/// An authorized inbound message as handed over by the router.
pub struct BridgeRequest {
    pub channel: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    /// Pre-fetched memory context for prompt assembly; opaque here.
    pub memory_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
/// Final reply text plus token usage summed over every provider round.
pub struct BridgeReply {
    pub text: String,
    pub usage: ChatUsage,
}

/// Public struct `ConversationBridge` used across Relay components.
pub struct ConversationBridge {
    config: BridgeConfig,
    client: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    invoker: Arc<dyn ToolInvoker>,
    persona: Option<Arc<dyn PersonaLoader>>,
}

impl ConversationBridge {
    pub fn new(
        config: BridgeConfig,
        client: Arc<dyn LlmClient>,
        registry: Arc<ToolRegistry>,
        invoker: Arc<dyn ToolInvoker>,
    ) -> Self {
        Self {
            config,
            client,
            registry,
            invoker,
            persona: None,
        }
    }

    pub fn with_persona(mut self, persona: Arc<dyn PersonaLoader>) -> Self {
        self.persona = Some(persona);
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Processes one authorized message against a history snapshot. The
    /// history is read-only here; the router owns the append.
    pub async fn process_message(
        &self,
        request: &BridgeRequest,
        history: &[SessionTurn],
    ) -> Result<BridgeReply, BridgeError> {
        let channel = request.channel.as_str();
        let tool_use = self.config.tool_use_enabled(channel) && self.registry.is_ready();
        let persona = self.persona.as_ref().and_then(|loader| loader.persona());
        let system_prompt = build_system_prompt(
            persona.as_deref(),
            request.memory_context.as_deref(),
            request.user_name.as_str(),
            channel,
            tool_use,
        );
        let model = self.config.resolve_model(channel).to_string();

        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        messages.push(Message::system(system_prompt));
        for turn in history {
            messages.push(Message::user(turn.user.as_str()));
            messages.push(Message::assistant_text(turn.assistant.as_str()));
        }
        messages.push(Message::user(request.text.as_str()));

        if tool_use {
            return self.call_with_tools(messages, model, channel).await;
        }

        let response = self
            .client
            .complete(self.chat_request(model, messages, Vec::new()))
            .await?;
        Ok(BridgeReply {
            text: response.message.text_content(),
            usage: response.usage,
        })
    }

    /// Runs the iterative tool-use protocol: at most `max_tool_rounds`
    /// provider calls with tools attached, then one forced text-only
    /// completion. Rounds are sequential; tool calls within a round run
    /// concurrently and their results rejoin in call order.
    async fn call_with_tools(
        &self,
        mut messages: Vec<Message>,
        model: String,
        channel: &str,
    ) -> Result<BridgeReply, BridgeError> {
        let tools = match self.config.provider {
            Provider::Anthropic => self.registry.anthropic_tools(),
            Provider::Ollama => self.registry.ollama_tools(),
        };
        let mut usage = ChatUsage::default();
        let mut segments: Vec<String> = Vec::new();

        for round in 0..self.config.max_tool_rounds {
            let response = self
                .client
                .complete(self.chat_request(model.clone(), messages.clone(), tools.clone()))
                .await?;
            usage.absorb(&response.usage);

            let assistant = response.message;
            let text = assistant.text_content();
            if !text.trim().is_empty() {
                segments.push(text);
            }
            let tool_calls = assistant.tool_calls();
            messages.push(assistant);

            if tool_calls.is_empty() {
                return Ok(BridgeReply {
                    text: segments.join("\n\n"),
                    usage,
                });
            }

            debug!(round, calls = tool_calls.len(), "executing requested tool calls");
            let results = join_all(tool_calls.iter().map(|call| {
                self.execute_tool_call(call.name.as_str(), call.arguments.clone(), channel)
            }))
            .await;
            for (call, result) in tool_calls.into_iter().zip(results) {
                debug!(
                    tool = %call.name,
                    preview = %truncate_chars(&result, TOOL_RESULT_LOG_PREVIEW_CHARS),
                    "tool result"
                );
                let is_error = is_error_payload(&result);
                messages.push(Message::tool_result(call.id, call.name, result, is_error));
            }
        }

        warn!(
            channel,
            budget = self.config.max_tool_rounds,
            "tool round budget exhausted; forcing text-only completion"
        );
        let response = self
            .client
            .complete(self.chat_request(model, messages, Vec::new()))
            .await?;
        usage.absorb(&response.usage);
        let text = response.message.text_content();
        if !text.trim().is_empty() {
            segments.push(text);
        }
        Ok(BridgeReply {
            text: segments.join("\n\n"),
            usage,
        })
    }

    /// Executes one requested tool call. Never fails: rejection and
    /// backend errors come back as `{"error": ...}` JSON strings that the
    /// loop feeds to the model as the tool result.
    pub async fn execute_tool_call(&self, name: &str, arguments: Value, channel: &str) -> String {
        if !self.registry.is_exposed(name) {
            return json!({ "error": format!("tool '{name}' is not available") }).to_string();
        }
        let dot_name = dot_name_for(name).unwrap_or(name);

        let mut arguments = if arguments.is_null() {
            json!({})
        } else {
            arguments
        };
        if is_mutating_operation(dot_name) {
            if let Some(object) = arguments.as_object_mut() {
                object
                    .entry("source_channel")
                    .or_insert_with(|| Value::String(channel.to_string()));
            }
        }

        match self.invoker.invoke(dot_name, arguments).await {
            Ok(result) => {
                serde_json::to_string(&result).unwrap_or_else(|_| result.to_string())
            }
            Err(error) => json!({ "error": format!("{error:#}") }).to_string(),
        }
    }

    fn chat_request(&self, model: String, messages: Vec<Message>, tools: Vec<Value>) -> ChatRequest {
        ChatRequest {
            model,
            messages,
            tools,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

fn is_error_payload(result: &str) -> bool {
    serde_json::from_str::<Value>(result)
        .ok()
        .and_then(|value| value.as_object().map(|object| object.contains_key("error")))
        .unwrap_or(false)
}
