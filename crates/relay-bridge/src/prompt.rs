//! System prompt assembly.

/// Trait contract for `PersonaLoader` behavior. Implementations cache on
/// their side; `None` selects the built-in default persona.
pub trait PersonaLoader: Send + Sync {
    fn persona(&self) -> Option<String>;
}

const DEFAULT_PERSONA: &str = "You are Relay, an assistant that connects chat channels to a \
shared long-term memory service. Answer directly and keep replies suited to a chat surface.";

const MEMORY_TOOLS_INSTRUCTIONS: &str = "You may call the available memory tools to look up \
additional context before answering. Prefer searching memory when the conversation references \
earlier discussions, people, decisions, or stored facts, and fold what you find into your reply.";

/// Builds the per-turn system prompt: persona, channel/user identity
/// lines, optional verbatim memory context, and tool instructions when
/// tool use is active for the channel.
pub fn build_system_prompt(
    persona: Option<&str>,
    memory_context: Option<&str>,
    user_name: &str,
    channel: &str,
    tool_use_enabled: bool,
) -> String {
    let persona = persona
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_PERSONA);

    let mut prompt = String::with_capacity(persona.len() + 256);
    prompt.push_str(persona);
    prompt.push_str("\n\nChannel: ");
    prompt.push_str(channel);
    prompt.push_str("\nUser: ");
    prompt.push_str(user_name);

    if let Some(context) = memory_context.map(str::trim).filter(|text| !text.is_empty()) {
        prompt.push_str("\n\n## Memory Context\n");
        prompt.push_str(context);
    }

    if tool_use_enabled {
        prompt.push_str("\n\n## Memory Tools\n");
        prompt.push_str(MEMORY_TOOLS_INSTRUCTIONS);
    }

    prompt
}
