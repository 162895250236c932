//! Fixed exposure policy and tool-name translation.
//!
//! Exposure is decided by this allowlist alone, independent of what the
//! backend advertises. Underscore→dot translation is table-driven: names
//! with genuine underscores (`memory.search_by_tag`) would be corrupted
//! by a blanket character replacement.

/// Dot-form names of every operation that may be offered to a model or
/// executed on its behalf.
pub const EXPOSED_TOOL_NAMES: &[&str] = &[
    "memory.remember",
    "memory.batch",
    "memory.recall",
    "memory.search",
    "memory.search_by_tag",
    "memory.recall_by_timeframe",
    "memory.get_recent",
    "memory.list_tags",
    "memory.summarize",
    "memory.get_stats",
    "memory.annotate",
    "memory.associate",
    "memory.forget",
    "memory.health",
];

/// Administrative/destructive operations that stay hidden even when the
/// backend advertises them.
pub const BLOCKED_TOOL_NAMES: &[&str] =
    &["memory.purge", "memory.flush_buffer", "memory.merge_entities"];

/// Operations that write to the backend and therefore receive a
/// `source_channel` argument at execution time.
pub const MUTATING_TOOL_NAMES: &[&str] = &[
    "memory.remember",
    "memory.batch",
    "memory.annotate",
    "memory.associate",
    "memory.forget",
];

/// Renders a dot-form name in the Anthropic-safe underscore form.
pub fn underscore_name(name: &str) -> String {
    name.replace('.', "_")
}

/// Maps a dot- or underscore-form name back to its allowlisted dot form.
pub fn dot_name_for(name: &str) -> Option<&'static str> {
    EXPOSED_TOOL_NAMES
        .iter()
        .copied()
        .find(|dot| *dot == name || underscore_name(dot) == name)
}

/// True iff the name, in either form, is in the exposed allowlist.
pub fn is_exposed_name(name: &str) -> bool {
    dot_name_for(name).is_some()
}

/// True iff the name, in either form, is an exposed write operation.
pub fn is_mutating_operation(name: &str) -> bool {
    dot_name_for(name)
        .map(|dot| MUTATING_TOOL_NAMES.contains(&dot))
        .unwrap_or(false)
}
