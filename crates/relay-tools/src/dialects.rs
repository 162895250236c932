//! Pure schema projections for the two provider dialects.
//!
//! These encode external string contracts (Anthropic's tool-name
//! character set and `input_schema` key; the function envelope the
//! OpenAI-compatible Ollama endpoint expects) and nothing else, so they
//! stay testable without a registry instance.

use serde_json::{json, Map, Value};

use crate::catalog::underscore_name;
use crate::descriptor::ToolDescriptor;

/// Anthropic's tool-name constraint.
pub fn is_valid_anthropic_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

/// Renders a descriptor in the Anthropic dialect: underscore name,
/// `input_schema` key, union `type` arrays folded to one scalar type.
pub fn anthropic_tool(descriptor: &ToolDescriptor) -> Value {
    json!({
        "name": underscore_name(&descriptor.name),
        "description": descriptor.description,
        "input_schema": fold_union_types(&descriptor.input_schema),
    })
}

/// Renders a descriptor in the Ollama dialect: dot name preserved inside
/// a `{type:"function", function:{...}}` envelope, schema untouched.
pub fn ollama_tool(descriptor: &ToolDescriptor) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": descriptor.name,
            "description": descriptor.description,
            "parameters": descriptor.input_schema,
        }
    })
}

/// Collapses JSON-Schema union `type` arrays on each property to the
/// first listed type, naming the dropped alternates in the property
/// description so the model still knows the field accepts those forms.
fn fold_union_types(schema: &Value) -> Value {
    let mut folded = schema.clone();
    if let Some(properties) = folded.get_mut("properties").and_then(Value::as_object_mut) {
        for property in properties.values_mut() {
            if let Some(object) = property.as_object_mut() {
                fold_property_union(object);
            }
        }
    }
    folded
}

fn fold_property_union(property: &mut Map<String, Value>) {
    let Some(types) = property.get("type").and_then(Value::as_array) else {
        return;
    };
    let mut names = types
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect::<Vec<_>>();
    if names.is_empty() {
        return;
    }
    let effective = names.remove(0);

    if !names.is_empty() {
        let note = format!("Also accepts type(s): {}.", names.join(", "));
        let description = property
            .get("description")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        let amended = if description.is_empty() {
            note
        } else {
            format!("{description} {note}")
        };
        property.insert("description".to_string(), Value::String(amended));
    }
    property.insert("type".to_string(), Value::String(effective));
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::catalog::{dot_name_for, EXPOSED_TOOL_NAMES};

    fn descriptor_with_schema(schema: Value) -> ToolDescriptor {
        ToolDescriptor {
            name: "memory.recall".to_string(),
            description: "Recall stored memories".to_string(),
            input_schema: schema,
        }
    }

    #[test]
    fn unit_anthropic_tool_renames_key_and_underscores_name() {
        let tool = anthropic_tool(&descriptor_with_schema(json!({
            "type": "object",
            "properties": { "query": { "type": "string" } }
        })));
        assert_eq!(tool["name"], "memory_recall");
        assert_eq!(tool["description"], "Recall stored memories");
        assert_eq!(tool["input_schema"]["properties"]["query"]["type"], "string");
        assert!(tool.get("inputSchema").is_none());
    }

    #[test]
    fn unit_union_type_folds_to_first_entry_with_description_note() {
        let tool = anthropic_tool(&descriptor_with_schema(json!({
            "type": "object",
            "properties": {
                "tags": {
                    "type": ["array", "string"],
                    "description": "Tags to match"
                }
            }
        })));
        let tags = &tool["input_schema"]["properties"]["tags"];
        assert_eq!(tags["type"], "array");
        let description = tags["description"].as_str().expect("description string");
        assert!(description.starts_with("Tags to match"));
        assert!(description.contains("string"));
    }

    #[test]
    fn unit_union_type_note_is_added_even_without_description() {
        let tool = anthropic_tool(&descriptor_with_schema(json!({
            "type": "object",
            "properties": { "when": { "type": ["string", "number"] } }
        })));
        let when = &tool["input_schema"]["properties"]["when"];
        assert_eq!(when["type"], "string");
        assert!(when["description"]
            .as_str()
            .expect("description string")
            .contains("number"));
    }

    #[test]
    fn unit_ollama_tool_wraps_function_envelope_with_dot_name() {
        let schema = json!({
            "type": "object",
            "properties": { "query": { "type": ["array", "string"] } }
        });
        let tool = ollama_tool(&descriptor_with_schema(schema.clone()));
        assert_eq!(tool["type"], "function");
        assert_eq!(tool["function"]["name"], "memory.recall");
        assert_eq!(tool["function"]["parameters"], schema);
    }

    #[test]
    fn regression_scalar_types_pass_through_unchanged() {
        let schema = json!({
            "type": "object",
            "properties": { "limit": { "type": "integer", "description": "Max results" } }
        });
        let tool = anthropic_tool(&descriptor_with_schema(schema.clone()));
        assert_eq!(tool["input_schema"], schema);
    }

    proptest! {
        #[test]
        fn prop_every_allowlisted_name_translates_and_round_trips(
            index in 0..EXPOSED_TOOL_NAMES.len()
        ) {
            let dot = EXPOSED_TOOL_NAMES[index];
            let underscored = underscore_name(dot);
            prop_assert!(is_valid_anthropic_tool_name(&underscored));
            prop_assert_eq!(dot_name_for(&underscored), Some(dot));
            prop_assert_eq!(underscore_name(dot_name_for(&underscored).unwrap()), underscored);
        }
    }
}
