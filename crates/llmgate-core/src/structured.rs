//! Decoding structured completions.
//!
//! Content is parsed in two steps so callers can tell the failure apart:
//! text that is not JSON at all is a [`LlmError::Decode`]; JSON that does not
//! fit the target type (missing or mistyped fields) is a
//! [`LlmError::Validation`].

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use llmgate_types::llm::{LlmError, ResponseFormat};

/// Parse `content` as JSON and coerce it into `T`.
pub fn decode_structured<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| LlmError::Decode(format!("{e}; raw content: {content}")))?;

    serde_json::from_value(value).map_err(|e| LlmError::Validation(e.to_string()))
}

/// Build a strict `json_schema` response format for `T`.
pub fn json_schema_format<T: JsonSchema>() -> Result<ResponseFormat, LlmError> {
    let schema = schemars::schema_for!(T);
    let mut schema_value = serde_json::to_value(schema)
        .map_err(|e| LlmError::InvalidRequest(format!("failed to serialize schema: {e}")))?;

    if let Value::Object(map) = &mut schema_value {
        map.remove("$schema");
    }
    close_object_schemas(&mut schema_value);

    Ok(ResponseFormat::JsonSchema {
        name: sanitize_schema_name(&T::schema_name()),
        schema: schema_value,
        strict: true,
    })
}

/// Set `additionalProperties: false` on every object schema, recursively.
///
/// Strict structured output rejects schemas that leave it open.
fn close_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let is_object = map.get("type").and_then(Value::as_str) == Some("object")
                || map.contains_key("properties");
            if is_object {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            for child in map.values_mut() {
                close_object_schemas(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                close_object_schemas(item);
            }
        }
        _ => {}
    }
}

/// Schema names must match `[a-zA-Z0-9_-]+`; generic type names do not.
fn sanitize_schema_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
