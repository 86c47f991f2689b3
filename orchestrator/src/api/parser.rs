// Typed extraction out of Rundeck JSON payloads
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CleanupError, Result};

/// Narrow `payload` to `field_path` (dot separated), then optionally project
/// `element_field` out of the result. Arrays are projected element by
/// element, objects directly.
///
/// Every shape mismatch is reported as [`CleanupError::DataShape`] so callers
/// can tell it apart from transport failures.
pub fn extract(payload: &Value, field_path: Option<&str>, element_field: Option<&str>) -> Result<Value> {
  let mut narrowed = payload;
  if let Some(path) = field_path {
    for key in path.split('.').filter(|k| !k.is_empty()) {
      narrowed = narrowed
        .get(key)
        .ok_or_else(|| CleanupError::DataShape(format!("missing field '{}' in '{}'", key, path)))?;
    }
  }

  let Some(field) = element_field else {
    return Ok(narrowed.clone());
  };

  match narrowed {
    Value::Array(items) => items
      .iter()
      .enumerate()
      .map(|(index, item)| {
        item.get(field).cloned().ok_or_else(|| {
          CleanupError::DataShape(format!("element {} has no field '{}'", index, field))
        })
      })
      .collect::<Result<Vec<_>>>()
      .map(Value::Array),
    Value::Object(map) => map
      .get(field)
      .cloned()
      .ok_or_else(|| CleanupError::DataShape(format!("missing field '{}'", field))),
    other => Err(CleanupError::DataShape(format!(
      "expected an object or array to read '{}' from, got {}",
      field,
      kind(other)
    ))),
  }
}

/// [`extract`] followed by deserialization into `T`.
pub fn extract_as<T: DeserializeOwned>(
  payload: &Value,
  field_path: Option<&str>,
  element_field: Option<&str>,
) -> Result<T> {
  let value = extract(payload, field_path, element_field)?;
  serde_json::from_value(value).map_err(|e| CleanupError::DataShape(e.to_string()))
}

fn kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}
