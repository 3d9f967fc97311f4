//! Environment-variable mapping
//!
//! Converts the flat JSON object stored on an application record into the
//! ordered name/value pairs injected into its container.

use serde_json::Value;

/// Flatten a JSON env object into ordered `(name, value)` pairs
///
/// Null, missing, or non-object input yields an empty list. Property values
/// are stringified: a null value becomes the empty string, strings are taken
/// verbatim (no JSON quoting), and other scalars use their JSON rendering.
/// Output order follows the object's own insertion order.
pub fn env_pairs(env: Option<&Value>) -> Vec<(String, String)> {
    let Some(Value::Object(map)) = env else {
        return Vec::new();
    };

    map.iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect()
}
