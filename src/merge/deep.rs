//! Recursive JSON merge mechanics.

use crate::function::callable::is_callable_map;
use serde_json::{Map, Value};

/// Overlay `layer` onto `target`, updating `target` in place.
///
/// - Mappings merge recursively; keys are added or overwritten.
/// - Sequences, scalars and callable objects replace `target` wholesale.
/// - Merging a mapping into a non-mapping target starts from `{}`.
///
/// ```rust
/// use accrete::merge::deep::merge_value;
/// use serde_json::json;
///
/// let mut acc = json!({"a": {"x": 1}});
/// merge_value(&mut acc, json!({"a": {"y": 2}, "b": [1]}));
/// assert_eq!(acc, json!({"a": {"x": 1, "y": 2}, "b": [1]}));
/// ```
pub fn merge_value(target: &mut Value, layer: Value) {
    match layer {
        Value::Object(map) if !is_callable_map(&map) => merge_object(target, map),
        _ => *target = layer,
    }
}

fn merge_object(target: &mut Value, map: Map<String, Value>) {
    let replace = match target.as_object() {
        Some(existing) => is_callable_map(existing),
        None => true,
    };
    if replace {
        *target = Value::Object(Map::new());
    }

    let Some(target_map) = target.as_object_mut() else {
        return;
    };

    for (key, value) in map {
        match target_map.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target_map.insert(key, value);
            }
        }
    }
}

/// Short human-readable name of a value's shape, used in diagnostics.
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(map) if is_callable_map(map) => "callable",
        Value::Object(_) => "mapping",
    }
}
