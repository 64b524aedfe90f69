//! Flatten nested declarations into `(dotted key, entry)` pairs.

use crate::declaration::{Declared, Shape, STRATEGY_KEY, VALUE_KEY};
use crate::error::ExtractError;
use crate::merge::deep::merge_value;
use serde_json::{Map, Value};
use std::path::Path;

/// One flattened declaration leaf
#[derive(Debug, Clone, PartialEq)]
pub struct FlatEntry {
    pub key: String,
    pub value: Declared,
    /// Strategy name exactly as written; validated when merging
    pub strategy: Option<String>,
}

/// Flatten `node` under `prefix`.
///
/// Descends through internal mappings until a leaf or callable is found.
/// Dotted names inside the declaration structure are expanded first, so
/// `{"a.b": {"value": 1}}` and `{"a": {"b.value": 1}}` yield the same entry.
pub fn flatten(prefix: &str, node: &Value) -> Vec<FlatEntry> {
    let mut out = Vec::new();
    flatten_into(prefix, node, &mut out);
    out
}

/// Flatten a file's declaration attribute, which must be a mapping of keys.
pub fn flatten_declaration(source: &Path, node: &Value) -> Result<Vec<FlatEntry>, ExtractError> {
    match Shape::of(node) {
        Shape::Internal => Ok(flatten("", node)),
        shape => Err(ExtractError::Shape {
            path: source.to_path_buf(),
            message: format!(
                "declaration attribute must be a mapping of keys, found {:?}",
                shape
            ),
        }),
    }
}

fn flatten_into(prefix: &str, node: &Value, out: &mut Vec<FlatEntry>) {
    match (Shape::of(node), node) {
        (Shape::Internal, Value::Object(map)) => {
            for (name, child) in nest_dotted(map) {
                let key = if prefix.is_empty() {
                    name
                } else {
                    format!("{}.{}", prefix, name)
                };
                flatten_into(&key, &child, out);
            }
        }
        (Shape::Callable | Shape::WrappedCallable, _) => out.push(FlatEntry {
            key: prefix.to_string(),
            value: Declared::from_value(node.clone()),
            strategy: None,
        }),
        _ => out.push(normalize_leaf(prefix, node)),
    }
}

fn normalize_leaf(key: &str, node: &Value) -> FlatEntry {
    match node {
        Value::Object(map) if map.contains_key(VALUE_KEY) || map.contains_key(STRATEGY_KEY) => {
            let value = map.get(VALUE_KEY).cloned().unwrap_or(Value::Null);
            let strategy = match map.get(STRATEGY_KEY) {
                None | Some(Value::Null) => None,
                Some(Value::String(name)) => Some(name.clone()),
                Some(other) => Some(other.to_string()),
            };
            FlatEntry {
                key: key.to_string(),
                value: Declared::from_value(value),
                strategy,
            }
        }
        _ => FlatEntry {
            key: key.to_string(),
            value: Declared::from_value(node.clone()),
            strategy: None,
        },
    }
}

/// Expand dotted names one level: `{"a.b": x}` becomes `{"a": {"b": x}}`.
fn nest_dotted(map: &Map<String, Value>) -> Map<String, Value> {
    let mut nested = Value::Object(Map::new());
    for (name, child) in map {
        let segments: Vec<&str> = name.split('.').filter(|s| !s.is_empty()).collect();
        let layer = match segments.split_first() {
            Some((first, rest)) if !rest.is_empty() => {
                let inner = rest.iter().rev().fold(child.clone(), |acc, segment| {
                    let mut wrapper = Map::new();
                    wrapper.insert((*segment).to_string(), acc);
                    Value::Object(wrapper)
                });
                single((*first).to_string(), inner)
            }
            _ => single(name.clone(), child.clone()),
        };
        merge_value(&mut nested, layer);
    }
    match nested {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn single(key: String, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key, value);
    Value::Object(map)
}
