//! Reading declaration files.

use crate::declaration::flatten::{flatten_declaration, FlatEntry};
use crate::declaration::{DeferredDeclaration, Shape};
use crate::error::ExtractError;
use crate::function::Callable;
use serde_json::{Map, Number, Value};
use std::path::Path;

/// What a single file contributes
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// Flattened entries from the declaration attribute
    Static(Vec<FlatEntry>),
    /// The whole document is callable; realization happens later
    Deferred(DeferredDeclaration),
}

/// Parse a declaration file into a JSON document, dispatching on extension.
pub fn read_document(path: &Path) -> Result<Value, ExtractError> {
    let text = std::fs::read_to_string(path).map_err(|e| ExtractError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let parse_error = |message: String| ExtractError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text).map_err(|e| parse_error(e.to_string())),
        Some("toml") => {
            let value: toml::Value = toml::from_str(&text).map_err(|e| parse_error(e.to_string()))?;
            toml_to_json(value).ok_or_else(|| parse_error("non-finite float".to_string()))
        }
        other => Err(parse_error(format!(
            "unsupported declaration format: {}",
            other.unwrap_or("<none>")
        ))),
    }
}

fn toml_to_json(value: toml::Value) -> Option<Value> {
    Some(match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Value::Number(Number::from_f64(f)?),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(toml_to_json)
                .collect::<Option<Vec<_>>>()?,
        ),
        toml::Value::Table(table) => {
            let mut map = Map::new();
            for (key, item) in table {
                map.insert(key, toml_to_json(item)?);
            }
            Value::Object(map)
        }
    })
}

/// Extract the declarations `path` contributes under `attribute`.
///
/// Returns `Ok(None)` when the file does not carry the attribute. A document
/// that is itself callable becomes a deferred declaration and is not invoked.
pub fn extract(path: &Path, attribute: &str) -> Result<Option<Extracted>, ExtractError> {
    let document = read_document(path)?;

    let shape = Shape::of(&document);
    if shape.is_callable() {
        if let Some(callable) = Callable::from_value(&document) {
            return Ok(Some(Extracted::Deferred(DeferredDeclaration {
                is_wrapped: shape == Shape::WrappedCallable,
                callable,
                source: path.to_path_buf(),
            })));
        }
    }

    match document.get(attribute) {
        Some(node) => Ok(Some(Extracted::Static(flatten_declaration(path, node)?))),
        None => Ok(None),
    }
}

/// Extract declarations from an already realized document.
pub fn extract_from_document(
    path: &Path,
    document: &Value,
    attribute: &str,
) -> Result<Vec<FlatEntry>, ExtractError> {
    match document.get(attribute) {
        Some(node) => flatten_declaration(path, node),
        None => Ok(Vec::new()),
    }
}
