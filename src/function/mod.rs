//! Function registry.
//!
//! Declarations refer to behaviour by name. The host registers the functions
//! it supports; a handful of builtins cover the common transforms.

pub mod callable;

pub use callable::{CallKind, Callable, MergeMode};

use crate::error::CallError;
use crate::merge::deep::merge_value;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A named function callable from declarations.
///
/// `with` holds the arguments bound in the declaring file, `argument` the
/// runtime argument supplied at invocation time.
pub trait Function: Send + Sync {
    fn call(&self, with: &Value, argument: Value) -> Result<Value, CallError>;
}

impl<F> Function for F
where
    F: Fn(&Value, Value) -> Result<Value, CallError> + Send + Sync,
{
    fn call(&self, with: &Value, argument: Value) -> Result<Value, CallError> {
        self(with, argument)
    }
}

/// Registry of named functions
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Arc<dyn Function>>,
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FunctionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `identity`, `const`, `merge`, `append`, `set`
    /// and the `context-merge` builder.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("identity", |_, arg| Ok(arg));
        registry.register("const", |with, _| {
            Ok(with.get("value").cloned().unwrap_or(Value::Null))
        });
        registry.register("merge", |with, arg| {
            let mut target = arg;
            if !with.is_null() {
                merge_value(&mut target, with.clone());
            }
            Ok(target)
        });
        registry.register("append", builtin_append);
        registry.register("set", builtin_set);
        registry.register("context-merge", builtin_context_merge);
        registry
    }

    /// Register (or replace) a closure under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&Value, Value) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Register (or replace) a [`Function`] implementor under `name`.
    pub fn register_function(&mut self, name: impl Into<String>, function: Arc<dyn Function>) {
        self.functions.insert(name.into(), function);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn invoke(&self, name: &str, with: &Value, argument: Value) -> Result<Value, CallError> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| CallError::UnknownFunction(name.to_string()))?;
        tracing::trace!(function = name, "Invoking function");
        function.call(with, argument)
    }
}

fn failed(function: &str, message: impl Into<String>) -> CallError {
    CallError::Failed {
        function: function.to_string(),
        message: message.into(),
    }
}

fn string_arg<'a>(function: &str, with: &'a Value, name: &str) -> Result<&'a str, CallError> {
    with.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| failed(function, format!("missing string argument '{}'", name)))
}

fn into_object(function: &str, value: Value) -> Result<Map<String, Value>, CallError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(failed(
            function,
            format!("expected a mapping argument, found {}", crate::merge::deep::describe(&other)),
        )),
    }
}

/// `append`: push `with.item` onto the sequence at `with.field`.
fn builtin_append(with: &Value, arg: Value) -> Result<Value, CallError> {
    let field = string_arg("append", with, "field")?;
    let item = with.get("item").cloned().unwrap_or(Value::Null);
    let mut map = into_object("append", arg)?;
    match map
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        Value::Array(items) => items.push(item),
        _ => return Err(failed("append", format!("field '{}' is not a sequence", field))),
    }
    Ok(Value::Object(map))
}

/// `set`: place `with.value` at the dotted `with.path`.
fn builtin_set(with: &Value, arg: Value) -> Result<Value, CallError> {
    let path = string_arg("set", with, "path")?;
    let value = with.get("value").cloned().unwrap_or(Value::Null);
    let mut root = Value::Object(into_object("set", arg)?);
    let mut cursor = &mut root;
    for segment in path.split('.') {
        if !cursor.is_object() {
            *cursor = Value::Object(Map::new());
        }
        let Some(map) = cursor.as_object_mut() else {
            return Err(failed("set", "path traverses a non-mapping"));
        };
        cursor = map.entry(segment.to_string()).or_insert(Value::Null);
    }
    *cursor = value;
    Ok(root)
}

/// `context-merge` builder: produces a `merge` transform over the context
/// (or the context's `with.key` section).
fn builtin_context_merge(with: &Value, context: Value) -> Result<Value, CallError> {
    let section = match with.get("key").and_then(Value::as_str) {
        Some(key) => context.get(key).cloned().unwrap_or(Value::Null),
        None => context,
    };
    Ok(serde_json::json!({ "__call": "merge", "with": section }))
}
