//! Callables as explicit data.
//!
//! A callable never captures ambient state: it names a registered function
//! plus its bound arguments, or it is a composite the merge engine built out
//! of other callables. Nothing is invoked until [`Callable::call`] runs with
//! real arguments.

use crate::error::CallError;
use crate::function::FunctionRegistry;
use crate::merge::deep::{describe, merge_value};
use crate::merge::shell::{shell_merge, ShellFields};
use serde_json::{Map, Value};

/// Key naming a one-argument transform
pub const CALL_KEY: &str = "__call";
/// Key naming a builder that produces a transform from contextual arguments
pub const BUILDER_KEY: &str = "__builder";
/// Key holding bound arguments
pub const WITH_KEY: &str = "with";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Applied directly to its argument
    Transform,
    /// First invoked with the context; its result is the transform
    Builder,
}

/// How a merged callable combines its parts' results
#[derive(Debug, Clone, PartialEq)]
pub enum MergeMode {
    Deep,
    Shell(ShellFields),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Callable {
    /// A registered function with bound arguments. `extra` holds any other
    /// attributes the declaring object carried (a wrapped callable).
    Named {
        kind: CallKind,
        function: String,
        with: Value,
        extra: Map<String, Value>,
    },
    /// Invokes every part with the same argument and merges the results in order
    Merged { parts: Vec<Callable>, mode: MergeMode },
    /// Threads the argument through each stage left to right
    Pipe { stages: Vec<Callable> },
}

impl Callable {
    /// Parse a callable object, or `None` when `value` carries no call marker.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let (kind, function) = match (map.get(CALL_KEY), map.get(BUILDER_KEY)) {
            (Some(Value::String(name)), _) => (CallKind::Transform, name.clone()),
            (_, Some(Value::String(name))) => (CallKind::Builder, name.clone()),
            _ => return None,
        };
        let with = map.get(WITH_KEY).cloned().unwrap_or(Value::Null);
        let extra = map
            .iter()
            .filter(|(k, _)| !is_marker_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(Callable::Named {
            kind,
            function,
            with,
            extra,
        })
    }

    /// True when the callable carries attributes beyond its call marker.
    pub fn is_wrapped(&self) -> bool {
        matches!(self, Callable::Named { extra, .. } if !extra.is_empty())
    }

    /// Render the callable in its data form.
    pub fn to_value(&self) -> Value {
        match self {
            Callable::Named {
                kind,
                function,
                with,
                extra,
            } => {
                let mut map = extra.clone();
                let marker = match kind {
                    CallKind::Transform => CALL_KEY,
                    CallKind::Builder => BUILDER_KEY,
                };
                map.insert(marker.to_string(), Value::String(function.clone()));
                if !with.is_null() {
                    map.insert(WITH_KEY.to_string(), with.clone());
                }
                Value::Object(map)
            }
            Callable::Merged { parts, mode } => {
                let mode = match mode {
                    MergeMode::Deep => "merge",
                    MergeMode::Shell(_) => "shell-merge",
                };
                serde_json::json!({
                    "__merged": mode,
                    "parts": parts.iter().map(Callable::to_value).collect::<Vec<_>>(),
                })
            }
            Callable::Pipe { stages } => serde_json::json!({
                "__pipe": stages.iter().map(Callable::to_value).collect::<Vec<_>>(),
            }),
        }
    }

    /// Invoke with `argument`. Builders receive `context` first.
    pub fn call(
        &self,
        registry: &FunctionRegistry,
        context: &Value,
        argument: Value,
    ) -> Result<Value, CallError> {
        match self {
            Callable::Named {
                kind: CallKind::Transform,
                function,
                with,
                ..
            } => registry.invoke(function, with, argument),
            Callable::Named {
                kind: CallKind::Builder,
                function,
                with,
                ..
            } => {
                let produced = registry.invoke(function, with, context.clone())?;
                let transform = Callable::from_value(&produced)
                    .ok_or_else(|| CallError::NotCallable(function.clone()))?;
                transform.call(registry, context, argument)
            }
            Callable::Merged { parts, mode } => {
                let mut results = Vec::with_capacity(parts.len());
                for part in parts {
                    let result = part.call(registry, context, argument.clone())?;
                    if !result.is_object() {
                        return Err(CallError::TypeMismatch {
                            actual: describe(&result).to_string(),
                        });
                    }
                    results.push(result);
                }
                Ok(match mode {
                    MergeMode::Deep => {
                        let mut acc = Value::Object(Map::new());
                        for result in results {
                            merge_value(&mut acc, result);
                        }
                        acc
                    }
                    MergeMode::Shell(fields) => shell_merge(fields, results),
                })
            }
            Callable::Pipe { stages } => stages
                .iter()
                .try_fold(argument, |acc, stage| stage.call(registry, context, acc)),
        }
    }
}

fn is_marker_key(key: &str) -> bool {
    key == CALL_KEY || key == BUILDER_KEY || key == WITH_KEY
}

/// True when `map` carries a call marker.
pub fn is_callable_map(map: &Map<String, Value>) -> bool {
    matches!(map.get(CALL_KEY), Some(Value::String(_)))
        || matches!(map.get(BUILDER_KEY), Some(Value::String(_)))
}

/// True when `map` carries a call marker and nothing besides bound arguments.
pub fn is_bare_callable_map(map: &Map<String, Value>) -> bool {
    is_callable_map(map) && map.keys().all(|k| is_marker_key(k))
}
