//! Declarations: values extracted from files under a well-known attribute.
//!
//! Shape decisions (leaf, internal node, callable, wrapped callable) are made
//! once per node through [`Shape`] rather than by probing values ad hoc.

pub mod flatten;
pub mod load;

pub use flatten::{flatten, flatten_declaration, FlatEntry};
pub use load::{extract, extract_from_document, read_document, Extracted};

use crate::function::callable::{is_bare_callable_map, is_callable_map};
use crate::function::Callable;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::path::PathBuf;

/// Wrapper field holding the contributed value
pub const VALUE_KEY: &str = "value";
/// Wrapper field naming the merge strategy
pub const STRATEGY_KEY: &str = "strategy";

/// Structural role of a declaration node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A plain value or a `{value, strategy}` wrapper
    Leaf,
    /// A mapping of further declarations
    Internal,
    /// A bare callable object
    Callable,
    /// A callable object that also carries other attributes
    WrappedCallable,
}

impl Shape {
    pub fn of(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Shape::Leaf;
        };
        if is_callable_map(map) {
            if is_bare_callable_map(map) {
                Shape::Callable
            } else {
                Shape::WrappedCallable
            }
        } else if map.contains_key(VALUE_KEY) || map.contains_key(STRATEGY_KEY) {
            Shape::Leaf
        } else {
            Shape::Internal
        }
    }

    pub fn is_callable(self) -> bool {
        matches!(self, Shape::Callable | Shape::WrappedCallable)
    }
}

/// A contributed value: realized data or a callable awaiting arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Declared {
    Value(Value),
    Callable(Callable),
}

impl Declared {
    /// Classify raw data, lifting callable objects.
    pub fn from_value(value: Value) -> Self {
        match Callable::from_value(&value) {
            Some(callable) => Declared::Callable(callable),
            None => Declared::Value(value),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Declared::Value(value) => Some(value),
            Declared::Callable(_) => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Declared::Callable(callable) => Some(callable),
            Declared::Value(_) => None,
        }
    }

    /// Render as data; callables use their data form.
    pub fn to_value(&self) -> Value {
        match self {
            Declared::Value(value) => value.clone(),
            Declared::Callable(callable) => callable.to_value(),
        }
    }

    /// Shape name for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Declared::Value(value) => crate::merge::deep::describe(value),
            Declared::Callable(_) => "callable",
        }
    }
}

impl Serialize for Declared {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// A declaration whose producer needs realization-time arguments.
///
/// Recorded during discovery and never invoked there.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredDeclaration {
    pub callable: Callable,
    pub is_wrapped: bool,
    pub source: PathBuf,
}
