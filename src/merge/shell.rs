//! Field-aware merge for development-shell definitions.

use crate::merge::deep::merge_value;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which fields of a shell definition get special treatment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellFields {
    /// Sequence fields unioned in first-seen order
    pub list_fields: Vec<String>,
    /// String field concatenated across contributors
    pub hook_field: String,
    /// Separator placed between concatenated hooks
    pub separator: String,
}

impl Default for ShellFields {
    fn default() -> Self {
        Self {
            list_fields: vec![
                "packages".to_string(),
                "nativeBuildInputs".to_string(),
                "buildInputs".to_string(),
                "inputsFrom".to_string(),
            ],
            hook_field: "shellHook".to_string(),
            separator: "\n".to_string(),
        }
    }
}

/// Merge shell definitions in order.
///
/// List fields are unioned without duplicates, non-empty hooks are joined with
/// the separator, and every other field deep-merges. Non-mapping inputs are
/// ignored; callers validate shapes before getting here.
pub fn shell_merge(fields: &ShellFields, values: impl IntoIterator<Item = Value>) -> Value {
    let mut rest = Value::Object(Map::new());
    let mut lists: Vec<(String, Vec<Value>)> = Vec::new();
    let mut hooks: Vec<String> = Vec::new();

    for value in values {
        let Value::Object(map) = value else {
            continue;
        };
        for (key, field_value) in map {
            if fields.list_fields.contains(&key) {
                if let Value::Array(items) = field_value {
                    let slot = match lists.iter().position(|(name, _)| *name == key) {
                        Some(index) => &mut lists[index].1,
                        None => {
                            lists.push((key, Vec::new()));
                            let last = lists.len() - 1;
                            &mut lists[last].1
                        }
                    };
                    for item in items {
                        if !slot.contains(&item) {
                            slot.push(item);
                        }
                    }
                    continue;
                }
            } else if key == fields.hook_field {
                if let Value::String(hook) = field_value {
                    if !hook.is_empty() {
                        hooks.push(hook);
                    }
                    continue;
                }
            }
            let mut layer = Map::new();
            layer.insert(key, field_value);
            merge_value(&mut rest, Value::Object(layer));
        }
    }

    if let Value::Object(map) = &mut rest {
        for (name, items) in lists {
            map.insert(name, Value::Array(items));
        }
        if !hooks.is_empty() {
            map.insert(
                fields.hook_field.clone(),
                Value::String(hooks.join(&fields.separator)),
            );
        }
    }
    rest
}
