//! Tree node types

use crate::declaration::Declared;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Result of building a directory: an imported value or a mapping of children
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Leaf(Declared),
    Branch(BTreeMap<String, TreeNode>),
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf(_))
    }

    /// Look up a dotted attribute path.
    pub fn get(&self, path: &str) -> Option<&TreeNode> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| match node {
                TreeNode::Branch(children) => children.get(segment),
                TreeNode::Leaf(_) => None,
            })
    }

    /// Render as JSON; callables use their data form.
    pub fn to_value(&self) -> Value {
        match self {
            TreeNode::Leaf(declared) => declared.to_value(),
            TreeNode::Branch(children) => Value::Object(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), child.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            TreeNode::Leaf(Declared::Value(value)) => value,
            TreeNode::Leaf(declared) => declared.to_value(),
            TreeNode::Branch(children) => Value::Object(
                children
                    .into_iter()
                    .map(|(name, child)| (name, child.into_value()))
                    .collect(),
            ),
        }
    }

    /// Number of leaves in the subtree.
    pub fn leaf_count(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 1,
            TreeNode::Branch(children) => children.values().map(TreeNode::leaf_count).sum(),
        }
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
