//! Directory-to-attribute tree building
//!
//! Shares naming rules with the scanner through [`classify::PathClassifier`].

pub mod builder;
pub mod classify;
pub mod node;
pub mod path;
pub mod walker;

pub use builder::TreeBuilder;
pub use classify::{EntryClass, NamingConfig, PathClassifier};
pub use node::TreeNode;
