//! Accrete: deterministic composition of scattered declarations
//!
//! Files anywhere in a directory tree declare values under a well-known
//! attribute. Accrete discovers them, groups contributions by dotted key and
//! merges each group with a named strategy. A sibling tree builder maps a
//! directory onto a nested attribute tree with fragment-directory composition.

pub mod cli;
pub mod config;
pub mod declaration;
pub mod engine;
pub mod error;
pub mod function;
pub mod logging;
pub mod merge;
pub mod scan;
pub mod store;
pub mod tree;

pub use declaration::{Declared, DeferredDeclaration, Shape};
pub use engine::{Discovery, Engine, Explanation, Resolution};
pub use error::{ApiError, CallError, ExtractError, MergeError, ScanError, TreeError};
pub use function::{Callable, FunctionRegistry};
pub use merge::{MergeEngine, Resolved, Strategy};
pub use scan::{CancelFlag, Scanner};
pub use store::{ContributionRecord, ContributionStore};
pub use tree::{PathClassifier, TreeBuilder, TreeNode};
