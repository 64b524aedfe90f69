//! Configuration layering rules.

pub mod merge_policy;
