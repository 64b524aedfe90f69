//! Tree presentation.

use super::shared::{compact_value, format_section_heading, to_pretty_json};
use crate::error::ApiError;
use crate::tree::node::TreeNode;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

pub fn format_tree_json(tree: &TreeNode) -> Result<String, ApiError> {
    to_pretty_json(tree)
}

/// One row per leaf, keyed by its dotted attribute path.
pub fn format_tree_text(tree: &TreeNode) -> String {
    let mut rows = Vec::new();
    collect_leaves("", tree, &mut rows);

    let mut out = format!("{}\n\n", format_section_heading("Attribute tree"));
    if rows.is_empty() {
        out.push_str("  (empty)\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Attribute", "Value"]);
    for (path, value) in rows {
        table.add_row(vec![path, value]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

fn collect_leaves(prefix: &str, node: &TreeNode, rows: &mut Vec<(String, String)>) {
    match node {
        TreeNode::Leaf(declared) => rows.push((
            if prefix.is_empty() { "<root>".to_string() } else { prefix.to_string() },
            compact_value(&declared.to_value(), 60),
        )),
        TreeNode::Branch(children) => {
            for (name, child) in children {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{}", prefix, name)
                };
                collect_leaves(&path, child, rows);
            }
        }
    }
}
