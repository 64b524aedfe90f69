//! Tree builder structure: naming, nesting, fragments and collisions

use super::test_utils::write;
use accrete::tree::{NamingConfig, PathClassifier, TreeBuilder, TreeNode};
use accrete::TreeError;
use serde_json::json;
use tempfile::TempDir;

fn build(root: &std::path::Path) -> Result<TreeNode, TreeError> {
    TreeBuilder::default().build(root)
}

#[test]
fn test_nested_layout() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "hosts/alpha.toml", "ip = \"10.0.0.1\"\n");
    write(root, "hosts/beta/default.json", r#"{"ip": "10.0.0.2"}"#);
    write(root, "hosts/beta/extra.toml", "ignored = true\n");
    write(root, "users/admin.toml", "shell = \"zsh\"\n");
    write(root, ".git/config.toml", "hidden = true\n");

    let tree = build(root).unwrap();
    assert_eq!(tree.leaf_count(), 3);
    assert!(tree.get("hosts.alpha").unwrap().is_leaf());
    assert_eq!(
        tree.get("hosts.beta").unwrap().to_value(),
        json!({"ip": "10.0.0.2"})
    );
    assert!(tree.get("hosts.beta.extra").is_none());
    assert_eq!(
        tree.into_value(),
        json!({
            "hosts": {"alpha": {"ip": "10.0.0.1"}, "beta": {"ip": "10.0.0.2"}},
            "users": {"admin": {"shell": "zsh"}},
        })
    );
}

#[test]
fn test_fragments_apply_in_name_order() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "app.toml", "[server]\nport = 80\nworkers = 2\n");
    write(root, "app.d/20-prod.toml", "[server]\nport = 443\n");
    write(root, "app.d/10-dev.toml", "[server]\nport = 8080\ndebug = true\n");

    assert_eq!(
        build(root).unwrap().into_value(),
        json!({"app": {"server": {"port": 443, "workers": 2, "debug": true}}})
    );
}

#[test]
fn test_fragment_dir_composes_with_subtree_base() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "svc/a.toml", "x = 1\n");
    write(root, "svc.d/extra.json", r#"{"b": {"y": 2}}"#);

    assert_eq!(
        build(root).unwrap().into_value(),
        json!({"svc": {"a": {"x": 1}, "b": {"y": 2}}})
    );
}

#[test]
fn test_fragment_collision_with_escaped_name() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "svc.d/one.toml", "a = 1\n");
    write(root, "svc_.d/two.toml", "a = 2\n");

    match build(root).unwrap_err() {
        TreeError::Collision { name, sources } => {
            assert_eq!(name, "svc");
            assert_eq!(sources.len(), 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_custom_naming() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "base.json", r#"{"a": 1}"#);
    write(root, "base.parts/more.json", r#"{"b": 2}"#);
    write(root, "skip.toml", "never = true\n");

    let naming = NamingConfig {
        fragment_suffix: ".parts".to_string(),
        extensions: vec!["json".to_string()],
        ..NamingConfig::default()
    };
    let tree = TreeBuilder::new(PathClassifier::new(naming))
        .build(root)
        .unwrap();
    assert_eq!(tree.into_value(), json!({"base": {"a": 1, "b": 2}}));
}

#[test]
fn test_unsupported_extension_is_ignored() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "notes.yaml", "a: 1\n");
    assert_eq!(build(temp_dir.path()).unwrap().into_value(), json!({}));
}
