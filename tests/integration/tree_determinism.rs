//! Tree and resolution determinism across rebuilds

use super::test_utils::write;
use accrete::{Engine, TreeBuilder};
use std::fs;
use tempfile::TempDir;

fn populate(root: &std::path::Path) {
    write(root, "a.toml", "[exports.xs]\nvalue = [1]\nstrategy = \"list-append\"\n");
    write(root, "b/default.json", r#"{"exports": {"xs": {"value": [2], "strategy": "list-append"}}}"#);
    write(root, "c.toml", "[exports.cfg.value]\nname = \"c\"\n");
    write(root, "c.d/override.toml", "name = \"fragment\"\n");
}

#[test]
fn test_same_filesystem_same_tree() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());

    let builder = TreeBuilder::default();
    let first = builder.build(temp_dir.path()).unwrap();
    let second = builder.build(temp_dir.path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_same_filesystem_same_fingerprint() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());

    let engine = Engine::default();
    let first = engine
        .resolve(&engine.discover(&[temp_dir.path()]).unwrap())
        .unwrap();
    let second = engine
        .resolve(&engine.discover(&[temp_dir.path()]).unwrap())
        .unwrap();
    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(first.values(), second.values());
}

#[test]
fn test_identical_trees_in_different_locations() {
    let left = TempDir::new().unwrap();
    let right = TempDir::new().unwrap();
    populate(left.path());
    populate(right.path());

    let builder = TreeBuilder::default();
    assert_eq!(
        builder.build(left.path()).unwrap().into_value(),
        builder.build(right.path()).unwrap().into_value()
    );
}

#[test]
fn test_content_change_changes_fingerprint() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());

    let engine = Engine::default();
    let before = engine
        .resolve(&engine.discover(&[temp_dir.path()]).unwrap())
        .unwrap();
    fs::write(
        temp_dir.path().join("a.toml"),
        "[exports.xs]\nvalue = [9]\nstrategy = \"list-append\"\n",
    )
    .unwrap();
    let after = engine
        .resolve(&engine.discover(&[temp_dir.path()]).unwrap())
        .unwrap();
    assert_ne!(before.fingerprint, after.fingerprint);
}

#[tokio::test]
async fn test_concurrent_discovery_matches_sequential() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());
    for i in 0..20 {
        write(
            temp_dir.path(),
            &format!("many/{:02}.toml", i),
            &format!("[exports.many]\nvalue = [{}]\nstrategy = \"list-append\"\n", i),
        );
    }

    let engine = Engine::default();
    let sequential = engine
        .resolve(&engine.discover(&[temp_dir.path()]).unwrap())
        .unwrap();
    let concurrent = engine
        .resolve(&engine.discover_concurrent(&[temp_dir.path()]).await.unwrap())
        .unwrap();
    assert_eq!(sequential.fingerprint, concurrent.fingerprint);
}
