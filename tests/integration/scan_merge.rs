//! End-to-end discovery and merge behaviour

use super::test_utils::write;
use accrete::declaration::Declared;
use accrete::merge::Strategy;
use accrete::{ApiError, Engine, MergeError};
use serde_json::{json, Value};
use tempfile::TempDir;

fn resolve_values(root: &std::path::Path) -> std::collections::BTreeMap<String, Value> {
    let engine = Engine::default();
    let discovery = engine.discover(&[root]).unwrap();
    engine.resolve(&discovery).unwrap().values()
}

#[test]
fn test_deep_merge_across_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "hosts/alpha.toml", "[exports.services.value.web]\nport = 80\n");
    write(
        root,
        "hosts/beta.json",
        r#"{"exports": {"services": {"value": {"web": {"tls": true}, "db": {"port": 5432}}}}}"#,
    );

    let values = resolve_values(root);
    assert_eq!(
        values["services"],
        json!({"web": {"port": 80, "tls": true}, "db": {"port": 5432}})
    );
}

#[test]
fn test_single_contribution_overrides_by_default() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "only.toml", "[exports]\nname = \"solo\"\n");

    let engine = Engine::default();
    let resolution = engine
        .resolve(&engine.discover(&[temp_dir.path()]).unwrap())
        .unwrap();
    let resolved = resolution.get("name").unwrap();
    assert_eq!(resolved.strategy, Strategy::Override);
    assert_eq!(resolved.value, Declared::Value(json!("solo")));
}

#[test]
fn test_list_append_in_source_order() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "b.toml", "[exports.packages]\nvalue = [\"jq\"]\nstrategy = \"list-append\"\n");
    write(root, "a.toml", "[exports.packages]\nvalue = [\"git\"]\nstrategy = \"list-append\"\n");
    write(root, "c/default.json", r#"{"exports": {"packages": {"value": ["fd"], "strategy": "list-append"}}}"#);

    assert_eq!(resolve_values(root)["packages"], json!(["git", "jq", "fd"]));
}

#[test]
fn test_explicit_override_keeps_last_source() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "10-base.toml", "[exports.theme]\nvalue = { color = \"red\", size = 1 }\nstrategy = \"override\"\n");
    write(root, "20-local.toml", "[exports.theme]\nvalue = { color = \"blue\" }\nstrategy = \"override\"\n");

    assert_eq!(resolve_values(root)["theme"], json!({"color": "blue"}));
}

#[test]
fn test_strategy_conflict_names_each_source() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "a.toml", "[exports.k]\nvalue = { a = 1 }\nstrategy = \"merge\"\n");
    write(root, "b.toml", "[exports.k]\nvalue = { b = 1 }\nstrategy = \"override\"\n");

    let engine = Engine::default();
    let discovery = engine.discover(&[root]).unwrap();
    match engine.resolve(&discovery).unwrap_err() {
        ApiError::Merge(MergeError::StrategyConflict { key, declared }) => {
            assert_eq!(key, "k");
            assert_eq!(declared.len(), 2);
            assert!(declared[0].0.ends_with("a.toml"));
            assert_eq!(declared[0].1, "merge");
            assert!(declared[1].0.ends_with("b.toml"));
            assert_eq!(declared[1].1, "override");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_type_mismatch_names_offending_source() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "a.toml", "[exports.k]\nvalue = [1]\nstrategy = \"list-append\"\n");
    write(root, "b.toml", "[exports.k]\nvalue = \"two\"\nstrategy = \"list-append\"\n");

    let engine = Engine::default();
    let discovery = engine.discover(&[root]).unwrap();
    match engine.resolve(&discovery).unwrap_err() {
        ApiError::Merge(MergeError::TypeMismatch { key, source_path, .. }) => {
            assert_eq!(key, "k");
            assert!(source_path.ends_with("b.toml"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_unknown_strategy_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.toml", "[exports.k]\nvalue = 1\nstrategy = \"sideways\"\n");

    let engine = Engine::default();
    let discovery = engine.discover(&[temp_dir.path()]).unwrap();
    assert!(matches!(
        engine.resolve(&discovery),
        Err(ApiError::Merge(MergeError::UnknownStrategy { .. }))
    ));
}

#[test]
fn test_shell_merge_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "a.json",
        r#"{"exports": {"devShell": {"value": {"packages": ["git"], "shellHook": "echo a"}, "strategy": "shell-merge"}}}"#,
    );
    write(
        root,
        "b.json",
        r#"{"exports": {"devShell": {"value": {"packages": ["git", "jq"], "env": {"X": "1"}, "shellHook": "echo b"}, "strategy": "shell-merge"}}}"#,
    );

    let shell = &resolve_values(root)["devShell"];
    assert_eq!(shell["packages"], json!(["git", "jq"]));
    assert_eq!(shell["env"], json!({"X": "1"}));
    assert_eq!(shell["shellHook"], json!("echo a\necho b"));
}

#[test]
fn test_merged_callables_apply_every_part() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "a.json",
        r#"{"exports": {"module": {"__call": "set", "with": {"path": "a", "value": 1}}}}"#,
    );
    write(
        root,
        "b.json",
        r#"{"exports": {"module": {"__call": "set", "with": {"path": "b", "value": 2}}}}"#,
    );

    let engine = Engine::default();
    let resolution = engine
        .resolve(&engine.discover(&[root]).unwrap())
        .unwrap();
    assert_eq!(resolution.get("module").unwrap().strategy, Strategy::Merge);
    let result = engine
        .apply(&resolution, "module", json!({"base": true}), &Value::Null)
        .unwrap();
    assert_eq!(result, json!({"base": true, "a": 1, "b": 2}));
}

#[test]
fn test_compose_alias_matches_pipe() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "00.json",
        r#"{"exports": {"f": {"value": {"__call": "append", "with": {"field": "xs", "item": 1}}, "strategy": "compose"}}}"#,
    );
    write(
        root,
        "01.json",
        r#"{"exports": {"f": {"value": {"__call": "append", "with": {"field": "xs", "item": 2}}, "strategy": "pipe"}}}"#,
    );

    let engine = Engine::default();
    let resolution = engine
        .resolve(&engine.discover(&[root]).unwrap())
        .unwrap();
    let result = engine
        .apply(&resolution, "f", json!({}), &Value::Null)
        .unwrap();
    assert_eq!(result, json!({"xs": [1, 2]}));
}

#[test]
fn test_builder_receives_context() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "a.json",
        r#"{"exports": {"cfg": {"__builder": "context-merge", "with": {"key": "site"}}}}"#,
    );

    let engine = Engine::default();
    let resolution = engine
        .resolve(&engine.discover(&[temp_dir.path()]).unwrap())
        .unwrap();
    let result = engine
        .apply(
            &resolution,
            "cfg",
            json!({"name": "x"}),
            &json!({"site": {"region": "eu"}}),
        )
        .unwrap();
    assert_eq!(result, json!({"name": "x", "region": "eu"}));
}

#[test]
fn test_multiple_roots_and_missing_root() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first");
    let second = temp_dir.path().join("second");
    write(&first, "a.toml", "[exports.xs]\nvalue = [1]\nstrategy = \"list-append\"\n");
    write(&second, "a.toml", "[exports.xs]\nvalue = [2]\nstrategy = \"list-append\"\n");

    let engine = Engine::default();
    let discovery = engine.discover(&[&first, &second]).unwrap();
    assert_eq!(discovery.store.record_count(), 2);
    assert_eq!(
        engine.resolve(&discovery).unwrap().values()["xs"],
        json!([1, 2])
    );

    let missing = temp_dir.path().join("missing");
    assert!(matches!(
        engine.discover(&[&missing]),
        Err(ApiError::Scan(_))
    ));
}

#[test]
fn test_custom_attribute() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.toml", "[flake]\nname = \"f\"\n[exports]\nname = \"e\"\n");

    let engine = Engine::default().with_attribute("flake");
    let resolution = engine
        .resolve(&engine.discover(&[temp_dir.path()]).unwrap())
        .unwrap();
    assert_eq!(resolution.values()["name"], json!("f"));
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_contributes_under_both_paths() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "shared/a.toml", "[exports.k]\nvalue = [1]\nstrategy = \"list-append\"\n");
    std::fs::create_dir_all(root.join("hosts")).unwrap();
    std::os::unix::fs::symlink(root.join("shared"), root.join("hosts/common")).unwrap();

    let engine = Engine::default();
    let discovery = engine.discover(&[root]).unwrap();
    let records = discovery.store.sorted("k");
    assert_eq!(records.len(), 2);
    assert!(records[0].source.ends_with("hosts/common/a.toml"));
    assert!(records[1].source.ends_with("shared/a.toml"));
    assert_eq!(
        engine.resolve(&discovery).unwrap().values()["k"],
        json!([1, 1])
    );
}

#[test]
fn test_overlapping_roots_append_per_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "sub/a.toml", "[exports.k]\nvalue = [1]\nstrategy = \"list-append\"\n");

    let engine = Engine::default();
    let discovery = engine.discover(&[root.to_path_buf(), root.join("sub")]).unwrap();
    assert_eq!(discovery.store.get("k").map(<[_]>::len), Some(2));
}
