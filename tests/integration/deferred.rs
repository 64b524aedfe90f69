//! Deferred declarations: discovery records, realization invokes

use super::test_utils::write;
use accrete::declaration::Declared;
use accrete::{CallError, Engine, FunctionRegistry};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn counting_registry(counter: Arc<AtomicUsize>) -> FunctionRegistry {
    let mut registry = FunctionRegistry::with_builtins();
    registry.register("machine", move |with, args| {
        counter.fetch_add(1, Ordering::SeqCst);
        let role = with.get("role").cloned().unwrap_or(Value::Null);
        let mut hosts = serde_json::Map::new();
        let host = args["host"].as_str().unwrap_or("unknown").to_string();
        hosts.insert(host, Value::Bool(true));
        Ok(json!({
            "exports": {
                "roles": {"value": [role], "strategy": "list-append"},
                "hosts": {"value": hosts},
            }
        }))
    });
    registry.register("broken", |_, _| {
        Err(CallError::Failed {
            function: "broken".to_string(),
            message: "no host".to_string(),
        })
    });
    registry
}

#[test]
fn test_discovery_never_invokes() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "web.json", r#"{"__call": "machine", "with": {"role": "web"}}"#);
    write(root, "db.json", r#"{"__call": "machine", "with": {"role": "db"}}"#);

    let counter = Arc::new(AtomicUsize::new(0));
    let engine = Engine::default().with_registry(counting_registry(counter.clone()));
    let discovery = engine.discover(&[root]).unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert_eq!(discovery.deferred.len(), 2);
    assert!(discovery.store.is_empty());
    assert!(discovery.deferred[0].source.ends_with("db.json"));
}

#[test]
fn test_realization_contributes_like_static_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "web.json", r#"{"__call": "machine", "with": {"role": "web"}}"#);
    write(root, "db.json", r#"{"__call": "machine", "with": {"role": "db"}}"#);
    write(root, "static.toml", "[exports.roles]\nvalue = [\"base\"]\nstrategy = \"list-append\"\n");

    let counter = Arc::new(AtomicUsize::new(0));
    let engine = Engine::default().with_registry(counting_registry(counter.clone()));
    let discovery = engine.discover(&[root]).unwrap();
    let realized = engine.realize(discovery, &json!({"host": "h1"}));

    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert!(realized.deferred.is_empty());
    let resolution = engine.resolve(&realized).unwrap();
    assert_eq!(resolution.pending_deferred, 0);
    assert_eq!(
        resolution.get("roles").unwrap().value,
        Declared::Value(json!(["db", "base", "web"]))
    );
    assert_eq!(resolution.values()["hosts"], json!({"h1": true}));
}

#[test]
fn test_failed_realization_is_skipped_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "bad.json", r#"{"__call": "broken"}"#);
    write(root, "good.json", r#"{"__call": "machine", "with": {"role": "ok"}}"#);

    let engine = Engine::default()
        .with_registry(counting_registry(Arc::new(AtomicUsize::new(0))));
    let realized = engine.realize(engine.discover(&[root]).unwrap(), &json!({"host": "h"}));

    assert_eq!(realized.skipped.len(), 1);
    assert!(realized.skipped[0].path.ends_with("bad.json"));
    assert!(realized.skipped[0].reason.contains("no host"));
    let resolution = engine.resolve(&realized).unwrap();
    assert_eq!(resolution.values()["roles"], json!(["ok"]));
}

#[test]
fn test_builder_document_uses_realization_args() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "site.json",
        r#"{"__builder": "context-merge"}"#,
    );

    let engine = Engine::default();
    let discovery = engine.discover(&[temp_dir.path()]).unwrap();
    assert_eq!(discovery.deferred.len(), 1);

    let realized = engine.realize(discovery, &json!({"exports": {"region": "eu"}}));
    let resolution = engine.resolve(&realized).unwrap();
    assert_eq!(resolution.values()["region"], json!("eu"));
}
