//! Command routing through the CLI run context

use super::test_utils::write;
use accrete::cli::{map_error, Cli, RunContext};
use accrete::config::AccreteConfig;
use accrete::ApiError;
use clap::Parser;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

fn run(workspace: &Path, args: &[&str]) -> Result<String, ApiError> {
    let mut argv = vec!["accrete"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let context = RunContext::with_config(workspace.to_path_buf(), None, AccreteConfig::default())?;
    context.execute(&cli.command)
}

#[test]
fn test_scan_text_lists_keys_and_skipped_files() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.toml", "[exports]\nalpha = 1\n");
    write(temp_dir.path(), "broken.json", "{");

    let output = run(temp_dir.path(), &["scan", "--values"]).unwrap();
    assert!(output.contains("alpha"));
    assert!(output.contains("override"));
    assert!(output.contains("broken.json"));
    assert!(output.contains("Fingerprint:"));
}

#[test]
fn test_scan_with_explicit_root_and_attribute() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "sub/a.toml", "[outputs]\nbeta = true\n");
    write(temp_dir.path(), "other.toml", "[outputs]\ngamma = true\n");

    let output = run(
        temp_dir.path(),
        &["scan", "sub", "--attribute", "outputs", "--format", "json"],
    )
    .unwrap();
    let parsed: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["values"], json!({"beta": true}));
}

#[test]
fn test_scan_realize_flag() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "host.json", r#"{"__builder": "context-merge"}"#);

    let pending = run(temp_dir.path(), &["scan", "--format", "json"]).unwrap();
    let parsed: Value = serde_json::from_str(&pending).unwrap();
    assert_eq!(parsed["pending_deferred"], 1);

    let output = run(
        temp_dir.path(),
        &["scan", "--format", "json", "--realize", r#"{"exports": {"name": "h"}}"#],
    )
    .unwrap();
    let parsed: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["values"]["name"], "h");
    assert_eq!(parsed["pending_deferred"], 0);
}

#[test]
fn test_explain_text_shows_contributions() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.toml", "[exports.k]\nvalue = [1]\nstrategy = \"list-append\"\n");
    write(temp_dir.path(), "b.toml", "[exports.k]\nvalue = [2]\nstrategy = \"list-append\"\n");

    let output = run(temp_dir.path(), &["explain", "k"]).unwrap();
    assert!(output.contains("a.toml"));
    assert!(output.contains("b.toml"));
    assert!(output.contains("list-append"));
}

#[test]
fn test_conflict_surfaces_with_hint() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.toml", "[exports.k]\nvalue = 1\nstrategy = \"merge\"\n");
    write(temp_dir.path(), "b.toml", "[exports.k]\nvalue = 2\nstrategy = \"override\"\n");

    let err = run(temp_dir.path(), &["scan"]).unwrap_err();
    let message = map_error(&err);
    assert!(message.contains("a.toml"));
    assert!(message.contains("b.toml"));
    assert!(message.contains("hint:"));
}

#[test]
fn test_tree_json_and_text() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "tree/host.toml", "ip = \"10.0.0.1\"\n");
    write(temp_dir.path(), "tree/host.d/extra.toml", "port = 22\n");

    let output = run(temp_dir.path(), &["tree", "tree"]).unwrap();
    let parsed: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed, json!({"host": {"ip": "10.0.0.1", "port": 22}}));

    let text = run(temp_dir.path(), &["tree", "tree", "--format", "text"]).unwrap();
    assert!(text.contains("host"));
}

#[test]
fn test_tree_collision_error() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "x.toml", "a = 1\n");
    write(temp_dir.path(), "x.json", r#"{"a": 2}"#);

    let err = run(temp_dir.path(), &["tree"]).unwrap_err();
    assert!(matches!(err, ApiError::Tree(_)));
    assert!(map_error(&err).contains("hint:"));
}

#[test]
fn test_config_validate_and_paths() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(temp_dir.path(), &["config", "validate"]).unwrap();
    assert!(output.contains("configuration is valid"));

    let paths = run(temp_dir.path(), &["config", "paths"]).unwrap();
    assert!(paths.contains("workspace"));
    assert!(paths.contains("config.toml"));
}
