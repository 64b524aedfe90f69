//! Property-based tests for determinism guarantees

use accrete::declaration::Declared;
use accrete::merge::deep::merge_value;
use accrete::{ContributionRecord, Engine, MergeEngine};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::fs;
use tempfile::TempDir;

fn list_records() -> impl Strategy<Value = (Vec<ContributionRecord>, Vec<ContributionRecord>)> {
    prop::collection::vec(prop::collection::vec(any::<i32>(), 0..4), 1..8)
        .prop_map(|lists| {
            lists
                .into_iter()
                .enumerate()
                .map(|(i, items)| {
                    ContributionRecord::new(
                        format!("{:03}.toml", i),
                        Declared::Value(json!(items)),
                        Some("list-append".to_string()),
                    )
                })
                .collect::<Vec<_>>()
        })
        .prop_flat_map(|records| (Just(records.clone()), Just(records).prop_shuffle()))
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ]
}

fn shallow_map(prefix: &'static str) -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,4}", scalar(), 0..6).prop_map(move |entries| {
        entries
            .into_iter()
            .map(|(key, value)| (format!("{}{}", prefix, key), value))
            .collect()
    })
}

proptest! {
    #[test]
    fn resolution_ignores_record_order((ordered, shuffled) in list_records()) {
        let engine = MergeEngine::new();
        let first = engine.resolve("k", &ordered).unwrap();
        let second = engine.resolve("k", &shuffled).unwrap();
        prop_assert_eq!(&first.value, &second.value);
        prop_assert_eq!(first.sources, second.sources);

        let expected: Vec<Value> = ordered
            .iter()
            .flat_map(|r| r.value.as_value().and_then(Value::as_array).cloned().unwrap_or_default())
            .collect();
        prop_assert_eq!(first.value, Declared::Value(Value::Array(expected)));
    }

    #[test]
    fn single_record_resolves_to_itself(value in scalar()) {
        let record = ContributionRecord::new("only.toml", Declared::Value(value.clone()), None);
        let resolved = MergeEngine::new().resolve("k", &[record]).unwrap();
        prop_assert_eq!(resolved.value, Declared::Value(value));
    }

    #[test]
    fn disjoint_maps_merge_to_union(left in shallow_map("l_"), right in shallow_map("r_")) {
        let mut merged = Value::Object(left.clone());
        merge_value(&mut merged, Value::Object(right.clone()));

        let mut union = left;
        union.extend(right);
        prop_assert_eq!(merged, Value::Object(union));
    }

    #[test]
    fn deep_merge_is_idempotent(layer in shallow_map("")) {
        let mut once = Value::Object(layer.clone());
        merge_value(&mut once, Value::Object(layer.clone()));
        prop_assert_eq!(once, Value::Object(layer));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn discovery_is_repeatable(names in prop::collection::btree_set(
        "[a-z]{1,8}".prop_filter("entry point name", |n| n != "default"),
        1..10,
    )) {
        let temp_dir = TempDir::new().unwrap();
        for (i, name) in names.iter().enumerate() {
            let dir = temp_dir.path().join(if i % 2 == 0 { "even" } else { "odd" });
            fs::create_dir_all(&dir).unwrap();
            fs::write(
                dir.join(format!("{}.toml", name)),
                format!("[exports.names]\nvalue = [\"{}\"]\nstrategy = \"list-append\"\n", name),
            )
            .unwrap();
        }

        let engine = Engine::default();
        let first = engine.resolve(&engine.discover(&[temp_dir.path()]).unwrap()).unwrap();
        let second = engine.resolve(&engine.discover(&[temp_dir.path()]).unwrap()).unwrap();
        prop_assert_eq!(&first.fingerprint, &second.fingerprint);
        prop_assert_eq!(
            first.values()["names"].as_array().map(Vec::len),
            Some(names.len())
        );
    }
}
