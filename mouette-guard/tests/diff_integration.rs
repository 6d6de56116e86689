//! Comparing stored lint results across two runs.

use mouette_guard::config::{read_serialized, LintConfig};
use mouette_guard::core::{diff, FailureJson, Linter};
use mouette_guard::formatters::{FailureFormatter, JsonFormatter};
use mouette_guard::store::InMemoryStore;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

async fn lint(documents: Vec<Value>) -> Vec<FailureJson> {
    let store = InMemoryStore::new()
        .with_collection("products", documents)
        .unwrap();
    Linter::new(LintConfig::default_config().unwrap())
        .lint_store(store)
        .await
        .unwrap()
        .failures
}

fn store_and_reload(dir: &TempDir, name: &str, failures: &[FailureJson]) -> Vec<FailureJson> {
    let path = dir.path().join(name);
    let text = JsonFormatter::new().with_pretty(false).format(failures).unwrap();
    fs::write(&path, text).unwrap();
    serde_json::from_value(read_serialized(&path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_diff_reports_only_new_findings() {
    let dir = TempDir::new().unwrap();
    let before = vec![json!({"_id": 1, "price": "10", "label": null})];
    let mut after = before.clone();
    after.push(json!({"_id": 2, "price": 12, "createdAt": "monday"}));

    let old = store_and_reload(&dir, "old.json", &lint(before).await);
    let new = store_and_reload(&dir, "new.json", &lint(after).await);
    assert!(!old.is_empty());

    assert!(diff(&old, &old).is_empty());

    let mut added: Vec<String> = diff(&old, &new)
        .iter()
        .map(|f| format!("{}@{}", f.rule_metadata.name, f.location.key_name.as_deref().unwrap_or("")))
        .collect();
    added.sort();
    assert_eq!(
        added,
        vec![
            "keys-that-end-in-at-should-refer-to-dates@createdAt",
            "no-mixed-types@price",
        ]
    );
}

#[tokio::test]
async fn test_reworded_messages_are_not_new() {
    let old = lint(vec![json!({"_id": 1, "label": null})]).await;
    let reworded: Vec<FailureJson> = old
        .iter()
        .cloned()
        .map(|mut f| {
            f.failure = format!("{} (reworded)", f.failure);
            f.suggestion = None;
            f
        })
        .collect();
    assert!(diff(&old, &reworded).is_empty());
    assert_eq!(diff(&[], &reworded), reworded);
}
