//! Property-based tests for the linter.
//!
//! ## Test Categories
//!
//! ### 1. Case detection
//! - Names already in the required case are never flagged
//! - Single-word names, digits included, are accepted by every case
//!
//! ### 2. Grammatical number
//! - Pluralized nouns never read as singular, singularized ones never as plural
//!
//! ### 3. Mixed types
//! - A field fails exactly when more than one concrete type remains after
//!   dropping `missing` and `null`
//!
//! ### 4. Diff
//! - Idempotence, detection of one added finding, insensitivity to wording

use mouette_guard::access::TestDataAccess;
use mouette_guard::core::{
    diff, failure_hash, FailureJson, Granularity, LocationJson, Registry, RuleInstance,
    RuleMetadataJson,
};
use mouette_guard::rules::casing::{to_camel, TargetCase};
use mouette_guard::rules::inflection::{is_plural, is_singular, pluralize, singularize};
use mouette_guard::types::TypeTag;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

// Regular nouns the general rules handle: no irregulars, uncountables or overrides.
const NOUNS: &[&str] = &[
    "cow", "cat", "dog", "user", "order", "product", "account", "invoice", "city", "category",
    "company", "box", "church", "wish", "address", "wife", "house", "flower", "bed", "payment",
];

const ALL_TYPES: &[TypeTag] = &[
    TypeTag::Missing,
    TypeTag::Null,
    TypeTag::Boolean,
    TypeTag::Number,
    TypeTag::String,
    TypeTag::Array,
    TypeTag::Object,
    TypeTag::ObjectId,
    TypeTag::Date,
    TypeTag::RegularExpression,
    TypeTag::Binary,
];

fn run_rule(name: &str, options: Value, data: &TestDataAccess) -> usize {
    let registry = Registry::builtin();
    let options: Map<String, Value> = serde_json::from_value(options).unwrap();
    let instance = RuleInstance::new(registry.get(name).unwrap(), &options).unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async { instance.failures(data).await.unwrap().len() })
}

fn camel_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,5}([A-Z][a-z0-9]{1,6}){1,3}"
}

fn snake_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,5}(_[a-z][a-z0-9]{0,5}){1,3}"
}

fn single_word() -> impl Strategy<Value = String> {
    "_{0,2}[a-z][a-z0-9]{0,9}"
}

fn word_with_digits() -> impl Strategy<Value = String> {
    "[a-z]{1,6}[0-9]{1,3}"
}

fn failure(rule: &str, collection: &str, key: Option<&str>) -> FailureJson {
    FailureJson {
        rule_metadata: RuleMetadataJson {
            name: rule.into(),
            pretty_name: rule.into(),
            description: String::new(),
            rationale: String::new(),
            granularity: Granularity::Column,
            is_fuzzy: false,
        },
        options: BTreeMap::new(),
        location: LocationJson {
            collection_name: Some(collection.into()),
            key_name: key.map(str::to_string),
        },
        failure: format!("{rule} failed on {collection}"),
        suggestion: None,
        mongo_command: None,
        hash: failure_hash(rule, collection, key),
    }
}

fn findings() -> impl Strategy<Value = Vec<FailureJson>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["no-null", "no-mixed-types", "max-key-count"]),
            "[a-z]{1,5}",
            prop::option::of("[a-z]{1,5}"),
        ),
        0..12,
    )
    .prop_map(|items| {
        items
            .into_iter()
            .map(|(rule, collection, key)| failure(rule, &collection, key.as_deref()))
            .collect()
    })
}

proptest! {
    #[test]
    fn test_names_in_the_required_case_are_accepted(
        camel in camel_name(),
        snake in snake_name(),
        word in single_word(),
        numbered in word_with_digits()
    ) {
        prop_assert!(TargetCase::Camel.accepts(&camel), "{} rejected as camel", camel);
        prop_assert!(TargetCase::Snake.accepts(&snake), "{} rejected as snake", snake);
        prop_assert!(TargetCase::Camel.accepts(&word));
        prop_assert!(TargetCase::Snake.accepts(&word));
        prop_assert!(TargetCase::Camel.accepts(&numbered), "{} rejected as camel", numbered);
        prop_assert!(TargetCase::Snake.accepts(&numbered), "{} rejected as snake", numbered);
        prop_assert!(TargetCase::Camel.accepts(&to_camel(&snake)));
    }

    #[test]
    fn test_key_names_case_rule_never_flags_conforming_keys(
        keys in prop::collection::btree_set(camel_name(), 1..8),
        words in prop::collection::btree_set(single_word(), 0..4),
        numbered in prop::collection::btree_set(word_with_digits(), 0..4)
    ) {
        let data = TestDataAccess::new()
            .with_collection_names(["things"])
            .with_field_names(
                "things",
                keys.iter().chain(words.iter()).chain(numbered.iter()).cloned(),
            );
        prop_assert_eq!(run_rule("key-names-case", json!({"case": "camel"}), &data), 0);

        // every multi-word camel key fails the snake requirement
        prop_assert_eq!(
            run_rule("key-names-case", json!({"case": "snake"}), &data),
            keys.len()
        );
    }

    #[test]
    fn test_grammatical_number(
        noun in prop::sample::select(NOUNS.to_vec()),
        prefix in prop::option::of("[a-z]{1,6}_")
    ) {
        let word = format!("{}{noun}", prefix.unwrap_or_default());
        let plural = pluralize(&word);

        prop_assert!(is_singular(&word));
        prop_assert!(!is_plural(&word));
        prop_assert!(is_plural(&plural));
        prop_assert!(!is_singular(&plural));
        prop_assert!(!is_plural(&singularize(&plural)));
        prop_assert_eq!(singularize(&plural), word);
    }

    #[test]
    fn test_mixed_types_detection(
        types in prop::collection::btree_set(prop::sample::select(ALL_TYPES.to_vec()), 0..6)
    ) {
        let data = TestDataAccess::new()
            .with_collection_names(["c"])
            .with_field_names("c", ["f"])
            .with_field_types("c", "f", types.iter().copied());

        let concrete: BTreeSet<&TypeTag> = types
            .iter()
            .filter(|t| !matches!(t, TypeTag::Missing | TypeTag::Null))
            .collect();
        let expected = usize::from(concrete.len() > 1);
        prop_assert_eq!(run_rule("no-mixed-types", json!({}), &data), expected);
    }

    #[test]
    fn test_diff_properties(old in findings(), extra in findings()) {
        prop_assert!(diff(&old, &old).is_empty());

        let known: BTreeSet<&str> = old.iter().map(|f| f.hash.as_str()).collect();
        let mut new = old.clone();
        new.extend(extra.iter().cloned());
        let expected: Vec<FailureJson> = extra
            .iter()
            .filter(|f| !known.contains(f.hash.as_str()))
            .cloned()
            .collect();
        prop_assert_eq!(diff(&old, &new), expected);

        let reworded: Vec<FailureJson> = old
            .iter()
            .cloned()
            .map(|mut f| {
                f.failure.push_str(", again");
                f
            })
            .collect();
        prop_assert!(diff(&old, &reworded).is_empty());
    }
}

#[test]
fn test_explicit_mixed_type_examples() {
    let with = |types: Vec<TypeTag>| {
        TestDataAccess::new()
            .with_collection_names(["c"])
            .with_field_names("c", ["f"])
            .with_field_types("c", "f", types)
    };
    assert_eq!(
        run_rule("no-mixed-types", json!({}), &with(vec![TypeTag::String, TypeTag::Number])),
        1
    );
    assert_eq!(
        run_rule(
            "no-mixed-types",
            json!({}),
            &with(vec![TypeTag::String, TypeTag::Missing, TypeTag::Null])
        ),
        0
    );
}
