//! Comparison of two serialized lint results.

use super::failure::FailureJson;
use std::collections::HashSet;

/// Returns the failures of `new` whose identity hash does not appear in `old`.
///
/// Comparison uses only the hash, so a reworded message is not a new
/// finding. The order and multiplicity of `new` are preserved.
pub fn diff(old: &[FailureJson], new: &[FailureJson]) -> Vec<FailureJson> {
    let known: HashSet<&str> = old.iter().map(|f| f.hash.as_str()).collect();
    new.iter()
        .filter(|f| !known.contains(f.hash.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::Granularity;
    use crate::core::failure::{failure_hash, LocationJson, RuleMetadataJson};
    use std::collections::BTreeMap;

    fn failure(rule: &str, collection: &str, message: &str) -> FailureJson {
        FailureJson {
            rule_metadata: RuleMetadataJson {
                name: rule.into(),
                pretty_name: rule.into(),
                description: String::new(),
                rationale: String::new(),
                granularity: Granularity::Collection,
                is_fuzzy: false,
            },
            options: BTreeMap::new(),
            location: LocationJson {
                collection_name: Some(collection.into()),
                key_name: None,
            },
            failure: message.into(),
            suggestion: None,
            mongo_command: None,
            hash: failure_hash(rule, collection, None),
        }
    }

    #[test]
    fn test_diff_of_identical_sets_is_empty() {
        let results = vec![failure("a", "x", "m"), failure("b", "y", "m")];
        assert!(diff(&results, &results).is_empty());
    }

    #[test]
    fn test_diff_finds_added_failure() {
        let old = vec![failure("a", "x", "m")];
        let new = vec![failure("a", "x", "m"), failure("a", "z", "m")];
        let added = diff(&old, &new);
        assert_eq!(added, vec![failure("a", "z", "m")]);
    }

    #[test]
    fn test_diff_ignores_wording() {
        let old = vec![failure("a", "x", "old wording")];
        let new = vec![failure("a", "x", "new wording")];
        assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn test_diff_keeps_order_and_duplicates() {
        let new = vec![
            failure("b", "y", "m"),
            failure("a", "x", "m"),
            failure("b", "y", "m"),
        ];
        let added = diff(&[], &new);
        assert_eq!(added, new);
    }
}
