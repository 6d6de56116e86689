//! Failures produced by rule instances and their serialized form.

use super::descriptor::{Granularity, RuleDescriptor, Severity};
use super::rule::RuleInstance;
use crate::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Where a finding was made. Every finding names a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub collection: String,
    pub field: Option<String>,
}

impl Location {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            field: None,
        }
    }

    pub fn field(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            field: Some(field.into()),
        }
    }

    /// `collection.field`, or just `collection`.
    pub fn path(&self) -> String {
        match &self.field {
            Some(field) => format!("{}.{field}", self.collection),
            None => self.collection.clone(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Rule-specific data carried from detection to rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FailureDetail {
    #[default]
    None,
    /// Number of fields found in a collection
    FieldCount { actual: usize },
    /// Types observed for a field
    Types(BTreeSet<TypeTag>),
}

/// A finding as emitted by a rule, before it is bound to its instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub location: Location,
    pub detail: FailureDetail,
}

impl Violation {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            location: Location::collection(collection),
            detail: FailureDetail::None,
        }
    }

    pub fn field(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            location: Location::field(collection, field),
            detail: FailureDetail::None,
        }
    }

    pub fn with_detail(mut self, detail: FailureDetail) -> Self {
        self.detail = detail;
        self
    }
}

/// The human-facing part of a failure, produced by the owning rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureReport {
    pub failure: String,
    pub suggestion: Option<String>,
    pub mongo_command: Option<String>,
}

impl FailureReport {
    pub fn new(failure: impl Into<String>) -> Self {
        Self {
            failure: failure.into(),
            suggestion: None,
            mongo_command: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_mongo_command(mut self, command: impl Into<String>) -> Self {
        self.mongo_command = Some(command.into());
        self
    }
}

/// An immutable finding of one rule instance.
#[derive(Debug, Clone)]
pub struct Failure {
    rule: Arc<RuleInstance>,
    location: Location,
    detail: FailureDetail,
}

impl Failure {
    pub fn new(rule: Arc<RuleInstance>, location: Location, detail: FailureDetail) -> Self {
        Self {
            rule,
            location,
            detail,
        }
    }

    pub fn rule(&self) -> &RuleInstance {
        &self.rule
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn detail(&self) -> &FailureDetail {
        &self.detail
    }

    pub fn collection_name(&self) -> &str {
        &self.location.collection
    }

    pub fn key_name(&self) -> Option<&str> {
        self.location.field.as_deref()
    }

    /// The identity hash used for diffing.
    pub fn hash(&self) -> String {
        failure_hash(self.rule.name(), self.collection_name(), self.key_name())
    }

    /// Renders the serialized form. Deterministic for a given failure.
    pub fn to_json(&self) -> Result<FailureJson> {
        let report = self.rule.render(&self.location, &self.detail)?;
        Ok(FailureJson {
            rule_metadata: RuleMetadataJson::from(self.rule.descriptor()),
            options: self.rule.options().as_map().clone(),
            location: LocationJson {
                collection_name: Some(self.location.collection.clone()),
                key_name: self.location.field.clone(),
            },
            failure: report.failure,
            suggestion: report.suggestion,
            mongo_command: report.mongo_command,
            hash: self.hash(),
        })
    }
}

/// Hex SHA-256 of the JSON array `[rule, collection, key]`.
///
/// The array encoding keeps `("a.b", "c")` and `("a", "b.c")` apart and
/// distinguishes a missing key from an empty one.
pub fn failure_hash(rule: &str, collection: &str, key: Option<&str>) -> String {
    let identity = json!([rule, collection, key]).to_string();
    hex::encode(Sha256::digest(identity.as_bytes()))
}

/// Serialized rule metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMetadataJson {
    pub name: String,
    pub pretty_name: String,
    pub description: String,
    pub rationale: String,
    pub granularity: Granularity,
    pub is_fuzzy: bool,
}

impl From<&RuleDescriptor> for RuleMetadataJson {
    fn from(descriptor: &RuleDescriptor) -> Self {
        Self {
            name: descriptor.name.to_string(),
            pretty_name: descriptor.pretty_name.to_string(),
            description: descriptor.description.to_string(),
            rationale: descriptor.rationale.to_string(),
            granularity: descriptor.granularity,
            is_fuzzy: descriptor.is_fuzzy,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
}

/// The wire form of a failure, consumed by formatters and by `diff`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureJson {
    pub rule_metadata: RuleMetadataJson,
    pub options: BTreeMap<String, Value>,
    pub location: LocationJson,
    pub failure: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongo_command: Option<String>,
    pub hash: String,
}

impl FailureJson {
    /// Severity the failure was produced with, `warning` when unset.
    pub fn severity(&self) -> Severity {
        self.options
            .get(super::options::SEVERITY_OPTION)
            .and_then(Value::as_str)
            .and_then(Severity::parse)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_positional() {
        let a = failure_hash("no-null", "users", Some("name"));
        assert_eq!(a, failure_hash("no-null", "users", Some("name")));
        assert_eq!(a.len(), 64);

        assert_ne!(a, failure_hash("no-null", "users", None));
        assert_ne!(
            failure_hash("r", "a.b", Some("c")),
            failure_hash("r", "a", Some("b.c"))
        );
        assert_ne!(
            failure_hash("r", "a", Some("")),
            failure_hash("r", "a", None)
        );
    }

    #[test]
    fn test_location_path() {
        assert_eq!(Location::field("users", "name").path(), "users.name");
        assert_eq!(Location::collection("users").to_string(), "users");
    }

    #[test]
    fn test_failure_json_wire_shape() {
        let json = FailureJson {
            rule_metadata: RuleMetadataJson {
                name: "no-null".into(),
                pretty_name: "No null".into(),
                description: "d".into(),
                rationale: "r".into(),
                granularity: Granularity::Column,
                is_fuzzy: false,
            },
            options: BTreeMap::new(),
            location: LocationJson {
                collection_name: Some("users".into()),
                key_name: None,
            },
            failure: "f".into(),
            suggestion: None,
            mongo_command: Some("db.getCollection('users').find({})".into()),
            hash: "h".into(),
        };

        let value = serde_json::to_value(&json).unwrap();
        assert_eq!(value["ruleMetadata"]["prettyName"], "No null");
        assert_eq!(value["ruleMetadata"]["isFuzzy"], false);
        assert_eq!(value["ruleMetadata"]["granularity"], "column");
        assert_eq!(value["location"], json!({"collectionName": "users"}));
        assert!(value.get("suggestion").is_none());
        assert!(value.get("mongoCommand").is_some());

        let back: FailureJson = serde_json::from_value(value).unwrap();
        assert_eq!(back, json);
        assert_eq!(back.severity(), Severity::Warning);
    }
}
