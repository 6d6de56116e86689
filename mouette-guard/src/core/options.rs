//! Declarative rule options and their validation.
//!
//! Every rule declares its options as a static list of [`OptionSpec`]s. The
//! same declaration validates user configuration (fail-fast, before any
//! database access), documents the rule, and generates the exhaustive set of
//! option combinations used by table-driven tests.

use super::descriptor::{RuleDescriptor, Severity};
use crate::prelude::*;
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Option key accepted by every rule in addition to its declared options.
pub const SEVERITY_OPTION: &str = "severity";

/// The type and constraints of a rule option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Boolean,
    /// One of a fixed set of strings
    Enum(&'static [&'static str]),
    /// A string that must compile as a regular expression
    Regexp,
    String,
    Number,
    /// A non-empty list of non-empty strings
    StringList {
        /// Only ASCII letters and digits are allowed
        alphanumeric: bool,
        /// Duplicates are rejected
        unique: bool,
    },
}

impl OptionKind {
    /// The type name used in option descriptions.
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionKind::Boolean => "boolean",
            OptionKind::Enum(_) => "enum",
            OptionKind::Regexp => "regexp",
            OptionKind::String => "string",
            OptionKind::Number => "number",
            OptionKind::StringList { .. } => "string[]",
        }
    }

    fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            OptionKind::Boolean => match value {
                Value::Bool(_) => Ok(()),
                other => Err(format!("must be a boolean, got {other}")),
            },
            OptionKind::Enum(allowed) => match value.as_str() {
                Some(s) if allowed.iter().any(|a| *a == s) => Ok(()),
                _ => Err(format!(
                    "must be one of {}, got {value}",
                    quoted_alternatives(allowed)
                )),
            },
            OptionKind::Regexp => {
                let pattern = value
                    .as_str()
                    .ok_or_else(|| format!("must be a regular expression string, got {value}"))?;
                Regex::new(pattern)
                    .map(|_| ())
                    .map_err(|e| format!("is not a valid regular expression: {e}"))
            }
            OptionKind::String => match value {
                Value::String(_) => Ok(()),
                other => Err(format!("must be a string, got {other}")),
            },
            OptionKind::Number => match value {
                Value::Number(_) => Ok(()),
                other => Err(format!("must be a number, got {other}")),
            },
            OptionKind::StringList {
                alphanumeric,
                unique,
            } => {
                let items = match value {
                    Value::Array(items) if !items.is_empty() => items,
                    _ => return Err(format!("must be a non-empty list of strings, got {value}")),
                };
                let mut seen = HashSet::new();
                for item in items {
                    let s = match item.as_str() {
                        Some(s) if !s.is_empty() => s,
                        _ => return Err(format!("must only contain non-empty strings, got {item}")),
                    };
                    if *alphanumeric && !s.chars().all(|c| c.is_ascii_alphanumeric()) {
                        return Err(format!("must only contain alphanumeric strings, got \"{s}\""));
                    }
                    if *unique && !seen.insert(s) {
                        return Err(format!("must not contain duplicates, got \"{s}\" twice"));
                    }
                }
                Ok(())
            }
        }
    }
}

fn quoted_alternatives(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// One declared option of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
}

impl OptionSpec {
    pub const fn new(name: &'static str, description: &'static str, kind: OptionKind) -> Self {
        Self {
            name,
            description,
            kind,
        }
    }
}

/// Options that passed validation against a rule's declaration.
///
/// Keys are kept sorted so serialized failures are deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOptions {
    rule: &'static str,
    values: BTreeMap<String, Value>,
}

impl RuleOptions {
    /// Validates raw configuration values against `descriptor`.
    ///
    /// Every declared option is required, undeclared keys are rejected, and
    /// `severity` is accepted by every rule.
    pub fn validate(descriptor: &RuleDescriptor, raw: &Map<String, Value>) -> Result<Self> {
        let rule = descriptor.name;

        for key in raw.keys() {
            if key != SEVERITY_OPTION && descriptor.option(key).is_none() {
                return Err(LintError::configuration(
                    rule,
                    format!("unexpected option '{key}'"),
                ));
            }
        }

        let mut values = BTreeMap::new();
        for spec in descriptor.options {
            let value = raw.get(spec.name).ok_or_else(|| {
                LintError::configuration(rule, format!("missing required option '{}'", spec.name))
            })?;
            spec.kind.check(value).map_err(|message| {
                LintError::configuration(rule, format!("option '{}' {message}", spec.name))
            })?;
            values.insert(spec.name.to_string(), value.clone());
        }

        if let Some(severity) = raw.get(SEVERITY_OPTION) {
            if severity.as_str().and_then(Severity::parse).is_none() {
                return Err(LintError::configuration(
                    rule,
                    format!("option 'severity' must be one of 'warning' | 'error', got {severity}"),
                ));
            }
            values.insert(SEVERITY_OPTION.to_string(), severity.clone());
        }

        Ok(Self { rule, values })
    }

    /// Name of the rule these options belong to.
    pub fn rule(&self) -> &'static str {
        self.rule
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        self.typed(name, Value::as_bool)
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        self.typed(name, Value::as_str)
    }

    pub fn f64(&self, name: &str) -> Result<f64> {
        self.typed(name, Value::as_f64)
    }

    pub fn string_list(&self, name: &str) -> Result<Vec<String>> {
        self.typed(name, |value| {
            value
                .as_array()?
                .iter()
                .map(|item| item.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
        })
    }

    /// Compiles a `regexp` option.
    pub fn regex(&self, name: &str) -> Result<Regex> {
        let pattern = self.str(name)?;
        Regex::new(pattern).map_err(|_| LintError::unknown_option_value(self.rule, name, pattern))
    }

    /// The configured severity, `warning` when absent.
    pub fn severity(&self) -> Severity {
        self.values
            .get(SEVERITY_OPTION)
            .and_then(Value::as_str)
            .and_then(Severity::parse)
            .unwrap_or_default()
    }

    // A miss here means validation let through something it should not have.
    fn typed<'a, T>(&'a self, name: &str, f: impl FnOnce(&'a Value) -> Option<T>) -> Result<T> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| LintError::unknown_option_value(self.rule, name, "<missing>"))?;
        f(value).ok_or_else(|| LintError::unknown_option_value(self.rule, name, value))
    }
}

impl Serialize for RuleOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// Every combination of values for a rule's options.
///
/// Only boolean and enum options have a finite domain; any other option
/// kind makes generation fail.
pub fn test_configurations(descriptor: &RuleDescriptor) -> Result<Vec<Map<String, Value>>> {
    let mut configurations = vec![Map::new()];
    for spec in descriptor.options {
        let domain: Vec<Value> = match spec.kind {
            OptionKind::Boolean => vec![Value::Bool(false), Value::Bool(true)],
            OptionKind::Enum(values) => values.iter().map(|v| Value::from(*v)).collect(),
            other => {
                return Err(LintError::configuration(
                    descriptor.name,
                    format!(
                        "can't generate test configurations for option '{}' of type {}",
                        spec.name,
                        other.type_name()
                    ),
                ))
            }
        };

        configurations = configurations
            .iter()
            .flat_map(|partial| {
                domain.iter().map(move |value| {
                    let mut next = partial.clone();
                    next.insert(spec.name.to_string(), value.clone());
                    next
                })
            })
            .collect();
    }
    Ok(configurations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::Granularity;
    use serde_json::json;

    const OPTIONS: &[OptionSpec] = &[
        OptionSpec::new("case", "The case.", OptionKind::Enum(&["camel", "snake"])),
        OptionSpec::new("strict", "Strictness.", OptionKind::Boolean),
        OptionSpec::new(
            "prefixes",
            "Prefixes.",
            OptionKind::StringList {
                alphanumeric: true,
                unique: true,
            },
        ),
    ];

    const DESCRIPTOR: RuleDescriptor = RuleDescriptor {
        name: "test-rule",
        pretty_name: "Test rule",
        description: "A rule for tests.",
        rationale: "Tests.",
        granularity: Granularity::Field,
        is_fuzzy: false,
        options: OPTIONS,
    };

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_options() {
        let options = RuleOptions::validate(
            &DESCRIPTOR,
            &raw(json!({"case": "snake", "strict": true, "prefixes": ["is"], "severity": "error"})),
        )
        .unwrap();
        assert_eq!(options.str("case").unwrap(), "snake");
        assert!(options.bool("strict").unwrap());
        assert_eq!(options.string_list("prefixes").unwrap(), vec!["is"]);
        assert_eq!(options.severity(), Severity::Error);

        // keys serialize sorted
        let text = serde_json::to_string(&options).unwrap();
        assert_eq!(
            text,
            r#"{"case":"snake","prefixes":["is"],"severity":"error","strict":true}"#
        );
    }

    #[test]
    fn test_rejected_options() {
        let cases = [
            json!({"strict": true, "prefixes": ["is"]}),
            json!({"case": "kebab", "strict": true, "prefixes": ["is"]}),
            json!({"case": "camel", "strict": "yes", "prefixes": ["is"]}),
            json!({"case": "camel", "strict": true, "prefixes": []}),
            json!({"case": "camel", "strict": true, "prefixes": ["is", "is"]}),
            json!({"case": "camel", "strict": true, "prefixes": ["is-a"]}),
            json!({"case": "camel", "strict": true, "prefixes": ["is"], "extra": 1}),
            json!({"case": "camel", "strict": true, "prefixes": ["is"], "severity": "fatal"}),
        ];
        for case in cases {
            let err = RuleOptions::validate(&DESCRIPTOR, &raw(case.clone())).unwrap_err();
            assert!(err.is_configuration_error(), "{case} should be rejected");
        }
    }

    #[test]
    fn test_regexp_must_compile() {
        const PATTERN: &[OptionSpec] =
            &[OptionSpec::new("pattern", "A pattern.", OptionKind::Regexp)];
        let descriptor = RuleDescriptor {
            options: PATTERN,
            ..DESCRIPTOR
        };
        assert!(RuleOptions::validate(&descriptor, &raw(json!({"pattern": "**"}))).is_err());
        let options = RuleOptions::validate(&descriptor, &raw(json!({"pattern": "^\\d+$"}))).unwrap();
        assert!(options.regex("pattern").unwrap().is_match("42"));
    }

    #[test]
    fn test_getter_type_mismatch_is_unknown_option_value() {
        let options = RuleOptions::validate(
            &DESCRIPTOR,
            &raw(json!({"case": "snake", "strict": true, "prefixes": ["is"]})),
        )
        .unwrap();
        assert!(matches!(
            options.bool("case"),
            Err(LintError::UnknownOptionValue { .. })
        ));
        assert!(options.f64("missing").is_err());
        assert_eq!(options.severity(), Severity::Warning);
    }

    #[test]
    fn test_configuration_product() {
        let descriptor = RuleDescriptor {
            options: &OPTIONS[..2],
            ..DESCRIPTOR
        };
        let configs = test_configurations(&descriptor).unwrap();
        assert_eq!(configs.len(), 4);
        assert!(configs.contains(&raw(json!({"case": "snake", "strict": false}))));

        assert!(test_configurations(&DESCRIPTOR).is_err());

        let none = RuleDescriptor {
            options: &[],
            ..DESCRIPTOR
        };
        assert_eq!(test_configurations(&none).unwrap(), vec![Map::new()]);
    }
}
