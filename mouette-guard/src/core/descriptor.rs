//! Static metadata describing a rule type.

use super::options::OptionSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The level at which a rule evaluates the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    /// One evaluation per collection
    Collection,
    /// One evaluation over every field name of a collection
    AllFieldNames,
    /// One evaluation per field name
    Field,
    /// One evaluation per field, looking at stored values
    Column,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Collection => "collection",
            Granularity::AllFieldNames => "all-field-names",
            Granularity::Field => "field",
            Granularity::Column => "column",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a finding is presented. Never changes what a rule detects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and documentation of a rule type.
///
/// One `'static` instance exists per rule type; it is never mutated.
#[derive(Debug, Clone, Copy)]
pub struct RuleDescriptor {
    /// Unique kebab-case name, also the configuration key
    pub name: &'static str,
    /// Display name
    pub pretty_name: &'static str,
    pub description: &'static str,
    /// Why following the rule matters
    pub rationale: &'static str,
    pub granularity: Granularity,
    /// Whether detection is a heuristic and may report false positives
    pub is_fuzzy: bool,
    /// Every option the rule accepts; all are required
    pub options: &'static [OptionSpec],
}

impl RuleDescriptor {
    /// Looks up a declared option by name.
    pub fn option(&self, name: &str) -> Option<&'static OptionSpec> {
        self.options.iter().find(|spec| spec.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_granularity_wire_names() {
        assert_eq!(
            serde_json::to_value(Granularity::AllFieldNames).unwrap(),
            json!("all-field-names")
        );
        assert_eq!(Granularity::Column.to_string(), "column");
    }

    #[test]
    fn test_severity() {
        assert_eq!(Severity::default(), Severity::Warning);
        assert_eq!(Severity::parse("error"), Some(Severity::Error));
        assert_eq!(Severity::parse("fatal"), None);
        assert!(Severity::Error > Severity::Warning);
    }
}
