//! Output formatting for lint results.
//!
//! Formatters work on the serialized [`FailureJson`] form, so they format a
//! fresh lint run and a `diff` of two stored runs the same way.
//!
//! # Examples
//!
//! ```rust
//! use mouette_guard::formatters::{FailureFormatter, HumanFormatter};
//!
//! let formatter = HumanFormatter::new().with_colors(false);
//! assert_eq!(formatter.format(&[]).unwrap(), "");
//! ```

use crate::config::LintConfig;
use crate::core::{FailureJson, Registry};
use crate::prelude::*;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::Write;

const RESET: &str = "\x1b[0m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const GRAY: &str = "\x1b[90m";
const WHITE: &str = "\x1b[37m";
const CYAN: &str = "\x1b[36m";

static BOLD: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").ok());
static ITALIC: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\*(.*?)\*").ok());

/// Trait for formatting lint failures into an output format.
pub trait FailureFormatter {
    fn format(&self, failures: &[FailureJson]) -> Result<String>;
}

/// Formats failures as a JSON array, readable back by `diff`.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a pretty-printing JSON formatter.
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl FailureFormatter for JsonFormatter {
    fn format(&self, failures: &[FailureJson]) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(failures)
        } else {
            serde_json::to_string(failures)
        };
        text.map_err(|e| LintError::Internal(format!("Failed to serialize failures to JSON: {e}")))
    }
}

fn severity_colour(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => YELLOW,
        Severity::Error => RED,
    }
}

// Replaces `pattern` matches with their first group, wrapped in `colour`.
fn emphasize(pattern: &Lazy<Option<Regex>>, text: &str, colour: Option<&str>) -> String {
    let Some(regex) = pattern.as_ref() else {
        return text.to_string();
    };
    let replacement = match colour {
        Some(colour) => format!("{colour}${{1}}{RESET}"),
        None => "${1}".to_string(),
    };
    regex.replace_all(text, replacement.as_str()).into_owned()
}

/// Warnings first, then errors; order within a group is preserved.
fn by_severity(failures: &[FailureJson]) -> impl Iterator<Item = &FailureJson> {
    let warnings = failures.iter().filter(|f| f.severity() == Severity::Warning);
    let errors = failures.iter().filter(|f| f.severity() == Severity::Error);
    warnings.chain(errors)
}

/// Human-readable output for terminals.
///
/// Each failure shows its message, an optional `You could...` suggestion and
/// the mongo shell command reproducing it. With colours enabled, bold
/// markdown is coloured by severity.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    use_colors: bool,
    include_commands: bool,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            include_commands: true,
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_commands(mut self, include: bool) -> Self {
        self.include_commands = include;
        self
    }

    fn paint(&self, colour: &str, text: &str) -> String {
        if self.use_colors {
            format!("{colour}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn format_one(&self, failure: &FailureJson) -> String {
        let colour = self.use_colors.then(|| severity_colour(failure.severity()));
        let mut out = emphasize(&BOLD, &failure.failure, colour);

        if let Some(suggestion) = &failure.suggestion {
            let names = emphasize(&ITALIC, suggestion, self.use_colors.then_some(WHITE));
            out.push('\n');
            out.push_str(&self.paint(GRAY, &format!("You could... {names}")));
        }
        if self.include_commands {
            if let Some(command) = &failure.mongo_command {
                out.push('\n');
                out.push_str(&self.paint(
                    GRAY,
                    &format!("To see the offending records run: {}", self.paint(CYAN, command)),
                ));
            }
        }
        out
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl FailureFormatter for HumanFormatter {
    fn format(&self, failures: &[FailureJson]) -> Result<String> {
        Ok(by_severity(failures)
            .map(|failure| self.format_one(failure))
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

/// One row per rule: display name, failure count and locations.
#[derive(Debug, Clone)]
pub struct SummaryFormatter {
    use_colors: bool,
}

impl SummaryFormatter {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }
}

impl Default for SummaryFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn location_of(failure: &FailureJson) -> String {
    let collection = failure.location.collection_name.as_deref().unwrap_or_default();
    match &failure.location.key_name {
        Some(key) => format!("{collection}.{key}"),
        None => collection.to_string(),
    }
}

impl FailureFormatter for SummaryFormatter {
    fn format(&self, failures: &[FailureJson]) -> Result<String> {
        let width = failures
            .iter()
            .map(|f| f.rule_metadata.pretty_name.len())
            .max()
            .unwrap_or(0)
            .max("Rule".len());

        let mut out = String::new();
        writeln!(out, "{:<width$}  {:>5}  Locations", "Rule", "Count")?;
        writeln!(out, "{}  {}  {}", "-".repeat(width), "-".repeat(5), "-".repeat(9))?;

        for severity in [Severity::Warning, Severity::Error] {
            let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
            for failure in failures.iter().filter(|f| f.severity() == severity) {
                groups
                    .entry(failure.rule_metadata.pretty_name.as_str())
                    .or_default()
                    .push(location_of(failure));
            }
            for (rule, locations) in groups {
                let padded = format!("{rule:<width$}");
                let name = if self.use_colors {
                    format!("{}{padded}{RESET}", severity_colour(severity))
                } else {
                    padded
                };
                writeln!(out, "{name}  {:>5}  {}", locations.len(), locations.join(", "))?;
            }
        }
        Ok(out)
    }
}

/// Renders the rule catalog as a markdown checklist, ticking the rules
/// `config` enables.
pub fn catalog_markdown(registry: &Registry, config: &LintConfig) -> Result<String> {
    let mut out = String::new();
    for registration in registry.iter() {
        let descriptor = registration.descriptor;
        let enabled = config
            .get(descriptor.name)
            .is_some_and(|rule| rule.is_enabled());
        writeln!(
            out,
            "- [{}] **{}**: {}",
            if enabled { "X" } else { " " },
            descriptor.pretty_name,
            descriptor.description
        )?;
        for option in descriptor.options {
            writeln!(
                out,
                "  * *{}* ({}): {}",
                option.name,
                option.kind.type_name(),
                option.description
            )?;
        }
    }
    Ok(out)
}
