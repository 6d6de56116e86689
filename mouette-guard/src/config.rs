//! Lint configuration: which rules run and with which options.
//!
//! A configuration maps rule names to a section holding an optional
//! `enabled` flag and the rule's options. User configuration is merged on
//! top of the embedded defaults, so it only needs to name what it changes.
//!
//! ```toml
//! [no-null]
//! enabled = false
//!
//! [key-names-case]
//! case = "snake"
//! severity = "error"
//! ```

use crate::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_CONFIG: &str = include_str!("../default_config.toml");

/// File names probed by [`LintConfig::discover`], in order.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "mouette.json",
    "mouette.yaml",
    "mouette.yml",
    "mouette.toml",
];

/// Serialization formats accepted for configuration and lint results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("toml") => Ok(Format::Toml),
            other => Err(LintError::configuration(
                path.display().to_string(),
                format!(
                    "unrecognized file extension: {}",
                    other.map_or_else(|| "<none>".to_string(), |e| format!(".{e}"))
                ),
            )),
        }
    }

    /// Parses `text` into a JSON value.
    pub fn parse(&self, text: &str) -> Result<Value> {
        Ok(match self {
            Format::Json => serde_json::from_str(text)?,
            Format::Yaml => serde_yaml::from_str(text)?,
            Format::Toml => toml::from_str(text)?,
        })
    }
}

/// Reads and parses a `.json`, `.yaml`/`.yml` or `.toml` file.
pub fn read_serialized(path: &Path) -> Result<Value> {
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    format
        .parse(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// One rule section of a configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Unset means enabled, so a section naming only options turns the rule on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Everything else in the section, `severity` included
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl RuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Overlays `user` on `self`: set flags and present keys win, nested
    /// objects merge recursively, everything else is replaced.
    fn merge(mut self, user: RuleConfig) -> Self {
        if user.enabled.is_some() {
            self.enabled = user.enabled;
        }
        for (key, value) in user.options {
            match self.options.get_mut(&key) {
                Some(existing) => merge_values(existing, value),
                None => {
                    self.options.insert(key, value);
                }
            }
        }
        self
    }
}

fn merge_values(base: &mut Value, user: Value) {
    match (base, user) {
        (Value::Object(base), Value::Object(user)) => {
            for (key, value) in user {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, user) => *base = user,
    }
}

/// A complete lint configuration, keyed by rule name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LintConfig {
    rules: BTreeMap<String, RuleConfig>,
}

impl LintConfig {
    /// An empty configuration: no rule runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// The embedded defaults, covering every builtin rule.
    pub fn default_config() -> Result<Self> {
        Self::from_str(DEFAULT_CONFIG, Format::Toml).context("Invalid embedded default configuration")
    }

    pub fn from_str(text: &str, format: Format) -> Result<Self> {
        Self::from_value(format.parse(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(LintError::configuration(
                "config",
                "configuration must be a table of rule sections",
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| LintError::configuration("config", format!("invalid rule section: {e}")))
    }

    /// Loads a configuration file, picking the format from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_value(read_serialized(path)?)?;
        info!(path = %path.display(), rules = config.len(), "Loaded configuration");
        Ok(config)
    }

    /// Loads the first `mouette.{json,yaml,yml,toml}` found in `dir`.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Option<Self>> {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.as_ref().join(name);
            if candidate.is_file() {
                return Self::from_path(candidate).map(Some);
            }
        }
        debug!(dir = %dir.as_ref().display(), "No configuration file found");
        Ok(None)
    }

    /// Overlays `user` on `self`. Rules only `user` names are kept as is.
    pub fn merge(mut self, user: LintConfig) -> Self {
        for (name, rule) in user.rules {
            let merged = match self.rules.remove(&name) {
                Some(base) => base.merge(rule),
                None => rule,
            };
            self.rules.insert(name, merged);
        }
        self
    }

    pub fn with_rule(mut self, name: impl Into<String>, rule: RuleConfig) -> Self {
        self.rules.insert(name.into(), rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RuleConfig> {
        self.rules.get(name)
    }

    /// Every rule section in name order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &RuleConfig)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Names of the rules that would run.
    pub fn enabled_rules(&self) -> Vec<&str> {
        self.rules()
            .filter(|(_, rule)| rule.is_enabled())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
