//! Orchestration of a complete lint run.
//!
//! The linter instantiates every enabled rule from a [`LintConfig`], runs
//! all instances concurrently against one shared [`DataAccess`], renders the
//! findings and closes the facade. Rules whose configuration is invalid are
//! reported in [`LintReport::rejected`] without stopping the others; a
//! database error aborts the whole run.

use super::failure::{Failure, FailureJson};
use super::registry::Registry;
use super::rule::RuleInstance;
use crate::access::{CachedDataAccess, DataAccess};
use crate::config::LintConfig;
use crate::log_rule;
use crate::logging::LogConfig;
use crate::prelude::*;
use crate::store::StoreDriver;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A rule that was configured but could not be instantiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRule {
    pub rule: String,
    pub reason: String,
}

/// The outcome of a lint run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub failures: Vec<FailureJson>,
    pub rejected: Vec<RejectedRule>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.rejected.is_empty()
    }

    /// Number of failures produced with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.failures
            .iter()
            .filter(|f| f.severity() == severity)
            .count()
    }
}

/// Runs a configured set of rules against a database.
///
/// # Example
///
/// ```rust
/// use mouette_guard::config::LintConfig;
/// use mouette_guard::core::Linter;
/// use mouette_guard::store::InMemoryStore;
/// use serde_json::json;
///
/// # async fn example() -> mouette_guard::error::Result<()> {
/// let store = InMemoryStore::new().with_collection("cats", vec![json!({"name": null})])?;
/// let linter = Linter::new(LintConfig::default_config()?);
///
/// let report = linter.lint_store(store).await?;
/// assert!(report.failures.iter().any(|f| f.rule_metadata.name == "no-null"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Linter {
    config: LintConfig,
    registry: Registry,
    log_config: LogConfig,
}

impl Linter {
    /// Creates a linter over the builtin rules.
    pub fn new(config: LintConfig) -> Self {
        Self {
            config,
            registry: Registry::builtin(),
            log_config: LogConfig::default(),
        }
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    /// Builds an instance of every enabled rule. Never touches the database.
    pub fn instances(&self) -> (Vec<Arc<RuleInstance>>, Vec<RejectedRule>) {
        let mut instances = Vec::new();
        let mut rejected = Vec::new();

        for (name, rule) in self.config.rules() {
            if !rule.is_enabled() {
                log_rule!(self.log_config, rule = name, "Rule disabled");
                continue;
            }
            let Some(registration) = self.registry.get(name) else {
                warn!(rule = name, "Unknown rule in configuration");
                rejected.push(RejectedRule {
                    rule: name.to_string(),
                    reason: format!("unknown rule '{name}'"),
                });
                continue;
            };
            match RuleInstance::new(registration, &rule.options) {
                Ok(instance) => instances.push(instance),
                Err(e) => {
                    warn!(rule = name, error = %e, "Rejected rule configuration");
                    rejected.push(RejectedRule {
                        rule: name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        (instances, rejected)
    }

    /// Runs every enabled rule against `data`, then closes it.
    #[instrument(skip(self, data), fields(rules = self.config.len()))]
    pub async fn run(&self, data: &dyn DataAccess) -> Result<LintReport> {
        let started_at = Utc::now();
        let (instances, rejected) = self.instances();
        info!(
            instances = instances.len(),
            rejected = rejected.len(),
            "Starting lint run"
        );

        let outcome = self.evaluate(&instances, data).await;
        let closed = data.close().await;
        let failures = outcome?;
        closed.context("Failed to close the database")?;

        let finished_at = Utc::now();
        info!(
            failures = failures.len(),
            duration_ms = (finished_at - started_at).num_milliseconds(),
            "Lint run finished"
        );
        Ok(LintReport {
            started_at,
            finished_at,
            failures,
            rejected,
        })
    }

    /// Runs the rules against a fresh facade over `driver`.
    pub async fn lint_store(&self, driver: impl StoreDriver + 'static) -> Result<LintReport> {
        let data = CachedDataAccess::with_config(Arc::new(driver), self.log_config.clone());
        self.run(&data).await
    }

    async fn evaluate(
        &self,
        instances: &[Arc<RuleInstance>],
        data: &dyn DataAccess,
    ) -> Result<Vec<FailureJson>> {
        let per_rule = try_join_all(instances.iter().map(|instance| async move {
            let failures = instance
                .failures(data)
                .await
                .with_context(|| format!("Rule '{}' failed", instance.name()))?;
            log_rule!(
                self.log_config,
                rule = instance.name(),
                failures = failures.len(),
                "Rule evaluated"
            );
            Ok::<_, LintError>(failures)
        }))
        .await?;

        per_rule
            .into_iter()
            .flatten()
            .map(|failure: Failure| failure.to_json())
            .collect()
    }
}
