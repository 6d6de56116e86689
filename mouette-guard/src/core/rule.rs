//! The rule abstraction and validated rule instances.

use super::descriptor::{RuleDescriptor, Severity};
use super::failure::{Failure, FailureDetail, FailureReport, Location, Violation};
use super::options::RuleOptions;
use crate::access::DataAccess;
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::{self, Debug};
use std::sync::Arc;
use tracing::{debug, instrument};

/// A lint rule bound to its typed options.
///
/// `check` inspects the database and emits violations. `render` turns one
/// of its own violations into the human-facing report; it must be pure.
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl Rule for NoNull {
///     fn descriptor(&self) -> &'static RuleDescriptor {
///         &DESCRIPTOR
///     }
///
///     async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>> {
///         fan_out::per_field(data, |collection, field| async move {
///             // ...
///         })
///         .await
///     }
///
///     fn render(&self, location: &Location, _: &FailureDetail) -> Result<FailureReport> {
///         Ok(FailureReport::new(format!("Column **{location}** contains null values.")))
///     }
/// }
/// ```
#[async_trait]
pub trait Rule: Debug + Send + Sync {
    /// Static metadata of the rule type.
    fn descriptor(&self) -> &'static RuleDescriptor;

    /// Evaluates the rule against the whole database.
    async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>>;

    /// Renders one violation produced by `check`.
    fn render(&self, location: &Location, detail: &FailureDetail) -> Result<FailureReport>;
}

/// Builds a typed rule from validated options.
pub type RuleConstructor = fn(&RuleOptions) -> Result<Box<dyn Rule>>;

/// A registry entry: descriptor plus constructor.
#[derive(Clone, Copy)]
pub struct RuleRegistration {
    pub descriptor: &'static RuleDescriptor,
    pub construct: RuleConstructor,
}

impl Debug for RuleRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistration")
            .field("name", &self.descriptor.name)
            .finish_non_exhaustive()
    }
}

/// A rule descriptor bound to validated options.
#[derive(Debug)]
pub struct RuleInstance {
    descriptor: &'static RuleDescriptor,
    options: RuleOptions,
    rule: Box<dyn Rule>,
}

impl RuleInstance {
    /// Validates `raw` options and builds the rule. Never touches the database.
    pub fn new(registration: &RuleRegistration, raw: &Map<String, Value>) -> Result<Arc<Self>> {
        let options = RuleOptions::validate(registration.descriptor, raw)?;
        let rule = (registration.construct)(&options)?;
        debug!(rule = registration.descriptor.name, "Instantiated rule");
        Ok(Arc::new(Self {
            descriptor: registration.descriptor,
            options,
            rule,
        }))
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn descriptor(&self) -> &'static RuleDescriptor {
        self.descriptor
    }

    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    pub fn severity(&self) -> Severity {
        self.options.severity()
    }

    /// Runs the rule and binds every violation to this instance.
    #[instrument(skip(self, data), fields(rule = self.descriptor.name))]
    pub async fn failures(self: &Arc<Self>, data: &dyn DataAccess) -> Result<Vec<Failure>> {
        let violations = self.rule.check(data).await?;
        debug!(count = violations.len(), "Rule finished");
        Ok(violations
            .into_iter()
            .map(|v| Failure::new(Arc::clone(self), v.location, v.detail))
            .collect())
    }

    pub(crate) fn render(&self, location: &Location, detail: &FailureDetail) -> Result<FailureReport> {
        self.rule.render(location, detail)
    }
}
