//! Rule abstraction, failure model and lint orchestration.
//!
//! ## Overview
//!
//! - **[`RuleDescriptor`]**: static identity and documentation of a rule type
//! - **[`RuleOptions`]**: options validated against the descriptor's [`OptionSpec`]s
//! - **[`Rule`]**: a typed rule, able to check a database and render its findings
//! - **[`RuleInstance`]**: a descriptor bound to validated options
//! - **[`Failure`]** / **[`FailureJson`]**: a finding and its wire form
//! - **[`Linter`]**: runs a configured set of instances against one facade
//!
//! ```text
//! LintConfig ──► Registry ──► RuleInstance ─┐
//!                                           ├─► check(DataAccess) ─► Violation
//!                                           └─► render ─► FailureJson ─► diff
//! ```

mod descriptor;
mod diff;
pub mod fan_out;
mod failure;
mod linter;
mod options;
mod registry;
mod rule;

pub use descriptor::{Granularity, RuleDescriptor, Severity};
pub use diff::diff;
pub use failure::{
    failure_hash, Failure, FailureDetail, FailureJson, FailureReport, Location, LocationJson,
    RuleMetadataJson, Violation,
};
pub use linter::{LintReport, Linter, RejectedRule};
pub use options::{test_configurations, OptionKind, OptionSpec, RuleOptions, SEVERITY_OPTION};
pub use registry::Registry;
pub use rule::{Rule, RuleConstructor, RuleInstance, RuleRegistration};
