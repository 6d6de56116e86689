//! Prelude for commonly used types and traits in mouette-guard.

pub use crate::access::{CachedDataAccess, DataAccess};
pub use crate::config::LintConfig;
pub use crate::core::{Failure, FailureJson, LintReport, Linter, Registry, Rule, RuleInstance, Severity};
pub use crate::error::{ErrorContext, LintError, Result};
pub use crate::logging::LogConfig;
pub use crate::types::TypeTag;
