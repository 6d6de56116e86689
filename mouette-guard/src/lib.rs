//! # Mouette - Schema Linting for Document Databases
//!
//! Mouette inspects a live document store and reports violations of naming
//! and typing conventions: collection and key casing, singular or plural
//! collection names, keys that look like dates or booleans but hold
//! something else, nulls, mixed types, stringified numbers and dates.
//!
//! ## Quick Start
//!
//! ```rust
//! use mouette_guard::prelude::*;
//! use mouette_guard::formatters::{FailureFormatter, HumanFormatter};
//! use mouette_guard::store::InMemoryStore;
//! use serde_json::json;
//!
//! # async fn example() -> mouette_guard::error::Result<()> {
//! let store = InMemoryStore::new().with_collection(
//!     "users",
//!     vec![json!({"_id": {"$oid": "1"}, "isAdmin": "yes", "updated_at": null})],
//! )?;
//!
//! let report = Linter::new(LintConfig::default_config()?).lint_store(store).await?;
//! println!("{}", HumanFormatter::new().format(&report.failures)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`store`**: the driver interface a database adapter implements, and an
//!   in-memory driver for dumps and tests
//! - **`access`**: the cached, request-deduplicating facade every rule reads through
//! - **`core`**: rule abstraction, options, failures, `diff` and the [`core::Linter`]
//! - **`rules`**: the builtin rule catalog plus casing and inflection helpers
//! - **`config`**: rule configuration files merged over embedded defaults
//! - **`formatters`**: JSON, human and summary output
//!
//! Rules share one [`access::CachedDataAccess`] per run, so each collection
//! is scanned once however many rules ask about it.

pub mod access;
pub mod config;
pub mod core;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod rules;
pub mod store;
pub mod types;
