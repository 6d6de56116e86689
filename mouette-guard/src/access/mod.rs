//! Data access facade shared by every rule of a lint run.
//!
//! Rules never talk to the store directly. They go through [`DataAccess`],
//! whose production implementation [`CachedDataAccess`] memoizes the
//! expensive introspection queries and deduplicates concurrent requests for
//! the same collection, so a run with many rules scans each collection once.

use crate::prelude::*;
use crate::store::MapReduce;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Debug;

mod cached;
mod single_flight;
mod test_double;

pub use cached::{CacheStats, CachedDataAccess};
pub use single_flight::SingleFlight;
pub use test_double::TestDataAccess;

/// Prefix of the store's internal collections, which are never linted.
pub const SYSTEM_COLLECTION_PREFIX: &str = "system.";

/// Introspection primitives available to rules.
#[async_trait]
pub trait DataAccess: Debug + Send + Sync {
    /// Every user-level collection name.
    async fn collection_names(&self) -> Result<BTreeSet<String>>;

    /// The union of top-level field names across the documents of `collection`.
    async fn field_names(&self, collection: &str) -> Result<BTreeSet<String>>;

    /// Every type observed for `field` across `collection`, `missing` included
    /// when some document lacks the field.
    async fn field_value_types(&self, collection: &str, field: &str)
        -> Result<BTreeSet<TypeTag>>;

    /// True iff at least one document of `collection` matches `filter`.
    async fn exists_matching(&self, collection: &str, filter: &Value) -> Result<bool>;

    /// Runs a custom map/reduce aggregation over `collection`.
    async fn aggregate(&self, collection: &str, job: &MapReduce) -> Result<Vec<(Value, Value)>>;

    /// Releases the underlying connection. Idempotent.
    async fn close(&self) -> Result<()>;
}
