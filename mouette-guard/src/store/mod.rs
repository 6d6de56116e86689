//! Storage driver interface consumed by the data access facade.
//!
//! A driver hands out connections; a connection answers the handful of
//! primitives the linter needs (listing collections, existence checks with a
//! MongoDB-style filter, and per-document map/reduce). Everything else, such
//! as caching and request deduplication, lives in [`crate::access`].

use crate::prelude::*;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::{self, Debug};
use std::sync::Arc;

pub mod filter;
mod memory;

pub use memory::{InMemoryStore, StoreStats};

/// A stored document.
pub type Document = Map<String, Value>;

/// Collects the `(key, value)` pairs emitted by a map function.
#[derive(Debug, Default)]
pub struct Emitter {
    pairs: Vec<(Value, Value)>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits one pair for the current document.
    pub fn emit(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Consumes the emitter, returning everything emitted so far.
    pub fn into_pairs(self) -> Vec<(Value, Value)> {
        self.pairs
    }
}

type MapFn = dyn Fn(&Document, &mut Emitter) + Send + Sync;
type ReduceFn = dyn Fn(&Value, Vec<Value>) -> Value + Send + Sync;

/// A map/reduce aggregation over every document of a collection.
///
/// The map function is called once per document and may emit any number of
/// pairs. The reduce function folds all values emitted under the same key and
/// is only invoked for keys that received more than one value.
#[derive(Clone)]
pub struct MapReduce {
    label: String,
    map: Arc<MapFn>,
    reduce: Arc<ReduceFn>,
}

impl MapReduce {
    /// Creates a new aggregation. The label shows up in logs.
    pub fn new<M, R>(label: impl Into<String>, map: M, reduce: R) -> Self
    where
        M: Fn(&Document, &mut Emitter) + Send + Sync + 'static,
        R: Fn(&Value, Vec<Value>) -> Value + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            map: Arc::new(map),
            reduce: Arc::new(reduce),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Runs the map function over one document.
    pub fn map_document(&self, document: &Document) -> Vec<(Value, Value)> {
        let mut emitter = Emitter::new();
        (self.map)(document, &mut emitter);
        emitter.into_pairs()
    }

    /// Folds the values emitted for one key.
    pub fn reduce_values(&self, key: &Value, mut values: Vec<Value>) -> Value {
        if values.len() == 1 {
            return values.remove(0);
        }
        (self.reduce)(key, values)
    }
}

impl Debug for MapReduce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapReduce")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Opens connections to a document store.
#[async_trait]
pub trait StoreDriver: Debug + Send + Sync {
    /// Establishes a new connection.
    async fn connect(&self) -> Result<Arc<dyn StoreConnection>>;

    /// Returns a human-readable description of the store.
    fn description(&self) -> String;
}

/// An open connection to a document store.
///
/// Implementations must never mutate data.
#[async_trait]
pub trait StoreConnection: Debug + Send + Sync {
    /// Lists every collection, internal ones included.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Returns true iff at least one document in `collection` matches `filter`.
    async fn exists(&self, collection: &str, filter: &Value) -> Result<bool>;

    /// Runs a map/reduce aggregation, returning the reduced `(key, value)` pairs.
    async fn map_reduce(&self, collection: &str, job: &MapReduce)
        -> Result<Vec<(Value, Value)>>;

    /// Closes the connection.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_reduce_only_reduces_repeated_keys() {
        let job = MapReduce::new(
            "count",
            |doc: &Document, emit: &mut Emitter| {
                for key in doc.keys() {
                    emit.emit(key.clone(), 1);
                }
            },
            |_key: &Value, values: Vec<Value>| json!(values.len()),
        );

        let doc = json!({"a": 1, "b": 2});
        let pairs = job.map_document(doc.as_object().unwrap());
        assert_eq!(pairs.len(), 2);

        assert_eq!(job.reduce_values(&json!("a"), vec![json!("kept")]), json!("kept"));
        assert_eq!(job.reduce_values(&json!("a"), vec![json!(1), json!(1)]), json!(2));
        assert!(format!("{job:?}").contains("count"));
    }
}
