//! In-memory implementation of the storage driver.
//!
//! Useful for testing, for linting Extended JSON dumps, and for exercising
//! connection failures deterministically.

use super::filter;
use super::{Document, MapReduce, StoreConnection, StoreDriver};
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, instrument};

/// Counters of the calls that reached the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub connects: usize,
    pub list_collections: usize,
    pub exists: usize,
    pub map_reduce: usize,
}

#[derive(Debug, Default)]
struct Counters {
    connects: AtomicUsize,
    list_collections: AtomicUsize,
    exists: AtomicUsize,
    map_reduce: AtomicUsize,
}

#[derive(Debug, Default)]
struct StoreState {
    collections: RwLock<BTreeMap<String, Vec<Document>>>,
    failing_collections: RwLock<HashMap<String, String>>,
    failing_connects: AtomicUsize,
    // Connections opened under an older generation are considered dropped.
    generation: AtomicU64,
    latency: RwLock<Option<Duration>>,
    counters: Counters,
}

/// A document store held entirely in memory.
///
/// # Example
///
/// ```rust
/// use mouette_guard::store::InMemoryStore;
/// use serde_json::json;
///
/// let store = InMemoryStore::new()
///     .with_collection("users", vec![json!({"_id": 1, "name": "ada"})])
///     .unwrap();
/// assert_eq!(store.collection_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<StoreState>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a dump shaped like `{"<collection>": [document, ...], ...}`.
    pub fn from_json_dump(dump: &Value) -> Result<Self> {
        let collections = dump.as_object().ok_or_else(|| {
            LintError::Serialization("dump must be an object of collections".to_string())
        })?;

        let mut store = Self::new();
        for (name, documents) in collections {
            let documents = documents.as_array().ok_or_else(|| {
                LintError::Serialization(format!("collection '{name}' must be an array"))
            })?;
            store = store.with_collection(name.clone(), documents.clone())?;
        }
        Ok(store)
    }

    /// Adds (or replaces) a collection. Every document must be a JSON object.
    pub fn with_collection(self, name: impl Into<String>, documents: Vec<Value>) -> Result<Self> {
        let name = name.into();
        let documents = documents
            .into_iter()
            .map(|doc| match doc {
                Value::Object(map) => Ok(map),
                other => Err(LintError::Serialization(format!(
                    "document in '{name}' is not an object: {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        self.state
            .collections
            .write()
            .map_err(|e| LintError::Internal(format!("store lock poisoned: {e}")))?
            .insert(name, documents);
        Ok(self)
    }

    /// Delays every connection operation, so concurrent requests overlap.
    pub fn with_latency(self, latency: Duration) -> Self {
        if let Ok(mut slot) = self.state.latency.write() {
            *slot = Some(latency);
        }
        self
    }

    /// Makes every query against `collection` fail with a database error.
    pub fn fail_collection(&self, collection: impl Into<String>, message: impl Into<String>) {
        if let Ok(mut failing) = self.state.failing_collections.write() {
            failing.insert(collection.into(), message.into());
        }
    }

    /// Makes the next `count` connection attempts fail.
    pub fn fail_next_connects(&self, count: usize) {
        self.state.failing_connects.store(count, Ordering::SeqCst);
    }

    /// Drops every open connection; their next operation fails with a connection error.
    pub fn drop_connections(&self) {
        self.state.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns the number of collections.
    pub fn collection_count(&self) -> usize {
        self.state.collections.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Returns a snapshot of the call counters.
    pub fn stats(&self) -> StoreStats {
        let c = &self.state.counters;
        StoreStats {
            connects: c.connects.load(Ordering::SeqCst),
            list_collections: c.list_collections.load(Ordering::SeqCst),
            exists: c.exists.load(Ordering::SeqCst),
            map_reduce: c.map_reduce.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl StoreDriver for InMemoryStore {
    #[instrument(skip(self), fields(store_type = "in_memory"))]
    async fn connect(&self) -> Result<Arc<dyn StoreConnection>> {
        self.state.counters.connects.fetch_add(1, Ordering::SeqCst);

        let should_fail = self
            .state
            .failing_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(LintError::Connection(
                "in-memory store refused the connection".to_string(),
            ));
        }

        debug!("Opened in-memory connection");
        Ok(Arc::new(MemoryConnection {
            state: Arc::clone(&self.state),
            generation: self.state.generation.load(Ordering::SeqCst),
            closed: AtomicBool::new(false),
        }))
    }

    fn description(&self) -> String {
        format!("in-memory store with {} collections", self.collection_count())
    }
}

#[derive(Debug)]
struct MemoryConnection {
    state: Arc<StoreState>,
    generation: u64,
    closed: AtomicBool,
}

impl MemoryConnection {
    async fn ready(&self) -> Result<()> {
        let latency = self.state.latency.read().ok().and_then(|l| *l);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(LintError::Connection("connection is closed".to_string()));
        }
        if self.generation != self.state.generation.load(Ordering::SeqCst) {
            return Err(LintError::Connection("connection reset by store".to_string()));
        }
        Ok(())
    }

    fn with_documents<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&[Document]) -> Result<T>,
    ) -> Result<T> {
        if let Some(message) = self
            .state
            .failing_collections
            .read()
            .ok()
            .and_then(|failing| failing.get(collection).cloned())
        {
            return Err(LintError::database(collection, message));
        }

        let collections = self
            .state
            .collections
            .read()
            .map_err(|e| LintError::Internal(format!("store lock poisoned: {e}")))?;
        // Querying a collection that does not exist behaves like an empty one.
        let documents = collections.get(collection).map_or(&[][..], Vec::as_slice);
        f(documents)
    }
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn list_collections(&self) -> Result<Vec<String>> {
        self.state
            .counters
            .list_collections
            .fetch_add(1, Ordering::SeqCst);
        self.ready().await?;

        let collections = self
            .state
            .collections
            .read()
            .map_err(|e| LintError::Internal(format!("store lock poisoned: {e}")))?;
        Ok(collections.keys().cloned().collect())
    }

    async fn exists(&self, collection: &str, query: &Value) -> Result<bool> {
        self.state.counters.exists.fetch_add(1, Ordering::SeqCst);
        self.ready().await?;

        self.with_documents(collection, |documents| {
            for document in documents {
                if filter::matches(document, query)
                    .map_err(|message| LintError::database(collection, message))?
                {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    async fn map_reduce(
        &self,
        collection: &str,
        job: &MapReduce,
    ) -> Result<Vec<(Value, Value)>> {
        self.state.counters.map_reduce.fetch_add(1, Ordering::SeqCst);
        self.ready().await?;

        self.with_documents(collection, |documents| {
            // Keys are grouped by their JSON text, which also fixes the output order.
            let mut grouped: BTreeMap<String, (Value, Vec<Value>)> = BTreeMap::new();
            for document in documents {
                for (key, value) in job.map_document(document) {
                    let slot = grouped
                        .entry(key.to_string())
                        .or_insert_with(|| (key, Vec::new()));
                    slot.1.push(value);
                }
            }
            Ok(grouped
                .into_values()
                .map(|(key, values)| {
                    let reduced = job.reduce_values(&key, values);
                    (key, reduced)
                })
                .collect())
        })
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Emitter;
    use serde_json::json;

    fn store() -> InMemoryStore {
        InMemoryStore::new()
            .with_collection(
                "users",
                vec![json!({"_id": 1, "name": "ada"}), json!({"_id": 2, "age": 36})],
            )
            .unwrap()
            .with_collection("system.indexes", vec![])
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_and_exists() {
        let store = store();
        let conn = store.connect().await.unwrap();

        let names = conn.list_collections().await.unwrap();
        assert_eq!(names, vec!["system.indexes".to_string(), "users".to_string()]);

        assert!(conn.exists("users", &json!({"age": 36})).await.unwrap());
        assert!(!conn.exists("users", &json!({"age": 37})).await.unwrap());
        assert!(!conn.exists("nope", &json!({})).await.unwrap());

        let stats = store.stats();
        assert_eq!(stats.connects, 1);
        assert_eq!(stats.exists, 3);
    }

    #[tokio::test]
    async fn test_map_reduce_groups_keys() {
        let store = store();
        let conn = store.connect().await.unwrap();
        let job = MapReduce::new(
            "keys",
            |doc: &Document, emit: &mut Emitter| {
                for key in doc.keys() {
                    emit.emit(key.clone(), Value::Null);
                }
            },
            |_key: &Value, _values: Vec<Value>| Value::Null,
        );

        let pairs = conn.map_reduce("users", &job).await.unwrap();
        let keys: Vec<_> = pairs.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![json!("_id"), json!("age"), json!("name")]);
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = store();
        store.fail_next_connects(1);
        assert!(store.connect().await.unwrap_err().is_connection_error());

        let conn = store.connect().await.unwrap();
        store.drop_connections();
        assert!(conn.list_collections().await.unwrap_err().is_connection_error());

        let conn = store.connect().await.unwrap();
        store.fail_collection("users", "query exceeded time limit");
        let err = conn.exists("users", &json!({})).await.unwrap_err();
        assert!(matches!(err, LintError::Database { .. }));

        conn.close().await.unwrap();
        assert!(conn.list_collections().await.is_err());
    }

    #[test]
    fn test_from_json_dump() {
        let store = InMemoryStore::from_json_dump(&json!({"a": [{"x": 1}], "b": []})).unwrap();
        assert_eq!(store.collection_count(), 2);
        assert!(InMemoryStore::from_json_dump(&json!({"a": [1]})).is_err());
        assert!(InMemoryStore::from_json_dump(&json!([])).is_err());
    }
}
