//! Memoizing, deduplicating facade over a [`StoreDriver`].

use super::{DataAccess, SingleFlight, SYSTEM_COLLECTION_PREFIX};
use crate::log_query;
use crate::logging::{truncate_field, LogConfig};
use crate::prelude::*;
use crate::store::{Document, Emitter, MapReduce, StoreConnection, StoreDriver};
use async_trait::async_trait;
use futures::future::FutureExt;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

type FieldTypes = Arc<BTreeMap<String, BTreeSet<TypeTag>>>;

/// Cache effectiveness counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served by an existing (resolved or in-flight) entry
    pub hits: usize,
    /// Requests that started a new computation
    pub misses: usize,
    /// Queries actually sent to the store
    pub store_queries: usize,
}

/// The production [`DataAccess`] implementation.
///
/// Collection names, field names and field types are each computed at most
/// once per key. Concurrent requests for the same key share one in-flight
/// query. Failed computations are forgotten so a later request retries, and
/// connection errors additionally drop the connection so the retry
/// reconnects instead of reusing a dead one.
///
/// # Example
///
/// ```rust
/// use mouette_guard::access::{CachedDataAccess, DataAccess};
/// use mouette_guard::store::InMemoryStore;
/// use serde_json::json;
///
/// # async fn example() -> mouette_guard::error::Result<()> {
/// let store = InMemoryStore::new().with_collection("users", vec![json!({"name": "ada"})])?;
/// let data = CachedDataAccess::new(store);
///
/// let fields = data.field_names("users").await?;
/// assert!(fields.contains("name"));
/// data.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CachedDataAccess {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    driver: Arc<dyn StoreDriver>,
    connection: SingleFlight<(), Arc<dyn StoreConnection>>,
    collection_names: SingleFlight<(), BTreeSet<String>>,
    field_names: SingleFlight<String, BTreeSet<String>>,
    field_types: SingleFlight<String, FieldTypes>,
    closed: AtomicBool,
    store_queries: AtomicUsize,
    log_config: LogConfig,
}

impl CachedDataAccess {
    /// Creates a facade that connects lazily on first use.
    pub fn new(driver: impl StoreDriver + 'static) -> Self {
        Self::with_config(Arc::new(driver), LogConfig::default())
    }

    /// Creates a facade with a custom logging configuration.
    pub fn with_config(driver: Arc<dyn StoreDriver>, log_config: LogConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                driver,
                connection: SingleFlight::new(),
                collection_names: SingleFlight::new(),
                field_names: SingleFlight::new(),
                field_types: SingleFlight::new(),
                closed: AtomicBool::new(false),
                store_queries: AtomicUsize::new(0),
                log_config,
            }),
        }
    }

    /// Returns the cache counters.
    pub fn stats(&self) -> CacheStats {
        let inner = &self.inner;
        let counters = [
            inner.collection_names.counters(),
            inner.field_names.counters(),
            inner.field_types.counters(),
        ];
        CacheStats {
            hits: counters.iter().map(|(hits, _)| hits).sum(),
            misses: counters.iter().map(|(_, misses)| misses).sum(),
            store_queries: inner.store_queries.load(Ordering::SeqCst),
        }
    }

    /// Whether [`DataAccess::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

impl Inner {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LintError::ConnectionClosed);
        }
        Ok(())
    }

    /// Returns the connection and the generation it was cached under.
    async fn connection(&self) -> Result<(u64, Arc<dyn StoreConnection>)> {
        self.ensure_open()?;
        let driver = Arc::clone(&self.driver);
        self.connection
            .get_or_run_tagged((), move || {
                async move {
                    info!(store = %driver.description(), "Connecting to store");
                    driver.connect().await
                }
                .boxed()
            })
            .await
    }

    /// Drops connection `generation` when `outcome` says it is unusable. A
    /// connection opened since then is kept.
    fn settle<T>(&self, generation: u64, outcome: Result<T>) -> Result<T> {
        if let Err(ref error) = outcome {
            if error.is_connection_error() {
                warn!(error = %error, generation, "Dropping store connection");
                if let Err(e) = self.connection.evict(&(), generation) {
                    warn!(error = %e, "Failed to drop store connection");
                }
            }
        }
        outcome
    }

    async fn run_map_reduce(
        &self,
        collection: &str,
        job: &MapReduce,
    ) -> Result<Vec<(Value, Value)>> {
        let (generation, conn) = self.connection().await?;
        self.store_queries.fetch_add(1, Ordering::SeqCst);
        log_query!(self.log_config, collection, job = job.label(), "Running map/reduce");
        self.settle(generation, conn.map_reduce(collection, job).await)
    }

    async fn load_collection_names(self: Arc<Self>) -> Result<BTreeSet<String>> {
        let (generation, conn) = self.connection().await?;
        self.store_queries.fetch_add(1, Ordering::SeqCst);
        log_query!(self.log_config, "Listing collections");
        let names = self.settle(generation, conn.list_collections().await)?;
        Ok(names
            .into_iter()
            .filter(|name| !name.starts_with(SYSTEM_COLLECTION_PREFIX))
            .collect())
    }

    async fn field_names(self: &Arc<Self>, collection: &str) -> Result<BTreeSet<String>> {
        self.ensure_open()?;
        let inner = Arc::clone(self);
        let key = collection.to_string();
        self.field_names
            .get_or_run(key.clone(), move || inner.load_field_names(key).boxed())
            .await
    }

    async fn load_field_names(self: Arc<Self>, collection: String) -> Result<BTreeSet<String>> {
        let job = MapReduce::new(
            "field-names",
            |doc: &Document, emit: &mut Emitter| {
                for key in doc.keys() {
                    emit.emit(key.clone(), Value::Null);
                }
            },
            |_key: &Value, _values: Vec<Value>| Value::Null,
        );
        let pairs = self.run_map_reduce(&collection, &job).await?;
        Ok(pairs
            .into_iter()
            .filter_map(|(key, _)| key.as_str().map(str::to_owned))
            .collect())
    }

    async fn field_types(self: &Arc<Self>, collection: &str) -> Result<FieldTypes> {
        self.ensure_open()?;
        let inner = Arc::clone(self);
        let key = collection.to_string();
        self.field_types
            .get_or_run(key.clone(), move || inner.load_field_types(key).boxed())
            .await
    }

    // One pass over the collection computes the type set of every field.
    async fn load_field_types(self: Arc<Self>, collection: String) -> Result<FieldTypes> {
        let fields = Arc::new(self.field_names(&collection).await?);

        let tracked = Arc::clone(&fields);
        let job = MapReduce::new(
            "field-value-types",
            move |doc: &Document, emit: &mut Emitter| {
                for field in tracked.iter() {
                    let tag = TypeTag::of_optional(doc.get(field));
                    emit.emit(field.clone(), json!([tag.name()]));
                }
            },
            |_key: &Value, values: Vec<Value>| {
                let union: BTreeSet<&str> = values
                    .iter()
                    .filter_map(Value::as_array)
                    .flatten()
                    .filter_map(Value::as_str)
                    .collect();
                json!(union)
            },
        );

        let pairs = self.run_map_reduce(&collection, &job).await?;
        let mut types = BTreeMap::new();
        for (key, value) in pairs {
            let Some(field) = key.as_str() else {
                continue;
            };
            let tags = value
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .map(|name| {
                    TypeTag::from_name(name).ok_or_else(|| {
                        LintError::database(&collection, format!("unknown type tag '{name}'"))
                    })
                })
                .collect::<Result<BTreeSet<_>>>()?;
            types.insert(field.to_string(), tags);
        }

        debug!(collection = %collection, fields = types.len(), "Computed field value types");
        Ok(Arc::new(types))
    }
}

#[async_trait]
impl DataAccess for CachedDataAccess {
    #[instrument(skip(self))]
    async fn collection_names(&self) -> Result<BTreeSet<String>> {
        self.inner.ensure_open()?;
        let inner = Arc::clone(&self.inner);
        self.inner
            .collection_names
            .get_or_run((), move || inner.load_collection_names().boxed())
            .await
    }

    #[instrument(skip(self))]
    async fn field_names(&self, collection: &str) -> Result<BTreeSet<String>> {
        self.inner.field_names(collection).await
    }

    #[instrument(skip(self))]
    async fn field_value_types(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<BTreeSet<TypeTag>> {
        let types = self.inner.field_types(collection).await?;
        Ok(types.get(field).cloned().unwrap_or_default())
    }

    #[instrument(skip(self, filter))]
    async fn exists_matching(&self, collection: &str, filter: &Value) -> Result<bool> {
        let (generation, conn) = self.inner.connection().await?;
        self.inner.store_queries.fetch_add(1, Ordering::SeqCst);
        log_query!(
            self.inner.log_config,
            collection,
            filter = %truncate_field(&filter.to_string(), self.inner.log_config.max_field_length),
            "Checking existence"
        );
        self.inner
            .settle(generation, conn.exists(collection, filter).await)
    }

    #[instrument(skip(self, job), fields(job = job.label()))]
    async fn aggregate(&self, collection: &str, job: &MapReduce) -> Result<Vec<(Value, Value)>> {
        self.inner.run_map_reduce(collection, job).await
    }

    #[instrument(skip(self))]
    async fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let connection = self.inner.connection.peek(&());
        self.inner.connection.clear()?;
        self.inner.collection_names.clear()?;
        self.inner.field_names.clear()?;
        self.inner.field_types.clear()?;

        if let Some(conn) = connection {
            conn.close().await?;
            info!("Closed store connection");
        }
        Ok(())
    }
}
