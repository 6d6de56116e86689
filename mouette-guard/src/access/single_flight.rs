//! Single-flight memoization of fallible asynchronous computations.

use crate::prelude::*;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

type SharedResult<V> = Shared<BoxFuture<'static, Result<V>>>;

struct Entry<V> {
    generation: u64,
    future: SharedResult<V>,
}

/// A map from key to an in-flight or resolved computation.
///
/// The first caller for a key starts the computation; every caller arriving
/// before or after it resolves attaches to the same shared future and
/// observes the same outcome. A failed entry is evicted so the next caller
/// starts over, but only if no newer computation replaced it meanwhile.
pub struct SingleFlight<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    next_generation: AtomicU64,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Returns the value for `key`, running `start` only if no entry exists.
    pub async fn get_or_run<F>(&self, key: K, start: F) -> Result<V>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V>>,
    {
        self.get_or_run_tagged(key, start)
            .await
            .map(|(_, value)| value)
    }

    /// Like [`get_or_run`](Self::get_or_run), also returning the generation
    /// of the entry the value came from.
    pub async fn get_or_run_tagged<F>(&self, key: K, start: F) -> Result<(u64, V)>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V>>,
    {
        let (generation, future) = self.attach(key.clone(), start)?;
        match future.await {
            Ok(value) => Ok((generation, value)),
            Err(error) => {
                self.evict(&key, generation)?;
                Err(error)
            }
        }
    }

    fn attach<F>(&self, key: K, start: F) -> Result<(u64, SharedResult<V>)>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V>>,
    {
        let mut entries = self.lock()?;
        if let Some(entry) = entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((entry.generation, entry.future.clone()));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let future = start().shared();
        entries.insert(
            key,
            Entry {
                generation,
                future: future.clone(),
            },
        );
        Ok((generation, future))
    }

    /// Forgets the entry for `key` only if it is still `generation`.
    pub fn evict(&self, key: &K, generation: u64) -> Result<()> {
        let mut entries = self.lock()?;
        if entries.get(key).is_some_and(|e| e.generation == generation) {
            entries.remove(key);
        }
        Ok(())
    }

    /// Returns the resolved value for `key`, if there is one.
    pub fn peek(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().ok()?;
        match entries.get(key)?.future.peek() {
            Some(Ok(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Forgets the entry for `key`, in flight or not.
    pub fn invalidate(&self, key: &K) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    /// Forgets every entry.
    pub fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `(hits, misses)` since creation.
    pub fn counters(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<K, Entry<V>>>> {
        self.entries
            .lock()
            .map_err(|e| LintError::Internal(format!("Failed to acquire cache lock: {e}")))
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Debug for SingleFlight<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("SingleFlight")
            .field("entries", &len)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}
