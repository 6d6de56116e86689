//! A programmable [`DataAccess`] for rule tests.

use super::DataAccess;
use crate::prelude::*;
use crate::store::MapReduce;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;

/// A test double that answers only what it was told to answer.
///
/// Every accessor that was not mocked fails with
/// [`LintError::NotMocked`], so a rule test that touches more of the store
/// than intended fails loudly. Queued responses take precedence over static
/// ones for `exists_matching` and `aggregate`. Every call is counted and
/// every existence filter is recorded.
///
/// ```rust
/// use mouette_guard::access::{DataAccess, TestDataAccess};
///
/// # async fn example() {
/// let data = TestDataAccess::new().with_collection_names(["cats"]);
/// assert!(data.collection_names().await.is_ok());
/// assert!(data.field_names("cats").await.is_err());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct TestDataAccess {
    collection_names: Option<Result<BTreeSet<String>>>,
    field_names: HashMap<String, BTreeSet<String>>,
    field_types: HashMap<(String, String), BTreeSet<TypeTag>>,
    exists_default: Option<bool>,
    exists_queue: Mutex<VecDeque<Result<bool>>>,
    aggregate_results: HashMap<String, Vec<(Value, Value)>>,
    aggregate_queue: Mutex<VecDeque<Result<Vec<(Value, Value)>>>>,
    calls: Mutex<BTreeMap<&'static str, usize>>,
    filters: Mutex<Vec<(String, Value)>>,
}

impl TestDataAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collection_names = Some(Ok(names.into_iter().map(Into::into).collect()));
        self
    }

    /// Makes `collection_names` fail with `error`.
    pub fn with_collection_names_error(mut self, error: LintError) -> Self {
        self.collection_names = Some(Err(error));
        self
    }

    pub fn with_field_names<I, S>(mut self, collection: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_names.insert(
            collection.into(),
            names.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn with_field_types<I>(
        mut self,
        collection: impl Into<String>,
        field: impl Into<String>,
        types: I,
    ) -> Self
    where
        I: IntoIterator<Item = TypeTag>,
    {
        self.field_types
            .insert((collection.into(), field.into()), types.into_iter().collect());
        self
    }

    /// Answers every existence check with `answer` once the queue is empty.
    pub fn with_exists(mut self, answer: bool) -> Self {
        self.exists_default = Some(answer);
        self
    }

    /// Queues one response for the next existence check.
    pub fn queue_exists(self, response: Result<bool>) -> Self {
        if let Ok(mut queue) = self.exists_queue.lock() {
            queue.push_back(response);
        }
        self
    }

    pub fn with_aggregate(mut self, collection: impl Into<String>, pairs: Vec<(Value, Value)>) -> Self {
        self.aggregate_results.insert(collection.into(), pairs);
        self
    }

    /// Queues one response for the next aggregation.
    pub fn queue_aggregate(self, response: Result<Vec<(Value, Value)>>) -> Self {
        if let Ok(mut queue) = self.aggregate_queue.lock() {
            queue.push_back(response);
        }
        self
    }

    /// Number of times `operation` was called.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .ok()
            .and_then(|calls| calls.get(operation).copied())
            .unwrap_or(0)
    }

    /// Total number of accessor calls.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|c| c.values().sum()).unwrap_or(0)
    }

    /// Every `(collection, filter)` passed to `exists_matching`, in call order.
    pub fn recorded_filters(&self) -> Vec<(String, Value)> {
        self.filters.lock().map(|f| f.clone()).unwrap_or_default()
    }

    fn record(&self, operation: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(operation).or_insert(0) += 1;
        }
    }

    fn dequeue<T>(queue: &Mutex<VecDeque<Result<T>>>) -> Option<Result<T>> {
        queue.lock().ok().and_then(|mut q| q.pop_front())
    }
}

#[async_trait]
impl DataAccess for TestDataAccess {
    async fn collection_names(&self) -> Result<BTreeSet<String>> {
        self.record("collection_names");
        self.collection_names
            .clone()
            .unwrap_or(Err(LintError::NotMocked("collection_names")))
    }

    async fn field_names(&self, collection: &str) -> Result<BTreeSet<String>> {
        self.record("field_names");
        self.field_names
            .get(collection)
            .cloned()
            .ok_or(LintError::NotMocked("field_names"))
    }

    async fn field_value_types(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<BTreeSet<TypeTag>> {
        self.record("field_value_types");
        self.field_types
            .get(&(collection.to_string(), field.to_string()))
            .cloned()
            .ok_or(LintError::NotMocked("field_value_types"))
    }

    async fn exists_matching(&self, collection: &str, filter: &Value) -> Result<bool> {
        self.record("exists_matching");
        if let Ok(mut filters) = self.filters.lock() {
            filters.push((collection.to_string(), filter.clone()));
        }
        match Self::dequeue(&self.exists_queue) {
            Some(response) => response,
            None => self
                .exists_default
                .ok_or(LintError::NotMocked("exists_matching")),
        }
    }

    async fn aggregate(&self, collection: &str, _job: &MapReduce) -> Result<Vec<(Value, Value)>> {
        self.record("aggregate");
        match Self::dequeue(&self.aggregate_queue) {
            Some(response) => response,
            None => self
                .aggregate_results
                .get(collection)
                .cloned()
                .ok_or(LintError::NotMocked("aggregate")),
        }
    }

    async fn close(&self) -> Result<()> {
        self.record("close");
        Ok(())
    }
}
