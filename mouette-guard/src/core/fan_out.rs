//! Execution strategies shared by the builtin rules.
//!
//! Both strategies issue every evaluation concurrently and flatten the
//! results. Completion order is not observable: results come back in the
//! sorted order of the collection and field names.

use super::failure::Violation;
use crate::access::DataAccess;
use crate::prelude::*;
use futures::future::try_join_all;
use std::future::Future;
use tracing::debug;

/// Runs `check` once per collection.
pub async fn per_collection<F, Fut>(data: &dyn DataAccess, check: F) -> Result<Vec<Violation>>
where
    F: Fn(String) -> Fut + Sync,
    Fut: Future<Output = Result<Vec<Violation>>> + Send,
{
    let collections = data.collection_names().await?;
    debug!(collections = collections.len(), "Fanning out per collection");

    let results = try_join_all(collections.into_iter().map(&check)).await?;
    Ok(results.into_iter().flatten().collect())
}

/// Runs `check` once per (collection, field) pair.
pub async fn per_field<F, Fut>(data: &dyn DataAccess, check: F) -> Result<Vec<Violation>>
where
    F: Fn(String, String) -> Fut + Sync,
    Fut: Future<Output = Result<Vec<Violation>>> + Send,
{
    let collections = data.collection_names().await?;
    debug!(collections = collections.len(), "Fanning out per field");

    let check = &check;
    let per_collection = collections.into_iter().map(|collection| async move {
        let fields = data.field_names(&collection).await?;
        let results = try_join_all(
            fields
                .into_iter()
                .map(|field| check(collection.clone(), field)),
        )
        .await?;
        Ok::<_, LintError>(results.into_iter().flatten().collect::<Vec<_>>())
    });

    let results = try_join_all(per_collection).await?;
    Ok(results.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::TestDataAccess;

    #[tokio::test]
    async fn test_per_collection_visits_every_collection() {
        let data = TestDataAccess::new().with_collection_names(["b", "a"]);
        let violations = per_collection(&data, |collection| async move {
            Ok(vec![Violation::collection(collection)])
        })
        .await
        .unwrap();

        let names: Vec<_> = violations
            .iter()
            .map(|v| v.location.collection.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_per_field_is_the_cross_product() {
        let data = TestDataAccess::new()
            .with_collection_names(["a", "b"])
            .with_field_names("a", ["x", "y"])
            .with_field_names("b", ["z"]);

        let violations = per_field(&data, |collection, field| async move {
            Ok(vec![Violation::field(collection, field)])
        })
        .await
        .unwrap();

        let paths: Vec<_> = violations.iter().map(|v| v.location.path()).collect();
        assert_eq!(paths, vec!["a.x", "a.y", "b.z"]);
        assert_eq!(data.calls("field_names"), 2);
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let data = TestDataAccess::new().with_collection_names(["a"]);
        let err = per_field(&data, |_, _| async { Ok(vec![]) })
            .await
            .unwrap_err();
        assert!(matches!(err, LintError::NotMocked("field_names")));

        let data = TestDataAccess::new().with_collection_names(["a"]);
        let err = per_collection(&data, |c| async move {
            Err(LintError::database(c, "boom"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, LintError::Database { .. }));
    }
}
