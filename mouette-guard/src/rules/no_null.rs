//! `no-null`: fields that contain null values.

use crate::access::DataAccess;
use crate::core::{
    fan_out, FailureDetail, FailureReport, Granularity, Location, Rule, RuleDescriptor,
    RuleOptions, RuleRegistration, Violation,
};
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::{json, Value};

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "no-null",
    pretty_name: "No null",
    description: "Make sure columns do not contain null values.",
    rationale: "Some columns should not be nullable.",
    granularity: Granularity::Column,
    is_fuzzy: false,
    options: &[],
};

pub(crate) fn registration() -> RuleRegistration {
    RuleRegistration {
        descriptor: &DESCRIPTOR,
        construct,
    }
}

fn construct(_: &RuleOptions) -> Result<Box<dyn Rule>> {
    Ok(Box::new(NoNull))
}

fn query(field: &str) -> Value {
    json!({ field: { "$type": 10 } })
}

#[derive(Debug)]
struct NoNull;

#[async_trait]
impl Rule for NoNull {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>> {
        fan_out::per_field(data, |collection, field| async move {
            if data.exists_matching(&collection, &query(&field)).await? {
                return Ok(vec![Violation::field(collection, field)]);
            }
            Ok(vec![])
        })
        .await
    }

    fn render(&self, location: &Location, _: &FailureDetail) -> Result<FailureReport> {
        let field = location.field.as_deref().unwrap_or_default();
        Ok(
            FailureReport::new(format!("Column **{location}** contains null values."))
                .with_mongo_command(super::mongo_command(
                    &location.collection,
                    &query(field),
                    Some(field),
                )),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::CachedDataAccess;
    use crate::rules::test_support::{paths, run};
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_null_values_are_found() {
        let store = InMemoryStore::new()
            .with_collection(
                "users",
                vec![
                    json!({"name": "ada", "email": null}),
                    json!({"name": "bob"}),
                ],
            )
            .unwrap();
        let data = CachedDataAccess::new(store);

        let failures = run(registration(), json!({}), &data).await.unwrap();
        assert_eq!(paths(&failures), vec!["users.email"]);

        let report = failures[0].to_json().unwrap();
        assert_eq!(report.failure, "Column **users.email** contains null values.");
        assert_eq!(
            report.mongo_command.as_deref(),
            Some(r#"db.getCollection('users').find({"email":{"$type":10}}, {email: 1})"#)
        );
    }
}
