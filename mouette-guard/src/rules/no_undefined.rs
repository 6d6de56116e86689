//! `no-undefined`: fields that contain undefined values.

use crate::access::DataAccess;
use crate::core::{
    fan_out, FailureDetail, FailureReport, Granularity, Location, Rule, RuleDescriptor,
    RuleOptions, RuleRegistration, Violation,
};
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::{json, Value};

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "no-undefined",
    pretty_name: "No undefined",
    description: "Make sure columns do not contain undefined values.",
    rationale: "It's efficient because the record doesn't have to grow later.",
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
    Ok(Box::new(NoUndefined))
}

fn query(field: &str) -> Value {
    json!({ field: { "$exists": false } })
}

#[derive(Debug)]
struct NoUndefined;

#[async_trait]
impl Rule for NoUndefined {
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
        // the matching documents lack the field, so there is nothing to project
        Ok(
            FailureReport::new(format!("Column **{location}** contains undefined values."))
                .with_mongo_command(super::mongo_command(&location.collection, &query(field), None)),
        )
    }
}
