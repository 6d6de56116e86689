//! `no-dates-saved-as-string`: string fields whose values parse as dates.

use crate::access::DataAccess;
use crate::core::{
    fan_out, FailureDetail, FailureReport, Granularity, Location, Rule, RuleDescriptor,
    RuleOptions, RuleRegistration, Violation,
};
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::{json, Value};

/// ISO 8601 calendar dates with an optional time and offset.
pub(crate) const ISO_8601_DATE: &str = r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])([T ]([01]\d|2[0-3]):[0-5]\d(:[0-5]\d([.,]\d+)?)?([zZ]|[+-]([01]\d|2[0-3]):?[0-5]\d)?)?$";

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "no-dates-saved-as-string",
    pretty_name: "No dates saved as string",
    description: "Makes sure dates don't get saved as strings.",
    rationale: "It breaks expectations and is probably the result of serialization bugs.",
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
    Ok(Box::new(NoDatesSavedAsString))
}

fn query(field: &str) -> Value {
    json!({ field: { "$type": 2, "$regex": ISO_8601_DATE } })
}

#[derive(Debug)]
struct NoDatesSavedAsString;

#[async_trait]
impl Rule for NoDatesSavedAsString {
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
        Ok(FailureReport::new(format!(
            "Column **{location}** contains dates that are saved as strings."
        ))
        .with_mongo_command(super::mongo_command(
            &location.collection,
            &query(field),
            Some(field),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::CachedDataAccess;
    use crate::rules::test_support::{paths, run};
    use crate::store::InMemoryStore;
    use regex::Regex;

    #[test]
    fn test_iso_pattern() {
        let re = Regex::new(ISO_8601_DATE).unwrap();
        for date in [
            "2020-01-31",
            "2020-01-31T12:30",
            "2020-01-31T12:30:15.123Z",
            "2020-01-31 23:59:59+02:00",
            "2020-01-31T00:00:00-0530",
        ] {
            assert!(re.is_match(date), "{date}");
        }
        for not_a_date in ["2020-13-01", "2020-01-32", "20200131", "yesterday", "2020-01-31T24:00"] {
            assert!(!re.is_match(not_a_date), "{not_a_date}");
        }
    }

    #[tokio::test]
    async fn test_string_dates_are_found() {
        let store = InMemoryStore::new()
            .with_collection(
                "orders",
                vec![
                    json!({"placed": "2021-06-01T10:00:00Z", "note": "ship fast"}),
                    json!({"placed": {"$date": "2021-06-02T10:00:00Z"}, "note": "2021"}),
                ],
            )
            .unwrap();
        let data = CachedDataAccess::new(store);

        let failures = run(registration(), json!({}), &data).await.unwrap();
        assert_eq!(paths(&failures), vec!["orders.placed"]);
        assert_eq!(
            failures[0].to_json().unwrap().failure,
            "Column **orders.placed** contains dates that are saved as strings."
        );
    }
}
