//! `no-leading-underscores-in-key-names`, with `_id` exempt.

use crate::access::DataAccess;
use crate::core::{
    fan_out, FailureDetail, FailureReport, Granularity, Location, Rule, RuleDescriptor,
    RuleOptions, RuleRegistration, Violation,
};
use crate::prelude::*;
use async_trait::async_trait;

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "no-leading-underscores-in-key-names",
    pretty_name: "No leading underscores in key names",
    description: "Make sure no key name except _id starts with an underscore.",
    rationale: "It suggests the data is used internally.",
    granularity: Granularity::Field,
    is_fuzzy: false,
    options: &[],
};

const MONGOOSE_VERSION_KEY: &str = "__v";

pub(crate) fn registration() -> RuleRegistration {
    RuleRegistration {
        descriptor: &DESCRIPTOR,
        construct,
    }
}

fn construct(_: &RuleOptions) -> Result<Box<dyn Rule>> {
    Ok(Box::new(NoLeadingUnderscores))
}

#[derive(Debug)]
struct NoLeadingUnderscores;

#[async_trait]
impl Rule for NoLeadingUnderscores {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>> {
        fan_out::per_field(data, |collection, field| async move {
            if field != "_id" && field.starts_with('_') {
                return Ok(vec![Violation::field(collection, field)]);
            }
            Ok(vec![])
        })
        .await
    }

    fn render(&self, location: &Location, _: &FailureDetail) -> Result<FailureReport> {
        let field = location.field.as_deref().unwrap_or_default();
        let report = FailureReport::new(format!(
            "Key name **{}.{field}** should not start with an underscore.",
            location.collection
        ));
        Ok(if field == MONGOOSE_VERSION_KEY {
            report.with_suggestion("Configure mongoose so it doesn't create a __v key")
        } else {
            report
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::TestDataAccess;
    use crate::rules::test_support::{paths, run};
    use serde_json::json;

    #[tokio::test]
    async fn test_id_is_exempt() {
        let data = TestDataAccess::new()
            .with_collection_names(["c"])
            .with_field_names("c", ["_", "_id", "_arst", "arst"]);
        let failures = run(registration(), json!({}), &data).await.unwrap();
        assert_eq!(paths(&failures), vec!["c._", "c._arst"]);
        assert_eq!(
            failures[1].to_json().unwrap().failure,
            "Key name **c._arst** should not start with an underscore."
        );
        assert!(failures[1].to_json().unwrap().suggestion.is_none());
    }

    #[tokio::test]
    async fn test_mongoose_version_key_gets_a_suggestion() {
        let data = TestDataAccess::new()
            .with_collection_names(["users"])
            .with_field_names("users", ["__v"]);
        let failures = run(registration(), json!({"severity": "error"}), &data)
            .await
            .unwrap();
        let report = failures[0].to_json().unwrap();
        assert_eq!(
            report.suggestion.as_deref(),
            Some("Configure mongoose so it doesn't create a __v key")
        );
        assert_eq!(report.severity(), Severity::Error);
    }
}
