//! `max-key-count`: collections with too many distinct keys.

use crate::access::DataAccess;
use crate::core::{
    fan_out, FailureDetail, FailureReport, Granularity, Location, OptionKind, OptionSpec, Rule,
    RuleDescriptor, RuleOptions, RuleRegistration, Violation,
};
use crate::prelude::*;
use async_trait::async_trait;

const MAXIMUM: &str = "maximum-excluding-_id";

const OPTIONS: &[OptionSpec] = &[OptionSpec::new(
    MAXIMUM,
    "The maximum number of keys allowed.",
    OptionKind::Number,
)];

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "max-key-count",
    pretty_name: "Max key count",
    description: "Enforces a maximum number of keys per collection.",
    rationale: "Hierarchical objects are more readable and faster to scan without index.",
    granularity: Granularity::AllFieldNames,
    is_fuzzy: false,
    options: OPTIONS,
};

pub(crate) fn registration() -> RuleRegistration {
    RuleRegistration {
        descriptor: &DESCRIPTOR,
        construct,
    }
}

fn construct(options: &RuleOptions) -> Result<Box<dyn Rule>> {
    Ok(Box::new(MaxKeyCount {
        maximum: options.f64(MAXIMUM)?,
    }))
}

#[derive(Debug)]
struct MaxKeyCount {
    maximum: f64,
}

#[async_trait]
impl Rule for MaxKeyCount {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>> {
        fan_out::per_collection(data, |collection| async move {
            let fields = data.field_names(&collection).await?;
            let actual = fields.iter().filter(|f| f.as_str() != "_id").count();
            if (actual as f64) <= self.maximum {
                return Ok(vec![]);
            }
            Ok(vec![Violation::collection(collection)
                .with_detail(FailureDetail::FieldCount { actual })])
        })
        .await
    }

    fn render(&self, location: &Location, detail: &FailureDetail) -> Result<FailureReport> {
        let FailureDetail::FieldCount { actual } = detail else {
            return Err(LintError::Internal(format!(
                "max-key-count failure for '{location}' carries no key count"
            )));
        };
        Ok(FailureReport::new(format!(
            "Collection **{}** has {actual} keys which exceeds the allowed maximum of {}",
            location.collection, self.maximum
        )))
    }
}
