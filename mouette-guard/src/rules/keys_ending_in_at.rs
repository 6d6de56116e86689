//! `keys-that-end-in-at-should-refer-to-dates`.
//!
//! Values of `createdAt`-style keys other than dates, nulls and absent values
//! are reported. Date strings pass when `allow-stringified-days` is set.

use crate::access::DataAccess;
use crate::core::{
    fan_out, FailureDetail, FailureReport, Granularity, Location, OptionKind, OptionSpec, Rule,
    RuleDescriptor, RuleOptions, RuleRegistration, Violation,
};
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::{json, Value};

const OPTIONS: &[OptionSpec] = &[
    OptionSpec::new(
        "allow-stringified-days",
        "Whether to allow dates that are saved as strings.",
        OptionKind::Boolean,
    ),
    OptionSpec::new(
        "stringified-days-regex",
        "The regexp used to determine whether a string contains a date.",
        OptionKind::Regexp,
    ),
];

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "keys-that-end-in-at-should-refer-to-dates",
    pretty_name: "Keys that end in At should refer to dates",
    description: "Make sure columns with keys that end in ...At contain nothing but dates.",
    rationale: "It's what people expect when they see names like updatedAt.",
    granularity: Granularity::Column,
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
    let allow_stringified_days = options.bool("allow-stringified-days")?;
    // compiled once to surface a bad pattern at construction
    options.regex("stringified-days-regex")?;
    Ok(Box::new(KeysEndingInAt {
        allow_stringified_days,
        days_pattern: options.str("stringified-days-regex")?.to_string(),
    }))
}

#[derive(Debug)]
struct KeysEndingInAt {
    allow_stringified_days: bool,
    days_pattern: String,
}

impl KeysEndingInAt {
    /// Documents whose value is neither a date, null nor absent.
    fn query(&self, field: &str) -> Value {
        let mut nor = vec![
            json!({ field: { "$type": 9 } }),
            json!({ field: { "$type": 10 } }),
            json!({ field: { "$exists": false } }),
        ];
        if self.allow_stringified_days {
            nor.push(json!({ field: { "$regex": self.days_pattern } }));
        }
        json!({ "$nor": nor })
    }
}

#[async_trait]
impl Rule for KeysEndingInAt {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>> {
        fan_out::per_field(data, |collection, field| async move {
            if !field.ends_with("At") {
                return Ok(vec![]);
            }
            if data.exists_matching(&collection, &self.query(&field)).await? {
                return Ok(vec![Violation::field(collection, field)]);
            }
            Ok(vec![])
        })
        .await
    }

    fn render(&self, location: &Location, _: &FailureDetail) -> Result<FailureReport> {
        let collection = &location.collection;
        let field = location.field.as_deref().unwrap_or_default();
        let tail = if self.allow_stringified_days {
            ", undefined or satisfying the provided regexp."
        } else {
            " or undefined."
        };
        Ok(FailureReport::new(format!(
            "Column **{collection}.{field}** ends in \"At\" but contains values that are not dates, null{tail}"
        ))
        .with_mongo_command(super::mongo_command(
            collection,
            &self.query(field),
            Some(field),
        )))
    }
}
