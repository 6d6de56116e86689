//! `no-numbers-saved-as-string`: string fields holding numbers.

use crate::access::DataAccess;
use crate::core::{
    fan_out, FailureDetail, FailureReport, Granularity, Location, OptionKind, OptionSpec, Rule,
    RuleDescriptor, RuleOptions, RuleRegistration, Violation,
};
use crate::prelude::*;
use crate::store::MapReduce;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

/// Plain decimals without leading or trailing zeros.
pub(crate) const STRICT_NUMBER: &str = r"^-?[1-9]\d*\.?(\d*[1-9])?$";
/// Also accepts leading zeros and hex or binary prefixes.
pub(crate) const LOOSE_NUMBER: &str = r"^(0x|0b|-)?\d+\.?\d*$";

const OPTIONS: &[OptionSpec] = &[OptionSpec::new(
    "strict-number-check",
    "When this is set to true, strings like '015', '0xF' or '0b1111' are not considered to be numbers.",
    OptionKind::Boolean,
)];

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "no-numbers-saved-as-string",
    pretty_name: "No numbers saved as string",
    description: "Makes sure numbers don't get saved as strings.",
    rationale: "It breaks expectations and is easy to overlook.",
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
    let pattern = if options.bool("strict-number-check")? {
        STRICT_NUMBER
    } else {
        LOOSE_NUMBER
    };
    Ok(Box::new(NoNumbersSavedAsString {
        pattern,
        regex: Regex::new(pattern)?,
    }))
}

#[derive(Debug)]
struct NoNumbersSavedAsString {
    pattern: &'static str,
    regex: Regex,
}

impl NoNumbersSavedAsString {
    /// Emits every top-level key holding a string that looks like a number.
    fn job(&self) -> MapReduce {
        let regex = self.regex.clone();
        MapReduce::new(
            "numeric-strings",
            move |document, emit| {
                for (key, value) in document {
                    if value.as_str().is_some_and(|s| regex.is_match(s)) {
                        emit.emit(key.as_str(), Value::Null);
                    }
                }
            },
            |_, _| Value::Null,
        )
    }

    fn query(&self, field: &str) -> Value {
        json!({ field: { "$type": 2, "$regex": self.pattern } })
    }
}

#[async_trait]
impl Rule for NoNumbersSavedAsString {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    // One scan per collection instead of one query per field.
    async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>> {
        let job = self.job();
        let job = &job;
        fan_out::per_collection(data, |collection| async move {
            let pairs = data.aggregate(&collection, job).await?;
            Ok(pairs
                .into_iter()
                .filter_map(|(key, _)| key.as_str().map(str::to_owned))
                .map(|field| Violation::field(collection.clone(), field))
                .collect())
        })
        .await
    }

    fn render(&self, location: &Location, _: &FailureDetail) -> Result<FailureReport> {
        let field = location.field.as_deref().unwrap_or_default();
        Ok(FailureReport::new(format!(
            "Column **{location}** contains numbers that are saved as strings."
        ))
        .with_mongo_command(super::mongo_command(
            &location.collection,
            &self.query(field),
            Some(field),
        )))
    }
}
