//! `no-bad-key-names`: keys from a configurable deny list.

use crate::access::DataAccess;
use crate::core::{
    fan_out, FailureDetail, FailureReport, Granularity, Location, OptionKind, OptionSpec, Rule,
    RuleDescriptor, RuleOptions, RuleRegistration, Violation,
};
use crate::prelude::*;
use async_trait::async_trait;
use std::collections::HashSet;

const OPTIONS: &[OptionSpec] = &[OptionSpec::new(
    "names-considered-bad",
    "Key names that should be avoided.",
    OptionKind::StringList {
        alphanumeric: true,
        unique: false,
    },
)];

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "no-bad-key-names",
    pretty_name: "No bad key names",
    description: "Make sure no common bad key names are used.",
    rationale: "Bad key names don't give you any information about what's saved in the column.",
    granularity: Granularity::Field,
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
    let bad = options.string_list("names-considered-bad")?;
    Ok(Box::new(NoBadKeyNames {
        bad: bad.into_iter().collect(),
    }))
}

#[derive(Debug)]
struct NoBadKeyNames {
    bad: HashSet<String>,
}

#[async_trait]
impl Rule for NoBadKeyNames {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>> {
        fan_out::per_field(data, |collection, field| async move {
            if self.bad.contains(&field) {
                return Ok(vec![Violation::field(collection, field)]);
            }
            Ok(vec![])
        })
        .await
    }

    fn render(&self, location: &Location, _: &FailureDetail) -> Result<FailureReport> {
        Ok(FailureReport::new(format!(
            "Collection {} contains a key named **{}** which is not a good name.",
            location.collection,
            location.field.as_deref().unwrap_or_default()
        )))
    }
}
