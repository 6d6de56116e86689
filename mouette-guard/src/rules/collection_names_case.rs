//! `collection-names-case`: collection names must be in the configured case.

use super::casing::TargetCase;
use crate::access::DataAccess;
use crate::core::{
    fan_out, FailureDetail, FailureReport, Granularity, Location, OptionKind, OptionSpec, Rule,
    RuleDescriptor, RuleOptions, RuleRegistration, Violation,
};
use crate::prelude::*;
use async_trait::async_trait;

const OPTIONS: &[OptionSpec] = &[OptionSpec::new(
    "case",
    "The case your collection names should be in.",
    OptionKind::Enum(TargetCase::VALUES),
)];

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "collection-names-case",
    pretty_name: "Collection names case",
    description: "Make sure all collection names in the database have the right case.",
    rationale: "Reads more fluently.",
    granularity: Granularity::Collection,
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
    let value = options.str("case")?;
    let case = TargetCase::parse(value)
        .ok_or_else(|| LintError::unknown_option_value(DESCRIPTOR.name, "case", value))?;
    Ok(Box::new(CollectionNamesCase { case }))
}

#[derive(Debug)]
struct CollectionNamesCase {
    case: TargetCase,
}

#[async_trait]
impl Rule for CollectionNamesCase {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>> {
        fan_out::per_collection(data, |collection| async move {
            if self.case.accepts(&collection) {
                return Ok(vec![]);
            }
            Ok(vec![Violation::collection(collection)])
        })
        .await
    }

    fn render(&self, location: &Location, _: &FailureDetail) -> Result<FailureReport> {
        let collection = &location.collection;
        Ok(FailureReport::new(format!(
            "Collection name **{collection}** is not in {} case.",
            self.case
        ))
        .with_suggestion(format!(
            "Change *{collection}* to *{}*.",
            self.case.convert(collection)
        )))
    }
}
