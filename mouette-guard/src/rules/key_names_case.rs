//! `key-names-case`: every key must be in the configured case.

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
    "The case your keys should be in.",
    OptionKind::Enum(TargetCase::VALUES),
)];

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "key-names-case",
    pretty_name: "Key names case",
    description: "Make sure all keys in the database have the right case.",
    rationale: "Reads more fluently.",
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
    let value = options.str("case")?;
    let case = TargetCase::parse(value)
        .ok_or_else(|| LintError::unknown_option_value(DESCRIPTOR.name, "case", value))?;
    Ok(Box::new(KeyNamesCase { case }))
}

#[derive(Debug)]
struct KeyNamesCase {
    case: TargetCase,
}

#[async_trait]
impl Rule for KeyNamesCase {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>> {
        fan_out::per_field(data, |collection, field| async move {
            if self.case.accepts(&field) {
                return Ok(vec![]);
            }
            Ok(vec![Violation::field(collection, field)])
        })
        .await
    }

    fn render(&self, location: &Location, _: &FailureDetail) -> Result<FailureReport> {
        let collection = &location.collection;
        let field = location.field.as_deref().unwrap_or_default();
        Ok(FailureReport::new(format!(
            "Key name **{collection}.{field}** is not in {} case.",
            self.case
        ))
        .with_suggestion(format!(
            "Change *{collection}.{field}* to *{collection}.{}*.",
            self.case.convert(field)
        )))
    }
}
