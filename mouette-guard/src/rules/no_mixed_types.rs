//! `no-mixed-types`: fields holding more than one concrete type.

use crate::access::DataAccess;
use crate::core::{
    fan_out, FailureDetail, FailureReport, Granularity, Location, Rule, RuleDescriptor,
    RuleOptions, RuleRegistration, Violation,
};
use crate::prelude::*;
use async_trait::async_trait;

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "no-mixed-types",
    pretty_name: "No mixed types",
    description: "Makes sure columns contain values of no more than one type.",
    rationale: "Mixing types breaks expectations.",
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
    Ok(Box::new(NoMixedTypes))
}

#[derive(Debug)]
struct NoMixedTypes;

#[async_trait]
impl Rule for NoMixedTypes {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>> {
        fan_out::per_field(data, |collection, field| async move {
            let types = data.field_value_types(&collection, &field).await?;
            let present = types
                .iter()
                .filter(|t| !matches!(t, TypeTag::Missing | TypeTag::Null))
                .count();
            if present <= 1 {
                return Ok(vec![]);
            }
            Ok(vec![
                Violation::field(collection, field).with_detail(FailureDetail::Types(types))
            ])
        })
        .await
    }

    fn render(&self, location: &Location, detail: &FailureDetail) -> Result<FailureReport> {
        let FailureDetail::Types(types) = detail else {
            return Err(LintError::Internal(format!(
                "no-mixed-types failure for '{location}' carries no types"
            )));
        };
        let mut names: Vec<&str> = types.iter().map(TypeTag::name).collect();
        names.sort_unstable();
        Ok(FailureReport::new(format!(
            "Column **{location}** contains mixed types: [{}]",
            names.join(", ")
        )))
    }
}
