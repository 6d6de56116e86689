//! `collection-names-number`: collection names must all be singular or all plural.

use super::inflection;
use crate::access::DataAccess;
use crate::core::{
    fan_out, FailureDetail, FailureReport, Granularity, Location, OptionKind, OptionSpec, Rule,
    RuleDescriptor, RuleOptions, RuleRegistration, Violation,
};
use crate::prelude::*;
use async_trait::async_trait;

const OPTIONS: &[OptionSpec] = &[OptionSpec::new(
    "number",
    "The grammatical number that collection names should be checked for.",
    OptionKind::Enum(&["singular", "plural"]),
)];

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "collection-names-number",
    pretty_name: "Collection names number",
    description: "Make sure all collections in the database have names that are pluralized.",
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Number {
    Singular,
    Plural,
}

fn construct(options: &RuleOptions) -> Result<Box<dyn Rule>> {
    let number = match options.str("number")? {
        "singular" => Number::Singular,
        "plural" => Number::Plural,
        other => return Err(LintError::unknown_option_value(DESCRIPTOR.name, "number", other)),
    };
    Ok(Box::new(CollectionNamesNumber { number }))
}

#[derive(Debug)]
struct CollectionNamesNumber {
    number: Number,
}

#[async_trait]
impl Rule for CollectionNamesNumber {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>> {
        fan_out::per_collection(data, |collection| async move {
            let ok = match self.number {
                Number::Singular => inflection::is_singular(&collection),
                Number::Plural => inflection::is_plural(&collection),
            };
            Ok(if ok {
                vec![]
            } else {
                vec![Violation::collection(collection)]
            })
        })
        .await
    }

    fn render(&self, location: &Location, _: &FailureDetail) -> Result<FailureReport> {
        let collection = &location.collection;
        let report = match self.number {
            Number::Singular => FailureReport::new(format!(
                "Collection name **{collection}** is not singular."
            ))
            .with_suggestion(format!(
                "Change *{collection}* to *{}*.",
                inflection::singularize(collection)
            )),
            Number::Plural => FailureReport::new(format!(
                "Collection name **{collection}** is not pluralized."
            ))
            .with_suggestion(format!(
                "Change *{collection}* to *{}*.",
                inflection::pluralize(collection)
            )),
        };
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::TestDataAccess;
    use crate::rules::test_support::{paths, run};
    use serde_json::json;

    fn data() -> TestDataAccess {
        TestDataAccess::new().with_collection_names(["cow", "cats"])
    }

    #[tokio::test]
    async fn test_singular() {
        let failures = run(registration(), json!({"number": "singular"}), &data())
            .await
            .unwrap();
        assert_eq!(paths(&failures), vec!["cats"]);

        let report = failures[0].to_json().unwrap();
        assert_eq!(report.failure, "Collection name **cats** is not singular.");
        assert_eq!(report.suggestion.as_deref(), Some("Change *cats* to *cat*."));
    }

    #[tokio::test]
    async fn test_plural() {
        let failures = run(registration(), json!({"number": "plural"}), &data())
            .await
            .unwrap();
        assert_eq!(paths(&failures), vec!["cow"]);

        let report = failures[0].to_json().unwrap();
        assert_eq!(report.failure, "Collection name **cow** is not pluralized.");
        assert_eq!(report.suggestion.as_deref(), Some("Change *cow* to *cows*."));
    }

    #[tokio::test]
    async fn test_uncountable_names_pass_both_ways() {
        for number in ["singular", "plural"] {
            let data = TestDataAccess::new().with_collection_names(["sheep", "sms"]);
            let failures = run(registration(), json!({ "number": number }), &data)
                .await
                .unwrap();
            assert!(failures.is_empty(), "{number}");
        }
    }
}
