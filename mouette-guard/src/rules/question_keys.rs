//! `question-keys-should-refer-to-booleans`: keys starting with a
//! configured prefix such as `is` or `has` must hold booleans.

use crate::access::DataAccess;
use crate::core::{
    fan_out, FailureDetail, FailureReport, Granularity, Location, OptionKind, OptionSpec, Rule,
    RuleDescriptor, RuleOptions, RuleRegistration, Violation,
};
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::{json, Value};

const OPTIONS: &[OptionSpec] = &[OptionSpec::new(
    "boolean-key-prefixes",
    "Which prefixes should indicate booleans.",
    OptionKind::StringList {
        alphanumeric: true,
        unique: true,
    },
)];

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    name: "question-keys-should-refer-to-booleans",
    pretty_name: "Question keys should refer to booleans",
    description:
        "Make sure columns with keys that start with verbs like \"is\" or \"has\" contain nothing but booleans.",
    rationale: "It's what people expect when they see names like isEmpty or hasChild.",
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
    Ok(Box::new(QuestionKeys {
        prefixes: options.string_list("boolean-key-prefixes")?,
    }))
}

#[derive(Debug)]
struct QuestionKeys {
    prefixes: Vec<String>,
}

impl QuestionKeys {
    fn prefix_of(&self, field: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .map(String::as_str)
            .find(|prefix| field.starts_with(prefix))
    }

    fn query(field: &str) -> Value {
        json!({ "$nor": [
            { field: { "$type": 8 } },
            { field: { "$type": 10 } },
            { field: { "$exists": false } },
        ]})
    }
}

fn is_boolean_like(tag: &TypeTag) -> bool {
    matches!(tag, TypeTag::Missing | TypeTag::Null | TypeTag::Boolean)
}

#[async_trait]
impl Rule for QuestionKeys {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    async fn check(&self, data: &dyn DataAccess) -> Result<Vec<Violation>> {
        fan_out::per_field(data, |collection, field| async move {
            if self.prefix_of(&field).is_none() {
                return Ok(vec![]);
            }
            let types = data.field_value_types(&collection, &field).await?;
            if types.iter().all(is_boolean_like) {
                return Ok(vec![]);
            }
            Ok(vec![Violation::field(collection, field)])
        })
        .await
    }

    fn render(&self, location: &Location, _: &FailureDetail) -> Result<FailureReport> {
        let collection = &location.collection;
        let field = location.field.as_deref().unwrap_or_default();
        let prefix = self.prefix_of(field).ok_or_else(|| {
            LintError::Internal(format!("no boolean prefix matches key '{field}'"))
        })?;
        Ok(FailureReport::new(format!(
            "Column **{collection}.{field}** starts with \"{prefix}\" but contains values that are not booleans, null or undefined"
        ))
        .with_mongo_command(super::mongo_command(
            collection,
            &Self::query(field),
            Some(field),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::TestDataAccess;
    use crate::rules::test_support::{instance, paths, run};
    use crate::core::{Failure, Location};

    fn options() -> Value {
        json!({"boolean-key-prefixes": ["is", "has"]})
    }

    #[tokio::test]
    async fn test_non_boolean_question_keys_fail() {
        let data = TestDataAccess::new()
            .with_collection_names(["users"])
            .with_field_names("users", ["isAdmin", "hasPets", "name"])
            .with_field_types("users", "isAdmin", [TypeTag::Boolean, TypeTag::Missing])
            .with_field_types("users", "hasPets", [TypeTag::Boolean, TypeTag::Number]);

        let failures = run(registration(), options(), &data).await.unwrap();
        assert_eq!(paths(&failures), vec!["users.hasPets"]);
        assert_eq!(data.calls("field_value_types"), 2);

        let report = failures[0].to_json().unwrap();
        assert_eq!(
            report.failure,
            "Column **users.hasPets** starts with \"has\" but contains values that are not booleans, null or undefined"
        );
        assert_eq!(
            report.mongo_command.as_deref(),
            Some(
                r#"db.getCollection('users').find({"$nor":[{"hasPets":{"$type":8}},{"hasPets":{"$type":10}},{"hasPets":{"$exists":false}}]}, {hasPets: 1})"#
            )
        );
    }

    #[test]
    fn test_rendering_a_foreign_key_is_an_error() {
        let failure = Failure::new(
            instance(registration(), options()),
            Location::field("users", "name"),
            FailureDetail::None,
        );
        assert!(matches!(failure.to_json(), Err(LintError::Internal(_))));
    }

    #[test]
    fn test_prefixes_are_validated() {
        for bad in [json!([]), json!(["is", "is"]), json!(["is-a"]), json!([""])] {
            let raw = json!({ "boolean-key-prefixes": bad })
                .as_object()
                .cloned()
                .unwrap();
            assert!(crate::core::RuleInstance::new(&registration(), &raw).is_err());
        }
    }
}
