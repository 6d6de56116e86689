//! The builtin rule catalog.
//!
//! | Rule | Granularity |
//! |------|-------------|
//! | `collection-names-case` | collection |
//! | `collection-names-number` | collection |
//! | `key-names-case` | field |
//! | `keys-that-end-in-at-should-refer-to-dates` | column |
//! | `question-keys-should-refer-to-booleans` | column |
//! | `max-key-count` | all-field-names |
//! | `no-bad-key-names` | field |
//! | `no-dates-saved-as-string` | column |
//! | `no-leading-underscores-in-key-names` | field |
//! | `no-mixed-types` | column |
//! | `no-null` | column |
//! | `no-numbers-saved-as-string` | column |
//! | `no-undefined` | column |

use crate::core::RuleRegistration;
use serde_json::Value;

pub mod casing;
pub mod inflection;

mod collection_names_case;
mod collection_names_number;
mod key_names_case;
mod keys_ending_in_at;
mod max_key_count;
mod no_bad_key_names;
mod no_dates_saved_as_string;
mod no_leading_underscores;
mod no_mixed_types;
mod no_null;
mod no_numbers_saved_as_string;
mod no_undefined;
mod question_keys;

/// Every builtin rule, in catalog order.
pub fn builtin() -> Vec<RuleRegistration> {
    vec![
        collection_names_case::registration(),
        collection_names_number::registration(),
        key_names_case::registration(),
        keys_ending_in_at::registration(),
        question_keys::registration(),
        max_key_count::registration(),
        no_bad_key_names::registration(),
        no_dates_saved_as_string::registration(),
        no_leading_underscores::registration(),
        no_mixed_types::registration(),
        no_null::registration(),
        no_numbers_saved_as_string::registration(),
        no_undefined::registration(),
    ]
}

/// A mongo shell command reproducing the documents behind a finding.
pub(crate) fn mongo_command(collection: &str, filter: &Value, projection: Option<&str>) -> String {
    match projection {
        Some(field) => format!("db.getCollection('{collection}').find({filter}, {{{field}: 1}})"),
        None => format!("db.getCollection('{collection}').find({filter})"),
    }
}
