//! Dynamic value types observed in stored documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The dynamic type of a field value as seen by the linter.
///
/// Documents are exchanged as MongoDB Extended JSON, so wrapper objects such
/// as `{"$date": ...}` or `{"$oid": ...}` classify as their BSON type rather
/// than as plain objects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum TypeTag {
    /// The field is absent from the document
    Missing,
    Null,
    Boolean,
    /// Any numeric BSON type (double, int, long, decimal)
    Number,
    String,
    Array,
    Object,
    /// An ObjectId reference
    ObjectId,
    Date,
    RegularExpression,
    Binary,
}

impl TypeTag {
    /// Classifies a present JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Boolean,
            Value::Number(_) => TypeTag::Number,
            Value::String(_) => TypeTag::String,
            Value::Array(_) => TypeTag::Array,
            Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(key) = map.keys().next() {
                        match key.as_str() {
                            "$date" => return TypeTag::Date,
                            "$oid" => return TypeTag::ObjectId,
                            "$regularExpression" | "$regex" => {
                                return TypeTag::RegularExpression
                            }
                            "$binary" => return TypeTag::Binary,
                            "$numberLong" | "$numberInt" | "$numberDouble"
                            | "$numberDecimal" => return TypeTag::Number,
                            _ => {}
                        }
                    }
                }
                TypeTag::Object
            }
        }
    }

    /// Classifies an optional value, `None` meaning the field is absent.
    pub fn of_optional(value: Option<&Value>) -> Self {
        value.map_or(TypeTag::Missing, TypeTag::of)
    }

    /// Name used on the wire and in messages.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Missing => "missing",
            TypeTag::Null => "null",
            TypeTag::Boolean => "boolean",
            TypeTag::Number => "number",
            TypeTag::String => "string",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::ObjectId => "objectId",
            TypeTag::Date => "date",
            TypeTag::RegularExpression => "regularExpression",
            TypeTag::Binary => "binary",
        }
    }

    /// Parses a wire name produced by [`TypeTag::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tag| tag.name() == name)
    }

    /// Every tag, in declaration order.
    pub fn all() -> &'static [TypeTag] {
        &[
            TypeTag::Missing,
            TypeTag::Null,
            TypeTag::Boolean,
            TypeTag::Number,
            TypeTag::String,
            TypeTag::Array,
            TypeTag::Object,
            TypeTag::ObjectId,
            TypeTag::Date,
            TypeTag::RegularExpression,
            TypeTag::Binary,
        ]
    }

    /// Whether a BSON `$type` operand (numeric code or alias) selects this tag.
    ///
    /// Returns `None` for operands the store does not know.
    pub fn matches_bson_type(&self, operand: &Value) -> Option<bool> {
        let selected = match operand {
            Value::Number(n) => match n.as_i64()? {
                1 | 16 | 18 | 19 => TypeTag::Number,
                2 => TypeTag::String,
                3 => TypeTag::Object,
                4 => TypeTag::Array,
                5 => TypeTag::Binary,
                7 => TypeTag::ObjectId,
                8 => TypeTag::Boolean,
                9 => TypeTag::Date,
                10 => TypeTag::Null,
                11 => TypeTag::RegularExpression,
                _ => return None,
            },
            Value::String(alias) => match alias.as_str() {
                "double" | "int" | "long" | "decimal" | "number" => TypeTag::Number,
                "string" => TypeTag::String,
                "object" => TypeTag::Object,
                "array" => TypeTag::Array,
                "binData" => TypeTag::Binary,
                "objectId" => TypeTag::ObjectId,
                "bool" => TypeTag::Boolean,
                "date" => TypeTag::Date,
                "null" => TypeTag::Null,
                "regex" => TypeTag::RegularExpression,
                _ => return None,
            },
            _ => return None,
        };
        Some(selected == *self)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json_values() {
        assert_eq!(TypeTag::of(&json!(null)), TypeTag::Null);
        assert_eq!(TypeTag::of(&json!(true)), TypeTag::Boolean);
        assert_eq!(TypeTag::of(&json!(1.5)), TypeTag::Number);
        assert_eq!(TypeTag::of(&json!("x")), TypeTag::String);
        assert_eq!(TypeTag::of(&json!([1, 2])), TypeTag::Array);
        assert_eq!(TypeTag::of(&json!({"a": 1})), TypeTag::Object);
        assert_eq!(TypeTag::of_optional(None), TypeTag::Missing);
    }

    #[test]
    fn test_extended_json_wrappers() {
        assert_eq!(TypeTag::of(&json!({"$date": "2020-01-01T00:00:00Z"})), TypeTag::Date);
        assert_eq!(
            TypeTag::of(&json!({"$oid": "5f1d7f0b0b0b0b0b0b0b0b0b"})),
            TypeTag::ObjectId
        );
        assert_eq!(TypeTag::of(&json!({"$numberLong": "12"})), TypeTag::Number);
        // a wrapper key next to other keys is just an object
        assert_eq!(
            TypeTag::of(&json!({"$date": "2020-01-01", "other": 1})),
            TypeTag::Object
        );
    }

    #[test]
    fn test_bson_type_operands() {
        assert_eq!(TypeTag::Date.matches_bson_type(&json!(9)), Some(true));
        assert_eq!(TypeTag::Null.matches_bson_type(&json!(9)), Some(false));
        assert_eq!(TypeTag::Number.matches_bson_type(&json!("long")), Some(true));
        assert_eq!(TypeTag::Boolean.matches_bson_type(&json!("bool")), Some(true));
        assert_eq!(TypeTag::String.matches_bson_type(&json!(42)), None);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_value(TypeTag::ObjectId).unwrap(), json!("objectId"));
        for tag in TypeTag::all() {
            assert_eq!(TypeTag::from_name(tag.name()), Some(*tag));
        }
    }
}
