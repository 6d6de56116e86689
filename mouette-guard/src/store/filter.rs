//! Evaluation of MongoDB-style query filters against in-memory documents.
//!
//! Supports the subset the builtin rules and their reproduction queries use:
//! `$and`, `$or`, `$nor` at the top level, and per-field `$exists`, `$type`,
//! `$regex`/`$options`, `$not`, `$eq`, `$ne`, `$in`, `$nin` or plain equality.

use super::Document;
use crate::types::TypeTag;
use regex::RegexBuilder;
use serde_json::Value;

/// Extended JSON wrapper keys that denote a value, not an operator.
const VALUE_WRAPPERS: &[&str] = &[
    "$date",
    "$oid",
    "$numberLong",
    "$numberInt",
    "$numberDouble",
    "$numberDecimal",
    "$binary",
    "$regularExpression",
];

/// Returns true if `document` satisfies `filter`.
///
/// The error string describes a malformed filter.
pub fn matches(document: &Document, filter: &Value) -> std::result::Result<bool, String> {
    let clauses = filter
        .as_object()
        .ok_or_else(|| format!("filter must be an object, got {filter}"))?;

    for (key, condition) in clauses {
        let satisfied = match key.as_str() {
            "$and" => {
                let mut all = true;
                for sub in sub_filters(key, condition)? {
                    if !matches(document, sub)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => any_matches(document, key, condition)?,
            "$nor" => !any_matches(document, key, condition)?,
            op if op.starts_with('$') => return Err(format!("unknown top-level operator {op}")),
            field => field_matches(lookup(document, field), condition)?,
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn sub_filters<'a>(operator: &str, condition: &'a Value) -> std::result::Result<&'a [Value], String> {
    match condition {
        Value::Array(items) if !items.is_empty() => Ok(items),
        _ => Err(format!("{operator} requires a non-empty array")),
    }
}

fn any_matches(document: &Document, operator: &str, condition: &Value) -> std::result::Result<bool, String> {
    for sub in sub_filters(operator, condition)? {
        if matches(document, sub)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Resolves a possibly dotted field path.
fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn is_operator_object(condition: &Value) -> bool {
    match condition.as_object() {
        Some(map) if !map.is_empty() => map
            .keys()
            .all(|k| k.starts_with('$') && !VALUE_WRAPPERS.contains(&k.as_str())),
        _ => false,
    }
}

fn field_matches(value: Option<&Value>, condition: &Value) -> std::result::Result<bool, String> {
    let operators = match condition.as_object() {
        Some(map) if is_operator_object(condition) => map,
        _ => return Ok(equals(value, condition)),
    };
    let options = condition.get("$options").and_then(Value::as_str).unwrap_or("");

    for (operator, operand) in operators {
        let satisfied = match operator.as_str() {
            "$exists" => value.is_some() == truthy(operand),
            "$type" => type_matches(value, operand)?,
            "$regex" => regex_matches(value, operand, options)?,
            "$options" => {
                if condition.get("$regex").is_none() {
                    return Err("$options requires $regex".to_string());
                }
                true
            }
            "$not" => {
                if !is_operator_object(operand) {
                    return Err("$not requires an operator object".to_string());
                }
                !field_matches(value, operand)?
            }
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$in" => in_list(value, operator, operand)?,
            "$nin" => !in_list(value, operator, operand)?,
            other => return Err(format!("unsupported operator {other}")),
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn truthy(operand: &Value) -> bool {
    match operand {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Null => false,
        _ => true,
    }
}

fn equals(value: Option<&Value>, expected: &Value) -> bool {
    match value {
        // A null condition matches both null and absent fields.
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(actual) => actual == expected,
    }
}

fn in_list(value: Option<&Value>, operator: &str, operand: &Value) -> std::result::Result<bool, String> {
    let candidates = operand
        .as_array()
        .ok_or_else(|| format!("{operator} requires an array"))?;
    Ok(candidates.iter().any(|candidate| equals(value, candidate)))
}

fn type_matches(value: Option<&Value>, operand: &Value) -> std::result::Result<bool, String> {
    let Some(value) = value else {
        return Ok(false);
    };
    let tag = TypeTag::of(value);
    let operands: Vec<&Value> = match operand {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    for operand in operands {
        match tag.matches_bson_type(operand) {
            Some(true) => return Ok(true),
            Some(false) => {}
            None => return Err(format!("unknown $type operand {operand}")),
        }
    }
    Ok(false)
}

fn regex_matches(value: Option<&Value>, pattern: &Value, options: &str) -> std::result::Result<bool, String> {
    let pattern = pattern
        .as_str()
        .ok_or_else(|| "$regex requires a string pattern".to_string())?;

    let mut builder = RegexBuilder::new(pattern);
    for flag in options.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => return Err(format!("unsupported $options flag '{other}'")),
        };
    }
    let regex = builder
        .build()
        .map_err(|e| format!("invalid $regex '{pattern}': {e}"))?;

    Ok(match value {
        Some(Value::String(s)) => regex.is_match(s),
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| item.as_str().is_some_and(|s| regex.is_match(s))),
        _ => false,
    })
}
