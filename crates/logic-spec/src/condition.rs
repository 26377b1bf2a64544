use serde_json::Value;

use crate::responses::Responses;
use crate::spec::rule::{ConditionalRule, Operator};

impl Operator {
    /// Compares an answer with a rule value.
    ///
    /// Shape mismatches never hold; nothing here fails.
    pub fn apply(&self, answer: &Value, expected: &Value) -> bool {
        match self {
            Operator::Equals => strict_equals(answer, expected),
            Operator::NotEquals => !strict_equals(answer, expected),
            Operator::GreaterThan => compare_numbers(answer, expected, |a, b| a > b),
            Operator::LessThan => compare_numbers(answer, expected, |a, b| a < b),
            Operator::Contains => contains(answer, expected),
            Operator::In => expected
                .as_array()
                .is_some_and(|items| items.iter().any(|item| strict_equals(answer, item))),
        }
    }
}

/// Whether the rule's condition currently holds. A missing answer never
/// satisfies a condition, whatever the operator.
pub fn condition_holds(rule: &ConditionalRule, responses: &Responses) -> bool {
    match responses.get(rule.question_id) {
        Some(answer) => rule.operator.apply(answer, &rule.value),
        None => false,
    }
}

/// Scalar equality. Numbers compare by value, so `1` equals `1.0`.
/// Lists and objects never compare equal: answers and rule values are
/// always distinct documents.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => false,
    }
}

fn compare_numbers(answer: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (answer.as_f64(), expected.as_f64()) {
        (Some(answer), Some(expected)) => cmp(answer, expected),
        _ => false,
    }
}

/// List answers test membership, string answers test for a substring, any
/// other answer shape never contains anything.
fn contains(answer: &Value, needle: &Value) -> bool {
    match answer {
        Value::Array(items) => items.iter().any(|item| strict_equals(item, needle)),
        Value::String(text) => {
            scalar_text(needle).is_some_and(|needle| text.contains(needle.as_str()))
        }
        _ => false,
    }
}

/// Text form of a scalar rule value for substring tests.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some("null".into()),
        Value::Number(number) => Some(match (number.as_i64(), number.as_f64()) {
            (Some(int), _) => int.to_string(),
            (None, Some(float)) if float.fract() == 0.0 && float.abs() < 1e21 => {
                format!("{}", float as i128)
            }
            _ => number.to_string(),
        }),
        Value::Array(_) | Value::Object(_) => None,
    }
}
