//! Condition Evaluator: recursive boolean conditions over variables.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::variables::display_value;

/// Comparison operator of a leaf condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    In,
    IsEmpty,
    IsNotEmpty,
    /// Anything else. Always evaluates to false.
    Unknown(String),
}

impl Operator {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "equals" => Self::Equals,
            "not_equals" => Self::NotEquals,
            "greater_than" => Self::GreaterThan,
            "less_than" => Self::LessThan,
            "contains" => Self::Contains,
            "in" => Self::In,
            "is_empty" => Self::IsEmpty,
            "is_not_empty" => Self::IsNotEmpty,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::Contains => "contains",
            Self::In => "in",
            Self::IsEmpty => "is_empty",
            Self::IsNotEmpty => "is_not_empty",
            Self::Unknown(raw) => raw,
        }
    }
}

/// A boolean condition: a leaf comparison or a combinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCondition", into = "RawCondition")]
pub enum Condition {
    Leaf {
        variable: String,
        operator: Operator,
        value: Option<Value>,
    },
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn leaf(variable: impl Into<String>, operator: &str, value: Value) -> Self {
        Self::Leaf {
            variable: variable.into(),
            operator: Operator::parse(operator),
            value: Some(value),
        }
    }

    /// Visit every variable name referenced by this condition.
    pub fn for_each_variable<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Self::Leaf { variable, .. } => f(variable),
            Self::All(items) | Self::Any(items) => {
                for item in items {
                    item.for_each_variable(f);
                }
            }
            Self::Not(inner) => inner.for_each_variable(f),
        }
    }
}

/// Wire shape of a condition. Combinators take precedence over leaf fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    all: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    any: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    not: Option<Box<Condition>>,
}

impl TryFrom<RawCondition> for Condition {
    type Error = String;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        if let Some(all) = raw.all {
            return Ok(Self::All(all));
        }
        if let Some(any) = raw.any {
            return Ok(Self::Any(any));
        }
        if let Some(not) = raw.not {
            return Ok(Self::Not(not));
        }
        match (raw.variable, raw.operator) {
            (Some(variable), Some(operator)) => Ok(Self::Leaf {
                variable,
                operator: Operator::parse(&operator),
                value: raw.value,
            }),
            _ => Err("condition needs `all`, `any`, `not`, or `variable` + `operator`".to_string()),
        }
    }
}

impl From<Condition> for RawCondition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Leaf {
                variable,
                operator,
                value,
            } => Self {
                variable: Some(variable),
                operator: Some(operator.as_str().to_string()),
                value,
                ..Self::default()
            },
            Condition::All(all) => Self {
                all: Some(all),
                ..Self::default()
            },
            Condition::Any(any) => Self {
                any: Some(any),
                ..Self::default()
            },
            Condition::Not(not) => Self {
                not: Some(not),
                ..Self::default()
            },
        }
    }
}

/// Evaluate a condition against a variable mapping.
///
/// A missing variable is undefined and an unknown operator is false.
pub fn evaluate(condition: &Condition, variables: &Map<String, Value>) -> bool {
    match condition {
        Condition::All(items) => items.iter().all(|c| evaluate(c, variables)),
        Condition::Any(items) => items.iter().any(|c| evaluate(c, variables)),
        Condition::Not(inner) => !evaluate(inner, variables),
        Condition::Leaf {
            variable,
            operator,
            value,
        } => evaluate_leaf(variables.get(variable), operator, value.as_ref()),
    }
}

fn evaluate_leaf(actual: Option<&Value>, operator: &Operator, expected: Option<&Value>) -> bool {
    match operator {
        Operator::Equals => loosely_equal(actual, expected),
        Operator::NotEquals => !loosely_equal(actual, expected),
        Operator::GreaterThan => compare(actual, expected) == Some(Ordering::Greater),
        Operator::LessThan => compare(actual, expected) == Some(Ordering::Less),
        Operator::Contains => match (actual, expected) {
            (Some(Value::String(haystack)), Some(Value::String(needle))) => {
                haystack.contains(needle.as_str())
            }
            (Some(Value::Array(items)), Some(needle)) => {
                items.iter().any(|item| loosely_equal(Some(item), Some(needle)))
            }
            _ => false,
        },
        Operator::In => match expected {
            Some(Value::Array(options)) => actual
                .is_some_and(|a| options.iter().any(|o| loosely_equal(Some(a), Some(o)))),
            _ => false,
        },
        Operator::IsEmpty => is_empty(actual),
        Operator::IsNotEmpty => !is_empty(actual),
        Operator::Unknown(raw) => {
            debug!(operator = %raw, "Unknown condition operator evaluates false");
            false
        }
    }
}

/// `null` and a missing value are the same thing on either side.
fn loosely_equal(actual: Option<&Value>, expected: Option<&Value>) -> bool {
    let actual = actual.filter(|v| !v.is_null());
    let expected = expected.filter(|v| !v.is_null());
    match (actual, expected) {
        (None, None) => true,
        (Some(Value::Number(a)), Some(Value::Number(b))) => a.as_f64() == b.as_f64(),
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Numeric ordering when both sides parse as numbers, else lexical.
fn compare(actual: Option<&Value>, expected: Option<&Value>) -> Option<Ordering> {
    let (actual, expected) = (actual?, expected?);
    if actual.is_null() || expected.is_null() {
        return None;
    }
    match (as_number(actual), as_number(expected)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(display_value(actual).cmp(&display_value(expected))),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn vars(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn parse(value: Value) -> Condition {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn vacuous_combinators() {
        let v = Map::new();
        assert!(evaluate(&Condition::All(vec![]), &v));
        assert!(!evaluate(&Condition::Any(vec![]), &v));
    }

    #[test]
    fn not_negates_every_shape() {
        let v = vars(json!({"age": 21, "name": "Sam", "tags": ["a"]}));
        let conditions = [
            Condition::leaf("age", "greater_than", json!(18)),
            Condition::leaf("name", "equals", json!("Alex")),
            Condition::leaf("missing", "is_empty", Value::Null),
            Condition::leaf("tags", "contains", json!("b")),
            Condition::leaf("age", "between", json!([1, 2])),
            Condition::All(vec![]),
            Condition::Any(vec![Condition::leaf("name", "is_not_empty", Value::Null)]),
        ];
        for c in conditions {
            let negated = Condition::Not(Box::new(c.clone()));
            assert_eq!(evaluate(&negated, &v), !evaluate(&c, &v), "{c:?}");
        }
    }

    #[test]
    fn numeric_comparison_when_both_parse() {
        let v = vars(json!({"score": "10"}));
        assert!(evaluate(&Condition::leaf("score", "greater_than", json!(9)), &v));
        // Lexically "10" < "9", numerically it is greater.
        assert!(!evaluate(&Condition::leaf("score", "less_than", json!("9")), &v));
    }

    #[test]
    fn lexical_comparison_otherwise() {
        let v = vars(json!({"name": "bob"}));
        assert!(evaluate(&Condition::leaf("name", "greater_than", json!("alice")), &v));
        assert!(evaluate(&Condition::leaf("name", "less_than", json!("carol")), &v));
    }

    #[test]
    fn missing_variable_comparisons_are_false() {
        let v = Map::new();
        assert!(!evaluate(&Condition::leaf("x", "greater_than", json!(1)), &v));
        assert!(!evaluate(&Condition::leaf("x", "less_than", json!(1)), &v));
        assert!(!evaluate(&Condition::leaf("x", "equals", json!("yes")), &v));
        assert!(evaluate(&Condition::leaf("x", "not_equals", json!("yes")), &v));
    }

    #[test]
    fn null_equals_missing_on_both_sides() {
        let null_equals: Condition =
            parse(json!({"variable": "x", "operator": "equals", "value": null}));
        let null_differs: Condition =
            parse(json!({"variable": "x", "operator": "not_equals", "value": null}));

        let stored_null = vars(json!({"x": null}));
        assert!(evaluate(&null_equals, &stored_null));
        assert!(!evaluate(&null_differs, &stored_null));
        assert!(evaluate(&null_equals, &Map::new()));
        assert!(!evaluate(&null_differs, &Map::new()));

        let set = vars(json!({"x": "yes"}));
        assert!(!evaluate(&null_equals, &set));
        assert!(evaluate(&Condition::leaf("x", "equals", Value::Null), &Map::new()));
    }

    #[test]
    fn contains_substring_and_membership() {
        let v = vars(json!({"bio": "loves rust", "goals": ["fitness", "sleep"]}));
        assert!(evaluate(&Condition::leaf("bio", "contains", json!("rust")), &v));
        assert!(evaluate(&Condition::leaf("goals", "contains", json!("sleep")), &v));
        assert!(!evaluate(&Condition::leaf("goals", "contains", json!("diet")), &v));
    }

    #[test]
    fn in_checks_membership_of_value_list() {
        let v = vars(json!({"plan": "pro", "seats": 3}));
        assert!(evaluate(&Condition::leaf("plan", "in", json!(["pro", "team"])), &v));
        assert!(evaluate(&Condition::leaf("seats", "in", json!([1.0, 3.0])), &v));
        assert!(!evaluate(&Condition::leaf("plan", "in", json!("pro")), &v));
        assert!(!evaluate(&Condition::leaf("missing", "in", json!(["pro"])), &v));
    }

    #[test]
    fn emptiness() {
        let v = vars(json!({"a": null, "b": "", "c": [], "d": {}, "e": 0, "f": "x"}));
        for name in ["a", "b", "c", "d", "missing"] {
            assert!(evaluate(&Condition::leaf(name, "is_empty", Value::Null), &v), "{name}");
        }
        for name in ["e", "f"] {
            assert!(evaluate(&Condition::leaf(name, "is_not_empty", Value::Null), &v), "{name}");
        }
    }

    #[test]
    fn unknown_operator_fails_closed() {
        let v = vars(json!({"x": 1}));
        let c = parse(json!({"variable": "x", "operator": "matches", "value": 1}));
        assert!(!evaluate(&c, &v));
    }

    #[test]
    fn parses_nested_combinators() {
        let c = parse(json!({
            "all": [
                {"variable": "x", "operator": "equals", "value": "yes"},
                {"not": {"any": [{"variable": "y", "operator": "is_empty"}]}}
            ]
        }));
        let v = vars(json!({"x": "yes", "y": "set"}));
        assert!(evaluate(&c, &v));
    }

    #[test]
    fn combinator_takes_precedence_over_leaf_fields() {
        let c = parse(json!({
            "variable": "x", "operator": "equals", "value": "no",
            "any": []
        }));
        assert_eq!(c, Condition::Any(vec![]));
    }

    #[test]
    fn rejects_shapeless_condition() {
        let result: Result<Condition, _> = serde_json::from_value(json!({"value": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn serde_roundtrip_keeps_unknown_operator() {
        let c = parse(json!({"variable": "x", "operator": "matches", "value": 1}));
        let back = serde_json::to_value(&c).unwrap();
        assert_eq!(back, json!({"variable": "x", "operator": "matches", "value": 1}));
    }
}
