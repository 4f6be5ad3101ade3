//! Template condition evaluation

use std::cmp::Ordering;

use serde_json::Value;

use super::types::{value_to_string, Condition, Operator, Template, Variables};

/// Evaluate a single condition against the caller's variables.
///
/// Total over all inputs: unknown operators and unparseable numbers never fail,
/// they evaluate to `false` or fall back to string ordering respectively.
pub fn evaluate_condition(condition: &Condition, variables: &Variables) -> bool {
    let actual = variables
        .get(&condition.variable)
        .filter(|v| !v.is_null());

    if condition.operator == Operator::Exists {
        return match actual {
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
            None => false,
        };
    }

    // Absence only satisfies `not_equals`
    let Some(actual) = actual else {
        return condition.operator == Operator::NotEquals;
    };

    let actual = value_to_string(actual);
    let target = value_to_string(&condition.value);

    match condition.operator {
        Operator::Equals => actual == target,
        Operator::NotEquals => actual != target,
        Operator::Contains => actual.contains(target.as_str()),
        Operator::GreaterThan => compare(&actual, &target) == Ordering::Greater,
        Operator::LessThan => compare(&actual, &target) == Ordering::Less,
        Operator::Exists | Operator::Unknown => false,
    }
}

/// Numeric comparison when both sides parse, lexicographic otherwise
fn compare(actual: &str, target: &str) -> Ordering {
    match (actual.trim().parse::<f64>(), target.trim().parse::<f64>()) {
        // NaN compares as neither greater nor less
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => actual.cmp(target),
    }
}

/// Keep the templates whose conditions all hold; templates without conditions always pass
pub fn filter_by_conditions(templates: Vec<Template>, variables: &Variables) -> Vec<Template> {
    templates
        .into_iter()
        .filter(|template| {
            template
                .conditions
                .iter()
                .all(|c| evaluate_condition(c, variables))
        })
        .collect()
}
