//! Placement-level template filters
//!
//! A placement can declare filter rules that map the runtime value of one
//! variable onto the template IDs allowed for that value. The eligible set is
//! the intersection of every rule that contributes IDs.

use std::collections::HashSet;

use super::types::{value_to_string, FilterRule, Variables};

/// Resolve the eligible template IDs for a set of filter rules.
///
/// Returns `None` when nothing restricts selection (no rules, or no rule
/// contributed any IDs). `Some(vec![])` means the rules intersect to nothing
/// and no template is eligible.
pub fn resolve_template_filters(filters: &[FilterRule], variables: &Variables) -> Option<Vec<String>> {
    if filters.is_empty() {
        return None;
    }

    let mut eligible: Option<Vec<String>> = None;

    for rule in filters {
        let actual = variables
            .get(&rule.input_variable)
            .map(value_to_string)
            .unwrap_or_default();

        let matched = rule
            .cases
            .iter()
            .find(|case| value_to_string(&case.value) == actual)
            .map(|case| &case.template_ids)
            .unwrap_or(&rule.default_template_ids);

        // Empty contributions do not narrow the result
        if matched.is_empty() {
            continue;
        }

        eligible = Some(match eligible {
            None => dedup(matched),
            Some(current) => {
                let allowed: HashSet<&str> = matched.iter().map(String::as_str).collect();
                current
                    .into_iter()
                    .filter(|id| allowed.contains(id.as_str()))
                    .collect()
            }
        });
    }

    eligible
}

fn dedup(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::types::FilterCase;
    use serde_json::{json, Value};

    fn rule(input: &str, cases: Vec<(Value, Vec<&str>)>, default: &[&str]) -> FilterRule {
        FilterRule {
            input_variable: input.to_string(),
            cases: cases
                .into_iter()
                .map(|(value, ids)| FilterCase {
                    value,
                    template_ids: ids.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
            default_template_ids: default.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn vars(value: Value) -> Variables {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_no_filters_is_unrestricted() {
        assert_eq!(resolve_template_filters(&[], &vars(json!({"a": 1}))), None);
    }

    #[test]
    fn test_matching_case() {
        let rules = vec![rule(
            "craving_time",
            vec![(json!("Morning"), vec!["t1", "t2"]), (json!("Night"), vec!["t3"])],
            &["t4"],
        )];
        let result = resolve_template_filters(&rules, &vars(json!({"craving_time": "Night"})));
        assert_eq!(result, Some(vec!["t3".to_string()]));
    }

    #[test]
    fn test_first_matching_case_wins() {
        let rules = vec![rule(
            "tier",
            vec![(json!("gold"), vec!["first"]), (json!("gold"), vec!["second"])],
            &[],
        )];
        let result = resolve_template_filters(&rules, &vars(json!({"tier": "gold"})));
        assert_eq!(result, Some(vec!["first".to_string()]));
    }

    #[test]
    fn test_default_ids_when_no_case_matches() {
        let rules = vec![rule("tier", vec![(json!("gold"), vec!["t1"])], &["t9"])];
        let result = resolve_template_filters(&rules, &vars(json!({"tier": "bronze"})));
        assert_eq!(result, Some(vec!["t9".to_string()]));
    }

    #[test]
    fn test_numeric_case_matches_stringified_variable() {
        let rules = vec![rule("level", vec![(json!(3), vec!["t3"])], &[])];
        let result = resolve_template_filters(&rules, &vars(json!({"level": "3"})));
        assert_eq!(result, Some(vec!["t3".to_string()]));
    }

    #[test]
    fn test_absent_variable_matches_empty_case() {
        let rules = vec![rule("tier", vec![(json!(""), vec!["anon"])], &["t1"])];
        let result = resolve_template_filters(&rules, &Variables::new());
        assert_eq!(result, Some(vec!["anon".to_string()]));
    }

    #[test]
    fn test_rules_without_contributions_are_unrestricted() {
        let rules = vec![
            rule("tier", vec![(json!("gold"), vec!["t1"])], &[]),
            rule("time", vec![(json!("Morning"), vec!["t2"])], &[]),
        ];
        let result = resolve_template_filters(&rules, &vars(json!({"tier": "x", "time": "y"})));
        assert_eq!(result, None);
    }

    #[test]
    fn test_empty_contribution_is_skipped() {
        let rules = vec![
            rule("tier", vec![(json!("gold"), vec!["t1", "t2"])], &[]),
            rule("time", vec![(json!("Morning"), vec!["t2"])], &[]),
        ];
        // Second rule matches nothing and has no defaults, so only the first narrows
        let result = resolve_template_filters(&rules, &vars(json!({"tier": "gold", "time": "Night"})));
        assert_eq!(result, Some(vec!["t1".to_string(), "t2".to_string()]));
    }

    #[test]
    fn test_intersection_across_rules() {
        let rules = vec![
            rule("tier", vec![(json!("gold"), vec!["t1", "t2", "t3"])], &[]),
            rule("time", vec![(json!("Morning"), vec!["t3", "t2", "t5"])], &[]),
        ];
        let result = resolve_template_filters(&rules, &vars(json!({"tier": "gold", "time": "Morning"})));
        assert_eq!(result, Some(vec!["t2".to_string(), "t3".to_string()]));
    }

    #[test]
    fn test_disjoint_rules_yield_empty_set() {
        let rules = vec![
            rule("tier", vec![(json!("gold"), vec!["t1"])], &[]),
            rule("time", vec![(json!("Morning"), vec!["t2"])], &[]),
        ];
        let result = resolve_template_filters(&rules, &vars(json!({"tier": "gold", "time": "Morning"})));
        assert_eq!(result, Some(vec![]));
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let rules = vec![rule("tier", vec![(json!("gold"), vec!["t1", "t1", "t2"])], &[])];
        let result = resolve_template_filters(&rules, &vars(json!({"tier": "gold"})));
        assert_eq!(result, Some(vec!["t1".to_string(), "t2".to_string()]));
    }
}
