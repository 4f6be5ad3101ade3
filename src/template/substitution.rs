//! Placeholder substitution for `{variable}` templates

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use super::types::{value_to_string, NotificationData, Variables};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([^}]+)\}").expect("placeholder pattern is valid");
}

const ELLIPSIS: &str = "...";

/// Title, message and payload after substitution
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedContent {
    pub title: String,
    pub message: String,
    pub data: NotificationData,
}

/// Replace `{name}` placeholders in a template string.
///
/// Lookup order per placeholder: `variables[name]`, `defaults["{name}"]`,
/// `defaults[name]`. Placeholders with no value are left in place.
pub fn apply_template(template: &str, variables: &Variables, defaults: &Map<String, Value>) -> String {
    if template.is_empty() {
        return String::new();
    }

    let mut result = template.to_string();
    let mut seen = Vec::new();

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let (placeholder, name) = (whole.as_str(), inner.as_str());
        if seen.contains(&name) {
            continue;
        }
        seen.push(name);

        let value = variables
            .get(name)
            .or_else(|| defaults.get(placeholder))
            .or_else(|| defaults.get(name))
            .map(value_to_string);

        match value {
            Some(value) => result = result.replace(placeholder, &value),
            None => {
                tracing::warn!(placeholder = %placeholder, "No value provided for variable");
            }
        }
    }

    result
}

/// Render title, message and every string value of `data`.
///
/// The message is truncated to `max_length` characters (ellipsis included)
/// when it exceeds a non-zero limit.
pub fn process_content(
    title: &str,
    message: &str,
    data: &NotificationData,
    variables: &Variables,
    defaults: &Map<String, Value>,
    max_length: Option<usize>,
) -> ProcessedContent {
    let title = apply_template(title, variables, defaults);
    let mut message = apply_template(message, variables, defaults);

    if let Some(max_length) = max_length.filter(|&n| n > 0) {
        message = truncate(message, max_length);
    }

    let data = data
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => Value::String(apply_template(s, variables, defaults)),
                other => other.clone(),
            };
            (key.clone(), rendered)
        })
        .collect();

    ProcessedContent {
        title,
        message,
        data,
    }
}

fn truncate(message: String, max_length: usize) -> String {
    if message.chars().count() <= max_length {
        return message;
    }

    let keep = max_length.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_apply_variables() {
        let result = apply_template(
            "Hey {user_name}! Keep your {streak_count} day streak going",
            &map(json!({"user_name": "Sarah", "streak_count": 5})),
            &Map::new(),
        );
        assert_eq!(result, "Hey Sarah! Keep your 5 day streak going");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let result = apply_template("{a}-{a}-{b}-{a}", &map(json!({"a": "x", "b": "y"})), &Map::new());
        assert_eq!(result, "x-x-y-x");
    }

    #[test]
    fn test_braced_default_wins_over_bare_default() {
        let defaults = map(json!({"{x}": "D1", "x": "D2"}));
        assert_eq!(apply_template("{x}", &Map::new(), &defaults), "D1");
    }

    #[test]
    fn test_bare_default_used() {
        let defaults = map(json!({"x": "D2"}));
        assert_eq!(apply_template("{x}", &Map::new(), &defaults), "D2");
    }

    #[test]
    fn test_variable_wins_over_defaults() {
        let defaults = map(json!({"{x}": "D1", "x": "D2"}));
        let variables = map(json!({"x": "V"}));
        assert_eq!(apply_template("{x}", &variables, &defaults), "V");
    }

    #[test]
    fn test_unresolved_placeholder_preserved() {
        assert_eq!(apply_template("Hi {name}", &Map::new(), &Map::new()), "Hi {name}");
    }

    #[test]
    fn test_empty_template() {
        assert_eq!(apply_template("", &map(json!({"a": 1})), &Map::new()), "");
    }

    #[test]
    fn test_unbalanced_braces_untouched() {
        let variables = map(json!({"a": "x"}));
        assert_eq!(apply_template("{a", &variables, &Map::new()), "{a");
        assert_eq!(apply_template("{} and {a}", &variables, &Map::new()), "{} and x");
    }

    #[test]
    fn test_process_content_renders_data_strings_only() {
        let data = map(json!({
            "target_tab": "{tab}",
            "count": 3,
            "flag": true
        }));
        let processed = process_content(
            "Title {name}",
            "Body {name}",
            &data,
            &map(json!({"name": "Ann", "tab": "chat"})),
            &Map::new(),
            None,
        );

        assert_eq!(processed.title, "Title Ann");
        assert_eq!(processed.message, "Body Ann");
        assert_eq!(processed.data["target_tab"], "chat");
        assert_eq!(processed.data["count"], 3);
        assert_eq!(processed.data["flag"], true);
    }

    #[test]
    fn test_truncation() {
        let message = "a".repeat(210);
        let processed = process_content("", &message, &Map::new(), &Map::new(), &Map::new(), Some(200));

        assert_eq!(processed.message.chars().count(), 200);
        assert!(processed.message.starts_with(&"a".repeat(197)));
        assert!(processed.message.ends_with("..."));
    }

    #[test]
    fn test_no_truncation_at_limit() {
        let message = "a".repeat(200);
        let processed = process_content("", &message, &Map::new(), &Map::new(), &Map::new(), Some(200));
        assert_eq!(processed.message, message);
    }

    #[test]
    fn test_zero_max_length_disables_truncation() {
        let message = "a".repeat(300);
        let processed = process_content("", &message, &Map::new(), &Map::new(), &Map::new(), Some(0));
        assert_eq!(processed.message.len(), 300);
    }

    #[test]
    fn test_truncation_counts_characters() {
        let message = "é".repeat(20);
        let processed = process_content("", &message, &Map::new(), &Map::new(), &Map::new(), Some(10));
        assert_eq!(processed.message, format!("{}...", "é".repeat(7)));
    }
}
