//! Placement, template and rendering types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::store::StoreError;

/// Caller-supplied variables used for conditions and placeholder substitution
pub type Variables = Map<String, Value>;

/// Payload map attached to a rendered notification
pub type NotificationData = Map<String, Value>;

/// Payload key identifying the placement that produced a notification
pub const ATTR_PLACEMENT_ID: &str = "copylab_placement_id";
/// Payload key carrying the placement's display name
pub const ATTR_PLACEMENT_NAME: &str = "copylab_placement_name";
/// Payload key identifying the template (or `fallback`)
pub const ATTR_TEMPLATE_ID: &str = "copylab_template_id";
/// Payload key carrying the template's display name
pub const ATTR_TEMPLATE_NAME: &str = "copylab_template_name";

pub const FALLBACK_TEMPLATE_ID: &str = "fallback";
pub const FALLBACK_TEMPLATE_NAME: &str = "Fallback";

/// Default message length limit applied when the caller does not supply one
pub const DEFAULT_MAX_LENGTH: usize = 200;

/// Errors surfaced by notification generation
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("placement_id is required")]
    MissingPlacementId,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Notification generation panicked: {0}")]
    Panicked(String),
}

/// Result type for generation operations
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Comparison applied by a template condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    Exists,
    /// Operator name not recognised by this version; never matches
    #[serde(other)]
    Unknown,
}

/// A single predicate over one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub variable: String,

    #[serde(default)]
    pub operator: Operator,

    #[serde(default = "empty_string_value")]
    pub value: Value,
}

fn empty_string_value() -> Value {
    Value::String(String::new())
}

/// One branch of a filter rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCase {
    #[serde(default = "empty_string_value")]
    pub value: Value,

    #[serde(default)]
    pub template_ids: Vec<String>,
}

/// Maps the runtime value of one variable onto a restricted set of template IDs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRule {
    #[serde(default)]
    pub input_variable: String,

    #[serde(default)]
    pub cases: Vec<FilterCase>,

    #[serde(default)]
    pub default_template_ids: Vec<String>,
}

/// A notification slot owning templates and rendering defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// Placement identifier (document key)
    #[serde(default)]
    pub id: String,

    /// Display name; empty means "use the id"
    #[serde(default)]
    pub name: String,

    /// Declared variable names
    #[serde(default)]
    pub variables: Vec<String>,

    /// Placeholder defaults, keyed with or without braces
    #[serde(default, rename = "previewDefaults")]
    pub defaults: Map<String, Value>,

    /// Payload used when the selected template has no data of its own
    #[serde(default)]
    pub default_data: NotificationData,

    #[serde(default)]
    pub template_filters: Vec<FilterRule>,

    /// Explicit list of active template IDs; empty means scan all templates
    #[serde(default)]
    pub active_template_ids: Vec<String>,

    /// Legacy single-template override, superseded by `isActive` flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_template_id: Option<String>,
}

impl Placement {
    /// Display name, falling back to the placement id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// One candidate title/body/payload definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, alias = "title_template")]
    pub title_template: String,

    #[serde(default, alias = "body_template")]
    pub body_template: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NotificationData>,

    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default)]
    pub weight: f64,

    #[serde(default)]
    pub is_active: bool,
}

impl Template {
    /// Selection weight with negative values clamped to zero
    pub fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() && self.weight > 0.0 {
            self.weight
        } else {
            0.0
        }
    }

    /// Display name used for attribution
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Unknown"
        } else {
            &self.name
        }
    }
}

/// Input to a single generation call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    /// Placement to render
    #[serde(default)]
    pub placement_id: String,

    /// Variables for conditions and placeholders
    #[serde(default)]
    pub variables: Variables,

    /// Extra payload; overrides template data on conflict
    #[serde(default)]
    pub data: NotificationData,

    /// Title rendered when no template is eligible
    pub fallback_title: Option<String>,

    /// Message rendered when no template is eligible
    pub fallback_message: Option<String>,

    /// Message length limit (0 disables truncation)
    pub max_length: Option<usize>,
}

impl GenerateRequest {
    pub fn new(placement_id: impl Into<String>) -> Self {
        Self {
            placement_id: placement_id.into(),
            ..Default::default()
        }
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_data(mut self, data: NotificationData) -> Self {
        self.data = data;
        self
    }

    pub fn with_fallback(mut self, title: impl Into<String>, message: impl Into<String>) -> Self {
        self.fallback_title = Some(title.into());
        self.fallback_message = Some(message.into());
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Validate caller input before it reaches the assembler
    pub fn validate(&self) -> GenerateResult<()> {
        if self.placement_id.trim().is_empty() {
            return Err(GenerateError::MissingPlacementId);
        }
        Ok(())
    }
}

/// Rendered notification returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedNotification {
    pub title: String,
    pub message: String,
    pub data: NotificationData,
    pub template_used: bool,
    pub template_name: Option<String>,

    /// Failure description, only set by the safe entry point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Stringify a variable value the way placeholders and comparisons see it
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}
