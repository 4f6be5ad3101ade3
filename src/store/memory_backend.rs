//! In-memory template store backend.
//!
//! Placements are held in a `DashMap` keyed by `{app_id}:{placement_id}`.
//! The store can be seeded from a JSON document shaped like the hosted
//! collection:
//!
//! ```json
//! {
//!   "my_app": {
//!     "welcome_message": {
//!       "name": "Welcome",
//!       "previewDefaults": {"{user_name}": "there"},
//!       "templates": {
//!         "tmpl_1": {"name": "Hello", "titleTemplate": "Hi {user_name}", "isActive": true}
//!       }
//!     }
//!   }
//! }
//! ```

use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::template::{Placement, Template};

use super::backend::{StoreError, TemplateStore};

#[derive(Debug, Clone, Default)]
struct StoredPlacement {
    placement: Placement,
    templates: Vec<Template>,
}

/// In-memory template store
pub struct MemoryTemplateStore {
    placements: DashMap<String, StoredPlacement>,
}

impl Default for MemoryTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTemplateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            placements: DashMap::new(),
        }
    }

    /// Create a store seeded from a JSON file
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Seed(format!("{}: {}", path.display(), e)))?;
        let seed: Value = serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
            key: path.display().to_string(),
            source,
        })?;

        let store = Self::new();
        store.load_seed(&seed)?;
        Ok(store)
    }

    /// Load placements and templates from a seed document
    pub fn load_seed(&self, seed: &Value) -> Result<usize, StoreError> {
        let apps = seed
            .as_object()
            .ok_or_else(|| StoreError::Seed("seed root must be an object of apps".to_string()))?;

        let mut loaded = 0;
        for (app_id, placements) in apps {
            let Some(placements) = placements.as_object() else {
                return Err(StoreError::Seed(format!("app '{}' must be an object", app_id)));
            };

            for (placement_id, doc) in placements {
                let key = scoped_key(app_id, placement_id);
                let mut placement: Placement = serde_json::from_value(doc.clone())
                    .map_err(|source| StoreError::Malformed { key: key.clone(), source })?;
                placement.id = placement_id.clone();
                self.upsert_placement(app_id, placement);

                if let Some(templates) = doc.get("templates").and_then(Value::as_object) {
                    for (template_id, template_doc) in templates {
                        let mut template: Template = serde_json::from_value(template_doc.clone())
                            .map_err(|source| StoreError::Malformed {
                                key: format!("{}/{}", key, template_id),
                                source,
                            })?;
                        if template.id.is_empty() {
                            template.id = template_id.clone();
                        }
                        self.upsert_template(app_id, placement_id, template);
                    }
                }
                loaded += 1;
            }
        }

        tracing::info!(placements = loaded, "Loaded template store seed");
        Ok(loaded)
    }

    /// Insert or replace a placement, keeping its templates
    pub fn upsert_placement(&self, app_id: &str, placement: Placement) {
        let key = scoped_key(app_id, &placement.id);
        self.placements.entry(key).or_default().placement = placement;
    }

    /// Insert or replace a template of a placement
    pub fn upsert_template(&self, app_id: &str, placement_id: &str, template: Template) {
        let key = scoped_key(app_id, placement_id);
        let mut entry = self.placements.entry(key).or_insert_with(|| StoredPlacement {
            placement: Placement {
                id: placement_id.to_string(),
                ..Default::default()
            },
            templates: Vec::new(),
        });

        match entry.templates.iter().position(|t| t.id == template.id) {
            Some(index) => entry.templates[index] = template,
            None => entry.templates.push(template),
        }
    }

    /// Remove a template; returns whether it existed
    pub fn remove_template(&self, app_id: &str, placement_id: &str, template_id: &str) -> bool {
        let key = scoped_key(app_id, placement_id);
        match self.placements.get_mut(&key) {
            Some(mut entry) => {
                let before = entry.templates.len();
                entry.templates.retain(|t| t.id != template_id);
                entry.templates.len() != before
            }
            None => false,
        }
    }

    /// Number of stored placements across all apps
    pub fn placement_count(&self) -> usize {
        self.placements.len()
    }
}

fn scoped_key(app_id: &str, placement_id: &str) -> String {
    format!("{}:{}", app_id, placement_id)
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn get_placement(
        &self,
        app_id: &str,
        placement_id: &str,
    ) -> Result<Option<Placement>, StoreError> {
        Ok(self
            .placements
            .get(&scoped_key(app_id, placement_id))
            .map(|entry| entry.placement.clone()))
    }

    async fn get_active_templates(
        &self,
        app_id: &str,
        placement_id: &str,
        active_ids: Option<&[String]>,
    ) -> Result<Vec<Template>, StoreError> {
        let Some(entry) = self.placements.get(&scoped_key(app_id, placement_id)) else {
            return Ok(Vec::new());
        };

        let templates: Vec<Template> = match active_ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| entry.templates.iter().find(|t| &t.id == id))
                .filter(|t| t.is_active)
                .cloned()
                .collect(),
            None => entry
                .templates
                .iter()
                .filter(|t| t.is_active)
                .cloned()
                .collect(),
        };

        Ok(templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(id: &str, active: bool) -> Template {
        Template {
            id: id.to_string(),
            name: id.to_string(),
            is_active: active,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_missing_placement() {
        let store = MemoryTemplateStore::new();
        assert!(store.get_placement("app", "nope").await.unwrap().is_none());
        assert!(store
            .get_active_templates("app", "nope", None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_placements_are_scoped_by_app() {
        let store = MemoryTemplateStore::new();
        store.upsert_placement(
            "app_a",
            Placement {
                id: "welcome".to_string(),
                name: "Welcome A".to_string(),
                ..Default::default()
            },
        );

        let found = store.get_placement("app_a", "welcome").await.unwrap().unwrap();
        assert_eq!(found.name, "Welcome A");
        assert!(store.get_placement("app_b", "welcome").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_only_active_templates_returned() {
        let store = MemoryTemplateStore::new();
        store.upsert_template("app", "welcome", template("on", true));
        store.upsert_template("app", "welcome", template("off", false));

        let active = store.get_active_templates("app", "welcome", None).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "on");
    }

    #[tokio::test]
    async fn test_active_id_lookup_preserves_order_and_skips_unknown() {
        let store = MemoryTemplateStore::new();
        for id in ["t1", "t2", "t3"] {
            store.upsert_template("app", "welcome", template(id, true));
        }
        store.upsert_template("app", "welcome", template("t4", false));

        let ids = vec![
            "t3".to_string(),
            "missing".to_string(),
            "t1".to_string(),
            "t4".to_string(),
        ];
        let active = store
            .get_active_templates("app", "welcome", Some(ids.as_slice()))
            .await
            .unwrap();
        let found: Vec<_> = active.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(found, vec!["t3", "t1"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_template() {
        let store = MemoryTemplateStore::new();
        store.upsert_template("app", "welcome", template("t1", true));
        store.upsert_template("app", "welcome", template("t1", false));

        assert!(store
            .get_active_templates("app", "welcome", None)
            .await
            .unwrap()
            .is_empty());
        assert!(store.remove_template("app", "welcome", "t1"));
        assert!(!store.remove_template("app", "welcome", "t1"));
    }

    #[tokio::test]
    async fn test_load_seed() {
        let store = MemoryTemplateStore::new();
        let loaded = store
            .load_seed(&json!({
                "my_app": {
                    "welcome_message": {
                        "name": "Welcome",
                        "previewDefaults": {"{user_name}": "there"},
                        "templates": {
                            "tmpl_1": {"name": "Hello", "titleTemplate": "Hi {user_name}", "isActive": true},
                            "tmpl_2": {"name": "Paused", "isActive": false}
                        }
                    }
                }
            }))
            .unwrap();
        assert_eq!(loaded, 1);

        let placement = store
            .get_placement("my_app", "welcome_message")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(placement.id, "welcome_message");
        assert_eq!(placement.defaults["{user_name}"], "there");

        let active = store
            .get_active_templates("my_app", "welcome_message", None)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "tmpl_1");
        assert_eq!(active[0].title_template, "Hi {user_name}");
    }

    #[test]
    fn test_load_seed_rejects_malformed_placement() {
        let store = MemoryTemplateStore::new();
        let err = store
            .load_seed(&json!({"app": {"welcome": {"templateFilters": "not-a-list"}}}))
            .unwrap_err();
        assert!(err.is_malformed());
    }
}
