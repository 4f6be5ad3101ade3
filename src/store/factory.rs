//! Template store factory

use std::sync::Arc;

use crate::config::StoreConfig;

use super::backend::TemplateStore;
use super::memory_backend::MemoryTemplateStore;
use super::redis_backend::RedisTemplateStore;

/// Create a template store based on configuration.
///
/// - `"redis"`: a `RedisTemplateStore` (falls back to memory if the URL is invalid)
/// - `"memory"` (default): a `MemoryTemplateStore`, seeded from `seed_path` when set
pub fn create_template_store(config: &StoreConfig) -> Arc<dyn TemplateStore> {
    match config.backend.as_str() {
        "redis" => match RedisTemplateStore::new(&config.redis_url, config.redis_prefix.clone()) {
            Ok(store) => {
                tracing::info!(
                    backend = "redis",
                    prefix = %config.redis_prefix,
                    "Creating Redis template store"
                );
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Redis template store requested but client could not be created, falling back to memory"
                );
                create_memory_store(config)
            }
        },
        _ => create_memory_store(config),
    }
}

fn create_memory_store(config: &StoreConfig) -> Arc<dyn TemplateStore> {
    let Some(path) = &config.seed_path else {
        tracing::info!(backend = "memory", "Creating empty memory template store");
        return Arc::new(MemoryTemplateStore::new());
    };

    match MemoryTemplateStore::from_seed_file(path) {
        Ok(store) => {
            tracing::info!(
                backend = "memory",
                seed = %path,
                placements = store.placement_count(),
                "Creating seeded memory template store"
            );
            Arc::new(store)
        }
        Err(e) => {
            tracing::error!(error = %e, seed = %path, "Failed to load seed, starting with empty store");
            Arc::new(MemoryTemplateStore::new())
        }
    }
}
