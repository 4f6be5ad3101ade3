//! Placement and template storage.
//!
//! The rendering engine reads placements and templates through the
//! [`TemplateStore`] trait. Two backends are provided:
//! - `memory`: `DashMap`-backed, optionally seeded from a JSON file
//! - `redis`: JSON documents stored in Redis strings and hashes

mod backend;
mod factory;
mod memory_backend;
mod redis_backend;

pub use backend::{StoreError, TemplateStore};
pub use factory::create_template_store;
pub use memory_backend::MemoryTemplateStore;
pub use redis_backend::RedisTemplateStore;
