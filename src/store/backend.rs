//! Backend trait for placement and template lookup.
//!
//! The assembler only reads through this trait, so placements can live in
//! memory (tests, local runs) or in Redis without the engine noticing.

use async_trait::async_trait;
use thiserror::Error;

use crate::template::{Placement, Template};

/// Errors that can occur while reading placements or templates.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Redis operation failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Stored document could not be decoded into the expected shape
    #[error("Malformed document at {key}: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Seed data could not be read
    #[error("Failed to read seed data: {0}")]
    Seed(String),

    /// Backend is temporarily unavailable
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the error describes bad data rather than a failed lookup
    pub fn is_malformed(&self) -> bool {
        matches!(self, StoreError::Malformed { .. })
    }
}

/// Read access to placements and their templates.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one store is shared by every
/// concurrent generation call.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Backend type identifier (for logs and health output)
    fn backend_type(&self) -> &'static str;

    /// Fetch a placement configuration.
    ///
    /// Returns `Ok(None)` when the placement does not exist.
    async fn get_placement(
        &self,
        app_id: &str,
        placement_id: &str,
    ) -> Result<Option<Placement>, StoreError>;

    /// Fetch the active templates of a placement.
    ///
    /// With `active_ids`, only those templates are looked up (in that order);
    /// without, every template of the placement is scanned. Templates whose
    /// `isActive` flag is not set are never returned.
    async fn get_active_templates(
        &self,
        app_id: &str,
        placement_id: &str,
        active_ids: Option<&[String]>,
    ) -> Result<Vec<Template>, StoreError>;
}
