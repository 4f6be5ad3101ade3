//! Redis-based template store backend.
//!
//! Documents are stored as JSON strings written by the authoring tool:
//! - `{prefix}:{app_id}:placement:{placement_id}` → placement document
//! - `{prefix}:{app_id}:templates:{placement_id}` → hash of template_id → template document

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};
use tokio::sync::RwLock;

use crate::template::{Placement, Template};

use super::backend::{StoreError, TemplateStore};

/// Redis-backed template store.
///
/// Holds one multiplexed connection, established on first use and dropped
/// again when Redis reports a connection-level failure.
pub struct RedisTemplateStore {
    /// Redis client for creating connections
    client: Client,

    /// Multiplexed connection (shared across tasks)
    connection: RwLock<Option<MultiplexedConnection>>,

    /// Key prefix for Redis keys
    prefix: String,
}

impl RedisTemplateStore {
    /// Create a new Redis template store. No connection is made until first use.
    pub fn new(url: &str, prefix: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::open(url)?;

        Ok(Self {
            client,
            connection: RwLock::new(None),
            prefix: prefix.into(),
        })
    }

    fn placement_key(&self, app_id: &str, placement_id: &str) -> String {
        format!("{}:{}:placement:{}", self.prefix, app_id, placement_id)
    }

    fn templates_key(&self, app_id: &str, placement_id: &str) -> String {
        format!("{}:{}:templates:{}", self.prefix, app_id, placement_id)
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection, StoreError> {
        {
            let conn = self.connection.read().await;
            if let Some(ref c) = *conn {
                return Ok(c.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // Double-check in case another task connected while we waited
        if let Some(ref c) = *conn_guard {
            return Ok(c.clone());
        }

        match self.client.get_multiplexed_tokio_connection().await {
            Ok(conn) => {
                *conn_guard = Some(conn.clone());
                tracing::info!(prefix = %self.prefix, "Template store connected to Redis");
                Ok(conn)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to Redis");
                Err(StoreError::Redis(e))
            }
        }
    }

    /// Clear the cached connection after a connection-level failure
    async fn handle_error(&self, err: RedisError) -> StoreError {
        if err.is_connection_dropped() || err.is_io_error() {
            let mut conn_guard = self.connection.write().await;
            *conn_guard = None;
        }
        StoreError::Redis(err)
    }

    /// Decode template documents, skipping entries that do not parse
    fn decode_templates<I>(&self, key: &str, entries: I) -> Vec<Template>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        entries
            .into_iter()
            .filter_map(|(template_id, raw)| match serde_json::from_str::<Template>(&raw) {
                Ok(mut template) => {
                    if template.id.is_empty() {
                        template.id = template_id;
                    }
                    Some(template)
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        key = %key,
                        template_id = %template_id,
                        "Failed to deserialize template document"
                    );
                    None
                }
            })
            .filter(|t| t.is_active)
            .collect()
    }
}

#[async_trait]
impl TemplateStore for RedisTemplateStore {
    fn backend_type(&self) -> &'static str {
        "redis"
    }

    async fn get_placement(
        &self,
        app_id: &str,
        placement_id: &str,
    ) -> Result<Option<Placement>, StoreError> {
        let key = self.placement_key(app_id, placement_id);
        let mut conn = self.get_connection().await?;

        let raw: Option<String> = match conn.get(&key).await {
            Ok(raw) => raw,
            Err(e) => return Err(self.handle_error(e).await),
        };

        let Some(raw) = raw else {
            return Ok(None);
        };

        let mut placement: Placement =
            serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
                key: key.clone(),
                source,
            })?;
        placement.id = placement_id.to_string();

        tracing::debug!(
            key = %key,
            variables = placement.variables.len(),
            filters = placement.template_filters.len(),
            "Loaded placement document"
        );

        Ok(Some(placement))
    }

    async fn get_active_templates(
        &self,
        app_id: &str,
        placement_id: &str,
        active_ids: Option<&[String]>,
    ) -> Result<Vec<Template>, StoreError> {
        let key = self.templates_key(app_id, placement_id);
        let mut conn = self.get_connection().await?;

        let entries: Vec<(String, String)> = match active_ids {
            Some([]) => Vec::new(),
            Some(ids) => {
                let result: Result<Vec<Option<String>>, RedisError> = redis::cmd("HMGET")
                    .arg(&key)
                    .arg(ids.to_vec())
                    .query_async(&mut conn)
                    .await;
                match result {
                    Ok(values) => ids
                        .iter()
                        .cloned()
                        .zip(values)
                        .filter_map(|(id, raw)| raw.map(|raw| (id, raw)))
                        .collect(),
                    Err(e) => return Err(self.handle_error(e).await),
                }
            }
            None => match conn.hgetall(&key).await {
                Ok(entries) => entries,
                Err(e) => return Err(self.handle_error(e).await),
            },
        };

        Ok(self.decode_templates(&key, entries))
    }
}
