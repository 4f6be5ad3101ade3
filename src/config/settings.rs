use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Backend type: "memory" or "redis"
    #[serde(default = "default_store_backend")]
    pub backend: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Key prefix for Redis documents
    #[serde(default = "default_redis_prefix")]
    pub redis_prefix: String,
    /// JSON fixture loaded into the memory backend at startup
    #[serde(default)]
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Message length limit when a request does not set one (0 disables)
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Generation calls slower than this are logged at warn
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Default filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_store_backend() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_prefix() -> String {
    "copylab".to_string()
}

fn default_max_length() -> usize {
    200
}

fn default_slow_threshold_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("store.backend", default_store_backend())?
            .set_default("render.max_length", default_max_length() as i64)?
            .set_default("render.slow_threshold_ms", default_slow_threshold_ms() as i64)?
            .set_default("log.level", default_log_level())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER_HOST, SERVER_PORT, STORE_BACKEND, LOG_LEVEL, LOG_JSON, ...
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true)
                    .list_separator(","),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            redis_url: default_redis_url(),
            redis_prefix: default_redis_prefix(),
            seed_path: None,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            slow_threshold_ms: default_slow_threshold_ms(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.server_addr(), "0.0.0.0:8080");
        assert_eq!(settings.store.backend, "memory");
        assert_eq!(settings.store.redis_prefix, "copylab");
        assert_eq!(settings.render.max_length, 200);
        assert_eq!(settings.render.slow_threshold_ms, 1000);
        assert_eq!(settings.log.level, "info");
        assert!(!settings.log.json);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "store": {"backend": "redis"},
            "render": {"max_length": 120}
        }))
        .unwrap();
        assert_eq!(settings.store.backend, "redis");
        assert_eq!(settings.store.redis_url, "redis://localhost:6379");
        assert_eq!(settings.render.max_length, 120);
        assert_eq!(settings.render.slow_threshold_ms, 1000);
        assert_eq!(settings.server.port, 8080);
    }
}
