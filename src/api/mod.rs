//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod notifications;
mod routes;

pub use health::{health, HealthResponse};
pub use metrics::prometheus_metrics;
pub use notifications::{generate_notification, generate_notification_safe};
pub use routes::api_routes;
