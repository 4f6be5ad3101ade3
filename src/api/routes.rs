use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::health::health;
use super::metrics::prometheus_metrics;
use super::notifications::{generate_notification, generate_notification_safe};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                .route(
                    "/apps/{app_id}/notifications/generate",
                    post(generate_notification),
                )
                .route(
                    "/apps/{app_id}/notifications/generate-safe",
                    post(generate_notification_safe),
                ),
        )
}
