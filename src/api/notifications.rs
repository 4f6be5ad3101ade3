//! Notification generation endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::server::AppState;
use crate::template::{GenerateRequest, NotificationGenerator, RenderedNotification};

/// Generate a notification for a placement
#[tracing::instrument(
    name = "http.generate_notification",
    skip(state, request),
    fields(placement_id = %request.placement_id)
)]
pub async fn generate_notification(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<RenderedNotification>> {
    request.validate()?;

    let rendered = state.generator(&app_id).generate(&request).await?;

    Ok(Json(rendered))
}

/// Generate a notification, answering with fallback content on any failure
#[tracing::instrument(
    name = "http.generate_notification_safe",
    skip(state, request),
    fields(placement_id = %request.placement_id)
)]
pub async fn generate_notification_safe(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    Json(request): Json<GenerateRequest>,
) -> Json<RenderedNotification> {
    Json(state.generator(&app_id).generate_safe(&request).await)
}
