// src/web/user_handlers.rs
// Routes open to every logged-in role.
use crate::{
    error::AppResult,
    models::{notification::Notification, outcome::OpResult, user::Identity},
    services::{dashboard_service, dashboard_service::Dashboard, notification_service},
    state::AppState,
};
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;

/// Feedback carried back by redirects, e.g. `/dashboard?error=Club%20not%20found`.
#[derive(Deserialize, Debug, Default)]
pub struct FeedbackParams {
    pub error: Option<String>,
}

// GET /dashboard
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Json<OpResult<Dashboard>>> {
    tracing::debug!("GET /dashboard for user {}", identity.user_id);
    let mut record = dashboard_service::dashboard(&state.db_pool, Some(&identity)).await?;

    // A redirected failure takes precedence over the default greeting
    if let Some(error) = params.error.filter(|e| !e.is_empty()) {
        record.message = error;
    }
    Ok(Json(record))
}

// GET /notifications
pub async fn notifications_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> AppResult<Json<OpResult<Vec<Notification>>>> {
    let record = notification_service::list_notifications(&state.db_pool, Some(&identity)).await?;
    Ok(Json(record))
}

// POST /notifications/{id}/read
pub async fn mark_read_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(notification_id): Path<i64>,
) -> AppResult<Json<OpResult<()>>> {
    let record =
        notification_service::mark_read(&state.db_pool, Some(&identity), notification_id).await?;
    Ok(Json(record))
}
