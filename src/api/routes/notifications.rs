//! Notification log handlers.

use super::{ClearedResponse, DEFAULT_NOTIFICATION_LIMIT, MAX_NOTIFICATION_LIMIT, NotificationsQuery};
use crate::api::AppState;
use crate::error::{ApiError, Error};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /notifications - List logged notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    params(NotificationsQuery),
    responses(
        (status = 200, description = "Logged notifications", body = Vec<crate::types::NotificationRecord>),
        (status = 400, description = "Invalid limit", body = ApiError)
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationsQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT);
    if limit <= 0 {
        return ApiError::validation(format!("limit must be positive, got {limit}")).into_response();
    }
    let limit = limit.min(MAX_NOTIFICATION_LIMIT);

    match state
        .notifier
        .list_notifications(query.include_dismissed, limit)
        .await
    {
        Ok(records) => Json(records).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /notifications/:id/dismiss - Dismiss one notification
#[utoipa::path(
    post,
    path = "/notifications/{id}/dismiss",
    tag = "notifications",
    params(
        ("id" = i64, Path, description = "Notification ID")
    ),
    responses(
        (status = 204, description = "Notification dismissed"),
        (status = 404, description = "Notification not found", body = ApiError)
    )
)]
pub async fn dismiss_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, Error> {
    state.notifier.dismiss_notification(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /notifications - Clear the notification log
#[utoipa::path(
    delete,
    path = "/notifications",
    tag = "notifications",
    responses(
        (status = 200, description = "Log cleared", body = ClearedResponse)
    )
)]
pub async fn clear_notifications(
    State(state): State<AppState>,
) -> Result<Json<ClearedResponse>, Error> {
    let removed = state.notifier.clear_notifications().await?;
    Ok(Json(ClearedResponse { removed }))
}
