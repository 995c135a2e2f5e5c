//! Watchlist handlers.

use crate::api::AppState;
use crate::error::Error;
use crate::types::{ItemId, NewItem, TrackedItem};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// GET /watchlist - List tracked items
#[utoipa::path(
    get,
    path = "/watchlist",
    tag = "watchlist",
    responses(
        (status = 200, description = "Tracked items in insertion order", body = Vec<TrackedItem>)
    )
)]
pub async fn list_items(State(state): State<AppState>) -> Json<Vec<TrackedItem>> {
    let items = state.notifier.list_items().await;
    Json(items.as_ref().clone())
}

/// GET /watchlist/:id - Get one tracked item
#[utoipa::path(
    get,
    path = "/watchlist/{id}",
    tag = "watchlist",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Tracked item", body = TrackedItem),
        (status = 404, description = "Item not found", body = crate::error::ApiError)
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TrackedItem>, Error> {
    let item = state.notifier.get_item(ItemId(id)).await?;
    Ok(Json(item))
}

/// POST /watchlist - Track a new item
#[utoipa::path(
    post,
    path = "/watchlist",
    tag = "watchlist",
    request_body = NewItem,
    responses(
        (status = 201, description = "Item added", body = TrackedItem),
        (status = 409, description = "Item already tracked", body = crate::error::ApiError),
        (status = 422, description = "Invalid item", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn add_item(
    State(state): State<AppState>,
    Json(item): Json<NewItem>,
) -> Result<(StatusCode, Json<TrackedItem>), Error> {
    let added = state.notifier.add_item(item).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// DELETE /watchlist/:id - Stop tracking an item
#[utoipa::path(
    delete,
    path = "/watchlist/{id}",
    tag = "watchlist",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "Item not found", body = crate::error::ApiError)
    )
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, Error> {
    state.notifier.remove_item(ItemId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
