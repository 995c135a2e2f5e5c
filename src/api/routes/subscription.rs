//! Push subscription handlers.

use super::{SetSubscriptionResponse, SubscriptionStatus};
use crate::api::AppState;
use crate::error::Error;
use crate::types::PushSubscription;
use axum::{Json, extract::State, http::StatusCode};

/// GET /subscription - Get the stored push subscription
#[utoipa::path(
    get,
    path = "/subscription",
    tag = "subscription",
    responses(
        (status = 200, description = "Subscription status", body = SubscriptionStatus)
    )
)]
pub async fn get_subscription(
    State(state): State<AppState>,
) -> Result<Json<SubscriptionStatus>, Error> {
    let subscription = state.notifier.get_subscription().await?;
    Ok(Json(SubscriptionStatus {
        active: subscription.is_some(),
        subscription,
    }))
}

/// PUT /subscription - Store the push subscription and send a confirmation
#[utoipa::path(
    put,
    path = "/subscription",
    tag = "subscription",
    request_body = PushSubscription,
    responses(
        (status = 200, description = "Subscription stored", body = SetSubscriptionResponse),
        (status = 422, description = "Invalid subscription", body = crate::error::ApiError)
    )
)]
pub async fn set_subscription(
    State(state): State<AppState>,
    Json(subscription): Json<PushSubscription>,
) -> Result<Json<SetSubscriptionResponse>, Error> {
    let confirmation_error = state.notifier.set_subscription(subscription).await?;
    Ok(Json(SetSubscriptionResponse {
        active: true,
        confirmation_error,
    }))
}

/// DELETE /subscription - Forget the push subscription
#[utoipa::path(
    delete,
    path = "/subscription",
    tag = "subscription",
    responses(
        (status = 204, description = "Subscription cleared"),
        (status = 404, description = "No subscription stored", body = crate::error::ApiError)
    )
)]
pub async fn clear_subscription(State(state): State<AppState>) -> Result<StatusCode, Error> {
    if state.notifier.clear_subscription().await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound("push subscription".into()))
    }
}
