//! On-demand reconciliation.

use crate::api::AppState;
use crate::error::Error;
use crate::types::PassReport;
use axum::{Json, extract::State};

/// POST /check - Run a reconciliation pass now
///
/// Waits for any pass already running, then runs a full pass and returns its
/// report. Per-item provider failures are part of the report, not an error.
#[utoipa::path(
    post,
    path = "/check",
    tag = "checks",
    responses(
        (status = 200, description = "Pass report", body = PassReport),
        (status = 500, description = "Pass could not be committed", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn check_now(State(state): State<AppState>) -> Result<Json<PassReport>, Error> {
    let report = state.notifier.check_now().await?;
    Ok(Json(report))
}
