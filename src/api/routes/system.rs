//! System handlers: services, health, OpenAPI, events, shutdown.

use crate::api::AppState;
use crate::catalog::ServiceEntry;
use crate::types::Event;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// GET /services - Known streaming services in catalog order
#[utoipa::path(
    get,
    path = "/services",
    tag = "system",
    responses(
        (status = 200, description = "Service catalog", body = Vec<ServiceEntry>)
    )
)]
pub async fn list_services(State(state): State<AppState>) -> Json<&'static [ServiceEntry]> {
    Json(state.notifier.services())
}

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Service is shutting down")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let accepting = state.notifier.is_accepting();
    let status = if accepting {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if accepting { "ok" } else { "shutting_down" },
            "version": env!("CARGO_PKG_VERSION"),
            "items": state.notifier.list_items().await.len(),
        })),
    )
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// SSE event name for a service event
fn event_name(event: &Event) -> &'static str {
    match event {
        Event::ItemAdded { .. } => "item_added",
        Event::ItemRemoved { .. } => "item_removed",
        Event::PassStarted { .. } => "pass_started",
        Event::ItemCheckFailed { .. } => "item_check_failed",
        Event::Notified { .. } => "notified",
        Event::DeliveryFailed { .. } => "delivery_failed",
        Event::PassCompleted { .. } => "pass_completed",
        Event::SubscriptionChanged { .. } => "subscription_changed",
        Event::Shutdown => "shutdown",
    }
}

/// GET /events - Server-sent events stream
#[utoipa::path(
    get,
    path = "/events",
    tag = "system",
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream")
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let receiver = state.notifier.subscribe();
    let stream = BroadcastStream::new(receiver);

    let sse_stream = stream.filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json_data) => Some(Ok(SseEvent::default()
                .event(event_name(&event))
                .data(json_data))),
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize event");
                None
            }
        },
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE client lagged");
            Some(Ok(SseEvent::default().event("error").data(format!(
                r#"{{"error":"lagged","skipped":{}}}"#,
                skipped
            ))))
        }
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}

/// POST /shutdown - Graceful shutdown
///
/// Returns immediately; the API server stops once the notifier has shut down.
#[utoipa::path(
    post,
    path = "/shutdown",
    tag = "system",
    responses(
        (status = 202, description = "Shutdown initiated")
    )
)]
pub async fn shutdown(State(state): State<AppState>) -> impl IntoResponse {
    tokio::spawn(async move {
        if let Err(e) = state.notifier.shutdown().await {
            tracing::error!(error = %e, "Error during graceful shutdown");
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({"status": "shutdown initiated"})),
    )
}
