//! REST API server module
//!
//! Provides an OpenAPI documented REST API for managing the watchlist,
//! triggering checks, and following notifications as they fire.

use crate::{Config, Result, StreamNotifier};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Watchlist
/// - `GET /watchlist` - List tracked items
/// - `POST /watchlist` - Track a new item
/// - `GET /watchlist/:id` - Get one tracked item
/// - `DELETE /watchlist/:id` - Stop tracking an item
///
/// ## Checks
/// - `POST /check` - Run a reconciliation pass now
///
/// ## Notifications
/// - `GET /notifications` - List logged notifications
/// - `POST /notifications/:id/dismiss` - Dismiss a notification
/// - `DELETE /notifications` - Clear the notification log
///
/// ## Subscription
/// - `GET /subscription` - Get the push subscription
/// - `PUT /subscription` - Set the push subscription
/// - `DELETE /subscription` - Clear the push subscription
///
/// ## System
/// - `GET /services` - Known streaming services
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /events` - Server-sent events stream
/// - `POST /shutdown` - Graceful shutdown
pub fn create_router(notifier: Arc<StreamNotifier>, config: Arc<Config>) -> Router {
    let state = AppState::new(notifier, config.clone());

    let router = Router::new()
        // Watchlist
        .route("/watchlist", get(routes::list_items))
        .route("/watchlist", post(routes::add_item))
        .route("/watchlist/:id", get(routes::get_item))
        .route("/watchlist/:id", delete(routes::remove_item))
        // Checks
        .route("/check", post(routes::check_now))
        // Notifications
        .route("/notifications", get(routes::list_notifications))
        .route("/notifications", delete(routes::clear_notifications))
        .route(
            "/notifications/:id/dismiss",
            post(routes::dismiss_notification),
        )
        // Subscription
        .route(
            "/subscription",
            get(routes::get_subscription)
                .put(routes::set_subscription)
                .delete(routes::clear_subscription),
        )
        // System
        .route("/services", get(routes::list_services))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream))
        .route("/shutdown", post(routes::shutdown));

    // SwaggerUi serves its own copy of the document next to the UI
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    let router = if config.server.api.api_key.is_some() {
        router.layer(middleware::from_fn_with_state(
            config.server.api.api_key.clone(),
            auth::require_api_key,
        ))
    } else {
        router
    };

    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// # Arguments
///
/// * `origins` - List of allowed origins (supports "*" for any origin)
///
/// # Returns
///
/// A configured CorsLayer that allows the specified origins, all methods,
/// and all headers for cross-origin requests.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    // Check if "*" (all origins) is in the list
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        // Allow all origins (default for local development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Allow specific origins
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Serves until `shutdown` is cancelled, then lets in-flight requests finish.
///
/// # Example
///
/// ```no_run
/// use stream_notifier::{StreamNotifier, Config};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let notifier = Arc::new(StreamNotifier::new((*config).clone()).await?);
///
/// // Blocks until the token is cancelled
/// stream_notifier::api::start_api_server(notifier, config, CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    notifier: Arc<StreamNotifier>,
    config: Arc<Config>,
    shutdown: CancellationToken,
) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(notifier, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
