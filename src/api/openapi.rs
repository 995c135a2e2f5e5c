//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the stream-notifier REST API
///
/// Served at `/openapi.json` and, when enabled, through `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "stream-notifier REST API",
        version = "0.1.0",
        description = "Track series and films, and get notified when new episodes air or films reach a streaming service",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        // Watchlist
        crate::api::routes::list_items,
        crate::api::routes::get_item,
        crate::api::routes::add_item,
        crate::api::routes::remove_item,

        // Checks
        crate::api::routes::check_now,

        // Notifications
        crate::api::routes::list_notifications,
        crate::api::routes::dismiss_notification,
        crate::api::routes::clear_notifications,

        // Subscription
        crate::api::routes::get_subscription,
        crate::api::routes::set_subscription,
        crate::api::routes::clear_subscription,

        // System
        crate::api::routes::list_services,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
        crate::api::routes::shutdown,
    ),
    components(schemas(
        crate::types::ItemId,
        crate::types::MediaKind,
        crate::types::NextEpisode,
        crate::types::TrackedItem,
        crate::types::NewItem,
        crate::types::Notification,
        crate::types::EventKind,
        crate::types::ReconciliationEvent,
        crate::types::PassTrigger,
        crate::types::DeliveryFailure,
        crate::types::PassReport,
        crate::types::PushSubscription,
        crate::types::PushKeys,
        crate::types::NotificationRecord,
        crate::types::Event,
        crate::catalog::ServiceId,
        crate::catalog::ServiceEntry,
        crate::error::ApiError,
        crate::error::ErrorDetail,
        crate::api::routes::NotificationsQuery,
        crate::api::routes::SubscriptionStatus,
        crate::api::routes::SetSubscriptionResponse,
        crate::api::routes::ClearedResponse,
    )),
    tags(
        (name = "watchlist", description = "Tracked series and films"),
        (name = "checks", description = "On-demand reconciliation passes"),
        (name = "notifications", description = "Notification log"),
        (name = "subscription", description = "Push subscription"),
        (name = "system", description = "Service catalog, health, events and lifecycle")
    )
)]
pub struct ApiDoc;
