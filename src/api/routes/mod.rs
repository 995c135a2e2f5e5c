//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`watchlist`] — Tracked item management
//! - [`checks`] — On-demand reconciliation passes
//! - [`notifications`] — Notification log
//! - [`subscription`] — Push subscription
//! - [`system`] — Services, health, events, OpenAPI, shutdown

use crate::error::DeliveryError;
use crate::types::PushSubscription;
use serde::{Deserialize, Serialize};

mod checks;
mod notifications;
mod subscription;
mod system;
mod watchlist;

// Re-export all handlers so `routes::function_name` works
pub use checks::*;
pub use notifications::*;
pub use subscription::*;
pub use system::*;
pub use watchlist::*;

/// Default page size for GET /notifications
pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 50;

/// Largest page GET /notifications will return
pub const MAX_NOTIFICATION_LIMIT: i64 = 500;

/// Query parameters for GET /notifications
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Query)]
pub struct NotificationsQuery {
    /// Include dismissed notifications (default: false)
    #[serde(default)]
    pub include_dismissed: bool,
    /// Maximum number of entries to return (default: 50, max: 500)
    pub limit: Option<i64>,
}

/// Response for GET /subscription
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubscriptionStatus {
    /// Whether a subscription is stored
    pub active: bool,
    /// The stored subscription
    pub subscription: Option<PushSubscription>,
}

/// Response for PUT /subscription
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SetSubscriptionResponse {
    /// Always true; the subscription is stored even if the confirmation failed
    pub active: bool,
    /// Why the confirmation notification could not be delivered
    #[schema(value_type = Option<Object>)]
    pub confirmation_error: Option<DeliveryError>,
}

/// Response for DELETE /notifications
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ClearedResponse {
    /// Number of entries removed
    pub removed: u64,
}
