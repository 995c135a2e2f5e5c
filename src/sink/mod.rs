//! Notification delivery seam
//!
//! Fired events are handed to a [`NotificationSink`] exactly once. Delivery is
//! fire-and-report: a failure is surfaced to the caller but never retried and
//! never un-fires the event.

mod relay;

pub use relay::RelaySink;

use crate::error::DeliveryError;
use crate::types::{Notification, PushSubscription};
use async_trait::async_trait;

/// Channel that carries user-facing notifications to a device
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification to `subscription`
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        notification: &Notification,
    ) -> Result<(), DeliveryError>;

    /// Human-readable name for logging
    fn name(&self) -> &str;
}

/// Sink used when no relay is configured
///
/// Records the notification in the log and reports success.
///
/// ```
/// use stream_notifier::sink::{NoOpSink, NotificationSink};
/// use stream_notifier::types::{Notification, PushSubscription};
///
/// # #[tokio::main]
/// # async fn main() {
/// let sink = NoOpSink;
/// let subscription = PushSubscription {
///     endpoint: "https://push.example.com/abc".into(),
///     expiration_time: None,
///     keys: None,
/// };
/// let result = sink
///     .deliver(&subscription, &Notification::new("Hello", "World"))
///     .await;
/// assert!(result.is_ok());
/// # }
/// ```
pub struct NoOpSink;

#[async_trait]
impl NotificationSink for NoOpSink {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        notification: &Notification,
    ) -> Result<(), DeliveryError> {
        tracing::info!(
            endpoint = %subscription.endpoint,
            title = %notification.title,
            body = %notification.body,
            "no relay configured, notification not pushed"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
