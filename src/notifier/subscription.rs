//! Push subscription management.

use crate::error::{DeliveryError, Error, Result};
use crate::types::{Event, Notification, PushSubscription};

use super::StreamNotifier;

impl StreamNotifier {
    /// The stored push subscription, if any
    pub async fn get_subscription(&self) -> Result<Option<PushSubscription>> {
        self.db.get_push_subscription().await
    }

    /// Store `subscription` as the delivery target and send a confirmation
    ///
    /// Replaces any earlier subscription. The subscription stays stored even
    /// when the confirmation cannot be delivered; that failure is returned as
    /// `Ok(Some(error))` so callers can show it.
    pub async fn set_subscription(
        &self,
        subscription: PushSubscription,
    ) -> Result<Option<DeliveryError>> {
        validate_subscription(&subscription)?;

        self.db.set_push_subscription(&subscription).await?;
        tracing::info!(endpoint = %subscription.endpoint, "push subscription stored");
        self.emit(Event::SubscriptionChanged { active: true });

        let confirmation = Notification::new(
            "Notifications Enabled",
            "You will now receive updates about your watchlist",
        );
        match self.sink.deliver(&subscription, &confirmation).await {
            Ok(()) => Ok(None),
            Err(e) => {
                tracing::warn!(
                    sink = self.sink.name(),
                    error = %e,
                    "confirmation notification could not be delivered"
                );
                Ok(Some(e))
            }
        }
    }

    /// Forget the stored subscription
    ///
    /// Returns whether a subscription was stored.
    pub async fn clear_subscription(&self) -> Result<bool> {
        let cleared = self.db.clear_push_subscription().await?;
        if cleared {
            tracing::info!("push subscription cleared");
            self.emit(Event::SubscriptionChanged { active: false });
        }
        Ok(cleared)
    }
}

fn validate_subscription(subscription: &PushSubscription) -> Result<()> {
    let endpoint = url::Url::parse(&subscription.endpoint).map_err(|e| {
        Error::InvalidSubscription(format!("endpoint {:?}: {}", subscription.endpoint, e))
    })?;

    match endpoint.scheme() {
        "https" | "http" => Ok(()),
        other => Err(Error::InvalidSubscription(format!(
            "endpoint scheme {other:?} is not http(s)"
        ))),
    }
}
