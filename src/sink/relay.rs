//! HTTP push relay sink

use super::NotificationSink;
use crate::config::RelayConfig;
use crate::error::DeliveryError;
use crate::types::{Notification, PushSubscription};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Sink that POSTs `{subscription, notification}` to a web-push relay
///
/// The relay holds the VAPID keys and performs the actual push; this side only
/// needs to know its URL and, optionally, an `Authorization` header value.
pub struct RelaySink {
    http: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    timeout: Duration,
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    subscription: &'a PushSubscription,
    notification: &'a Notification,
}

impl RelaySink {
    /// Create a sink for the configured relay
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.url.clone(),
            auth_header: config.auth_header.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl NotificationSink for RelaySink {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        notification: &Notification,
    ) -> Result<(), DeliveryError> {
        let payload = RelayPayload {
            subscription,
            notification,
        };

        let mut request = self.http.post(&self.url).json(&payload).timeout(self.timeout);
        if let Some(auth) = &self.auth_header {
            request = request.header("Authorization", auth);
        }

        let response = match tokio::time::timeout(self.timeout, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => {
                return Err(DeliveryError::Timeout {
                    millis: self.timeout.as_millis() as u64,
                });
            }
            Ok(Err(e)) => {
                return Err(DeliveryError::Transport {
                    message: e.to_string(),
                });
            }
            Err(_) => {
                return Err(DeliveryError::Timeout {
                    millis: self.timeout.as_millis() as u64,
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(url = %self.url, title = %notification.title, "notification relayed");
        Ok(())
    }

    fn name(&self) -> &str {
        "relay"
    }
}
