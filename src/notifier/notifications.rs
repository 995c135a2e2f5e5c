//! Notification log access.

use crate::error::{Error, Result};
use crate::types::NotificationRecord;

use super::StreamNotifier;

impl StreamNotifier {
    /// Logged notifications, newest first
    pub async fn list_notifications(
        &self,
        include_dismissed: bool,
        limit: i64,
    ) -> Result<Vec<NotificationRecord>> {
        self.db.list_notifications(include_dismissed, limit).await
    }

    /// Hide one notification from the default listing
    pub async fn dismiss_notification(&self, id: i64) -> Result<()> {
        if self.db.dismiss_notification(id).await? {
            Ok(())
        } else {
            Err(Error::NotFound(format!("notification {}", id)))
        }
    }

    /// Delete every logged notification, returning how many were removed
    pub async fn clear_notifications(&self) -> Result<u64> {
        let removed = self.db.clear_notifications().await?;
        tracing::info!(removed, "notification log cleared");
        Ok(removed)
    }
}
