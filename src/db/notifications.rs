//! Notification log queries.

use crate::error::DatabaseError;
use crate::types::NotificationRecord;
use crate::{Error, Result};

use super::{Database, NotificationRow};

impl Database {
    /// List logged notifications, newest first
    ///
    /// Dismissed entries are only included when `include_dismissed` is set.
    pub async fn list_notifications(
        &self,
        include_dismissed: bool,
        limit: i64,
    ) -> Result<Vec<NotificationRecord>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, item_id, kind, title, body, created_at, dismissed
            FROM notification_log
            WHERE dismissed = 0 OR ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(include_dismissed)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list notifications: {}",
                e
            )))
        })?;

        Ok(rows.into_iter().map(NotificationRecord::from).collect())
    }

    /// Mark a notification as dismissed
    ///
    /// Returns `false` when no notification had that ID.
    pub async fn dismiss_notification(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE notification_log SET dismissed = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to dismiss notification: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every logged notification, returning how many were removed
    pub async fn clear_notifications(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notification_log")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to clear notifications: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected())
    }
}
