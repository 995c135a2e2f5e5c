//! Runtime state: shutdown detection and the active push subscription.

use crate::error::DatabaseError;
use crate::types::PushSubscription;
use crate::{Error, Result};

use super::Database;

const PUSH_SUBSCRIPTION_KEY: &str = "push_subscription";

impl Database {
    /// Check if the last shutdown was unclean
    ///
    /// Returns true if the previous session did not call set_clean_shutdown(),
    /// indicating a crash or forced termination.
    pub async fn was_unclean_shutdown(&self) -> Result<bool> {
        let value = self.get_state("clean_shutdown").await?;
        Ok(value.is_none_or(|v| v != "true"))
    }

    /// Mark that the service has started
    ///
    /// If set_clean_shutdown() is not called before the next startup,
    /// was_unclean_shutdown() will return true.
    pub async fn set_clean_start(&self) -> Result<()> {
        self.put_state("clean_shutdown", "false").await
    }

    /// Mark that the service is shutting down cleanly
    pub async fn set_clean_shutdown(&self) -> Result<()> {
        self.put_state("clean_shutdown", "true").await
    }

    /// Get the active push subscription, if any
    pub async fn get_push_subscription(&self) -> Result<Option<PushSubscription>> {
        match self.get_state(PUSH_SUBSCRIPTION_KEY).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Replace the active push subscription
    pub async fn set_push_subscription(&self, subscription: &PushSubscription) -> Result<()> {
        let json = serde_json::to_string(subscription)?;
        self.put_state(PUSH_SUBSCRIPTION_KEY, &json).await
    }

    /// Remove the active push subscription
    ///
    /// Returns `false` when none was stored.
    pub async fn clear_push_subscription(&self) -> Result<bool> {
        let result = sqlx::query("DELETE FROM runtime_state WHERE key = ?")
            .bind(PUSH_SUBSCRIPTION_KEY)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to clear push subscription: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_state(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT value FROM runtime_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to read runtime state '{}': {}",
                    key, e
                )))
            })
    }

    async fn put_state(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO runtime_state (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to write runtime state '{}': {}",
                key, e
            )))
        })?;

        Ok(())
    }
}
