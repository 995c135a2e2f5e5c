//! Tracked item CRUD and pass commits.

use crate::error::DatabaseError;
use crate::types::{ItemId, NewItem, NextEpisode, ReconciliationEvent, TrackedItem};
use crate::{Error, Result};
use chrono::{DateTime, Utc};

use super::{Database, TrackedItemRow, encode_providers, format_date};

const SELECT_ITEMS: &str = r#"
    SELECT id, external_id, title, media_kind, providers,
           next_air_date, next_season, next_episode, next_name,
           release_date, notified, last_checked, added_at
    FROM tracked_items
"#;

impl Database {
    /// Insert a new tracked item
    ///
    /// Returns [`Error::Duplicate`] when the `(external_id, media_kind)` pair is
    /// already tracked.
    pub async fn insert_item(
        &self,
        item: &NewItem,
        next_episode: Option<&NextEpisode>,
        now: DateTime<Utc>,
    ) -> Result<TrackedItem> {
        let result = sqlx::query(
            r#"
            INSERT INTO tracked_items (
                external_id, title, media_kind, providers,
                next_air_date, next_season, next_episode, next_name,
                release_date, notified, last_checked, added_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(item.external_id)
        .bind(&item.title)
        .bind(item.media_kind.as_str())
        .bind(encode_providers(&item.providers))
        .bind(next_episode.map(|e| format_date(e.air_date)))
        .bind(next_episode.map(|e| i64::from(e.season_number)))
        .bind(next_episode.map(|e| i64::from(e.episode_number)))
        .bind(next_episode.and_then(|e| e.name.clone()))
        .bind(item.release_date.map(format_date))
        .bind(now.timestamp_millis())
        .bind(now.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => Error::Duplicate(format!(
                "{} {} is already on the watchlist",
                item.media_kind, item.external_id
            )),
            other => Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert tracked item: {}",
                other
            ))),
        })?;

        Ok(TrackedItem {
            id: ItemId(result.last_insert_rowid()),
            external_id: item.external_id,
            title: item.title.clone(),
            media_kind: item.media_kind,
            providers: item.providers.clone(),
            next_episode: next_episode.cloned(),
            release_date: item.release_date,
            notified: false,
            last_checked: now,
            added_at: now,
        })
    }

    /// List all tracked items in insertion order
    pub async fn list_items(&self) -> Result<Vec<TrackedItem>> {
        let rows = sqlx::query_as::<_, TrackedItemRow>(&format!("{SELECT_ITEMS} ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to list tracked items: {}",
                    e
                )))
            })?;

        rows.into_iter()
            .map(|row| TrackedItem::try_from(row).map_err(Error::Database))
            .collect()
    }

    /// Get a tracked item by ID
    pub async fn get_item(&self, id: ItemId) -> Result<Option<TrackedItem>> {
        let row = sqlx::query_as::<_, TrackedItemRow>(&format!("{SELECT_ITEMS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get tracked item: {}",
                    e
                )))
            })?;

        row.map(|row| TrackedItem::try_from(row).map_err(Error::Database))
            .transpose()
    }

    /// Delete a tracked item
    ///
    /// Returns `false` when no item had that ID.
    pub async fn delete_item(&self, id: ItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tracked_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to delete tracked item: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Persist the outcome of a reconciliation pass
    ///
    /// Writes the mutable state of every item and appends one log entry per
    /// fired event, all in a single transaction. Items deleted since the pass
    /// took its snapshot are skipped along with their events.
    pub async fn save_pass(
        &self,
        items: &[TrackedItem],
        events: &[ReconciliationEvent],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to begin pass transaction: {}",
                e
            )))
        })?;

        for item in items {
            let next = item.next_episode.as_ref();
            sqlx::query(
                r#"
                UPDATE tracked_items
                SET providers = ?, next_air_date = ?, next_season = ?, next_episode = ?,
                    next_name = ?, notified = ?, last_checked = ?
                WHERE id = ?
                "#,
            )
            .bind(encode_providers(&item.providers))
            .bind(next.map(|e| format_date(e.air_date)))
            .bind(next.map(|e| i64::from(e.season_number)))
            .bind(next.map(|e| i64::from(e.episode_number)))
            .bind(next.and_then(|e| e.name.clone()))
            .bind(i32::from(item.notified))
            .bind(item.last_checked.timestamp_millis())
            .bind(item.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to update tracked item {}: {}",
                    item.id, e
                )))
            })?;
        }

        for event in events {
            sqlx::query(
                r#"
                INSERT INTO notification_log (item_id, kind, title, body, created_at)
                SELECT id, ?, ?, ?, ? FROM tracked_items WHERE id = ?
                "#,
            )
            .bind(event.kind.tag())
            .bind(&event.notification.title)
            .bind(&event.notification.body)
            .bind(now.timestamp_millis())
            .bind(event.item_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to log notification for item {}: {}",
                    event.item_id, e
                )))
            })?;
        }

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit pass: {}",
                e
            )))
        })?;

        Ok(())
    }
}
