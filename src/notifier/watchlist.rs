//! Watchlist mutations and lookups.

use crate::error::{Error, Result};
use crate::retry::attempt_with_timeout;
use crate::types::{Event, ItemId, MediaKind, NewItem, NextEpisode, TrackedItem};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::StreamNotifier;

impl StreamNotifier {
    /// Start tracking an item
    ///
    /// Series get their initial target episode fetched up front so the first
    /// pass can fire for an episode that airs the same day. A failed lookup
    /// is not fatal; the item is tracked without a target and the next pass
    /// fills it in.
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once shutdown has begun
    /// - [`Error::InvalidItem`] for an empty title or non-positive id
    /// - [`Error::Duplicate`] when the item is already tracked
    pub async fn add_item(&self, item: NewItem) -> Result<TrackedItem> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        validate_new_item(&item)?;

        let _gate = self.pass_gate.lock().await;

        let next_episode = match item.media_kind {
            MediaKind::Series => self.initial_target(item.external_id).await,
            MediaKind::Film => None,
        };

        let added = self
            .store
            .insert(&item, next_episode.as_ref(), Utc::now())
            .await?;

        tracing::info!(
            item_id = %added.id,
            external_id = added.external_id,
            media_kind = %added.media_kind,
            title = %added.title,
            "item added to watchlist"
        );

        self.emit(Event::ItemAdded {
            id: added.id,
            title: added.title.clone(),
        });

        Ok(added)
    }

    /// Stop tracking an item
    ///
    /// Logged notifications for the item are dropped with it.
    pub async fn remove_item(&self, id: ItemId) -> Result<()> {
        let _gate = self.pass_gate.lock().await;

        let removed = self.store.remove(id).await?;
        tracing::info!(item_id = %id, title = %removed.title, "item removed from watchlist");

        self.emit(Event::ItemRemoved { id });
        Ok(())
    }

    /// Every tracked item in insertion order
    pub async fn list_items(&self) -> Arc<Vec<TrackedItem>> {
        self.store.snapshot().await
    }

    /// One tracked item
    pub async fn get_item(&self, id: ItemId) -> Result<TrackedItem> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("item {}", id)))
    }

    async fn initial_target(&self, external_id: i64) -> Option<NextEpisode> {
        let timeout = self.config.reconcile.query_timeout;
        match attempt_with_timeout(timeout, self.provider.next_episode(external_id)).await {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!(
                    external_id,
                    error = %e,
                    "initial episode lookup failed, next pass will retry"
                );
                None
            }
        }
    }
}

fn validate_new_item(item: &NewItem) -> Result<()> {
    if item.title.trim().is_empty() {
        return Err(Error::InvalidItem("title must not be empty".into()));
    }
    if item.external_id <= 0 {
        return Err(Error::InvalidItem(format!(
            "external id must be positive, got {}",
            item.external_id
        )));
    }
    Ok(())
}
