//! In-memory watchlist backed by the database
//!
//! Readers take cheap snapshots (`Arc<Vec<TrackedItem>>`); every mutation is
//! persisted first and then swapped in whole, so a snapshot never shows a
//! half-applied pass.

use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::{ItemId, NewItem, NextEpisode, ReconciliationEvent, TrackedItem};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Owned handle to the tracked item collection
pub struct WatchlistStore {
    db: Arc<Database>,
    items: RwLock<Arc<Vec<TrackedItem>>>,
}

impl WatchlistStore {
    /// Load the watchlist from the database
    pub async fn load(db: Arc<Database>) -> Result<Self> {
        let items = db.list_items().await?;
        tracing::debug!(items = items.len(), "watchlist loaded");
        Ok(Self {
            db,
            items: RwLock::new(Arc::new(items)),
        })
    }

    /// Consistent view of every tracked item in insertion order
    pub async fn snapshot(&self) -> Arc<Vec<TrackedItem>> {
        self.items.read().await.clone()
    }

    /// Look up one item
    pub async fn get(&self, id: ItemId) -> Option<TrackedItem> {
        self.items.read().await.iter().find(|i| i.id == id).cloned()
    }

    /// Number of tracked items
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the watchlist is empty
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Persist and append a new item
    pub async fn insert(
        &self,
        item: &NewItem,
        next_episode: Option<&NextEpisode>,
        now: DateTime<Utc>,
    ) -> Result<TrackedItem> {
        let mut guard = self.items.write().await;

        if guard
            .iter()
            .any(|i| i.external_id == item.external_id && i.media_kind == item.media_kind)
        {
            return Err(Error::Duplicate(format!(
                "{} {} is already on the watchlist",
                item.media_kind, item.external_id
            )));
        }

        let inserted = self.db.insert_item(item, next_episode, now).await?;

        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(inserted.clone());
        *guard = Arc::new(next);

        Ok(inserted)
    }

    /// Persist and drop an item
    ///
    /// Returns [`Error::NotFound`] when the item is not tracked.
    pub async fn remove(&self, id: ItemId) -> Result<TrackedItem> {
        let mut guard = self.items.write().await;

        let Some(position) = guard.iter().position(|i| i.id == id) else {
            return Err(Error::NotFound(format!("item {}", id)));
        };

        self.db.delete_item(id).await?;

        let mut next: Vec<TrackedItem> = guard.iter().cloned().collect();
        let removed = next.remove(position);
        *guard = Arc::new(next);

        Ok(removed)
    }

    /// Persist a pass outcome and swap it in
    ///
    /// `items` replaces the entries with matching ids; items added or removed
    /// since the pass took its snapshot are left as they are now. When the
    /// database write fails the in-memory collection is untouched.
    pub async fn commit(
        &self,
        items: Vec<TrackedItem>,
        events: &[ReconciliationEvent],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut guard = self.items.write().await;

        self.db.save_pass(&items, events, now).await?;

        let mut updated: std::collections::HashMap<ItemId, TrackedItem> =
            items.into_iter().map(|i| (i.id, i)).collect();
        let next: Vec<TrackedItem> = guard
            .iter()
            .map(|current| updated.remove(&current.id).unwrap_or_else(|| current.clone()))
            .collect();
        *guard = Arc::new(next);

        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaKind;
    use std::collections::BTreeSet;
    use tempfile::NamedTempFile;

    async fn store() -> (WatchlistStore, NamedTempFile) {
        let file = NamedTempFile::new().unwrap();
        let db = Arc::new(Database::new(file.path()).await.unwrap());
        (WatchlistStore::load(db).await.unwrap(), file)
    }

    fn film(external_id: i64) -> NewItem {
        NewItem {
            external_id,
            title: format!("Film {external_id}"),
            media_kind: MediaKind::Film,
            providers: BTreeSet::new(),
            release_date: None,
        }
    }

    #[tokio::test]
    async fn snapshot_is_isolated_from_later_mutations() {
        let (store, _file) = store().await;
        store.insert(&film(1), None, Utc::now()).await.unwrap();

        let before = store.snapshot().await;
        store.insert(&film(2), None, Utc::now()).await.unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(store.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let (store, _file) = store().await;
        store.insert(&film(1), None, Utc::now()).await.unwrap();

        let err = store.insert(&film(1), None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::Duplicate(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn remove_unknown_is_not_found() {
        let (store, _file) = store().await;
        let err = store.remove(ItemId(42)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn commit_replaces_matching_items_only() {
        let (store, _file) = store().await;
        let a = store.insert(&film(1), None, Utc::now()).await.unwrap();
        let b = store.insert(&film(2), None, Utc::now()).await.unwrap();

        let mut changed = a.clone();
        changed.notified = true;

        // b removed and c added while the pass was running
        store.remove(b.id).await.unwrap();
        let c = store.insert(&film(3), None, Utc::now()).await.unwrap();

        store
            .commit(vec![changed.clone(), b.clone()], &[], Utc::now())
            .await
            .unwrap();

        let snapshot = store.snapshot().await;
        let ids: Vec<ItemId> = snapshot.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
        assert!(snapshot[0].notified);
    }

    #[tokio::test]
    async fn reload_sees_committed_state() {
        let file = NamedTempFile::new().unwrap();
        let db = Arc::new(Database::new(file.path()).await.unwrap());
        let store = WatchlistStore::load(db.clone()).await.unwrap();

        let mut item = store.insert(&film(7), None, Utc::now()).await.unwrap();
        item.notified = true;
        store.commit(vec![item.clone()], &[], Utc::now()).await.unwrap();

        let reloaded = WatchlistStore::load(db).await.unwrap();
        assert!(reloaded.get(item.id).await.unwrap().notified);
    }

    #[tokio::test]
    async fn failed_commit_leaves_memory_untouched() {
        let (store, _file) = store().await;
        let item = store.insert(&film(1), None, Utc::now()).await.unwrap();

        store.db.pool().close().await;

        let mut changed = item.clone();
        changed.notified = true;
        assert!(store.commit(vec![changed], &[], Utc::now()).await.is_err());
        assert!(!store.get(item.id).await.unwrap().notified);
    }
}
