//! Reconciliation engine
//!
//! One pass re-queries the provider for every tracked item, applies the
//! per-kind transition rule and collects the fired events. Provider failures
//! are confined to their item: the item keeps its last-known state, the error
//! is recorded, and the pass carries on.

pub mod transition;

use crate::config::ReconcileConfig;
use crate::error::ProviderError;
use crate::provider::ProviderClient;
use crate::retry::{attempt_with_timeout, with_retry};
use crate::types::{ItemId, MediaKind, ReconciliationEvent, TrackedItem};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of reconciling a watchlist snapshot
#[derive(Debug, Clone)]
pub struct PassOutcome {
    /// Every input item in input order, updated where a query succeeded
    pub items: Vec<TrackedItem>,
    /// Fired events in input order, at most one per item
    pub events: Vec<ReconciliationEvent>,
    /// Items whose query failed
    pub errors: BTreeMap<ItemId, ProviderError>,
}

/// Applies provider answers to tracked items
pub struct ReconciliationEngine {
    provider: Arc<dyn ProviderClient>,
    config: ReconcileConfig,
}

enum ItemResult {
    Checked(Option<ReconciliationEvent>),
    Skipped,
    Failed(ProviderError),
}

impl ReconciliationEngine {
    /// Create an engine querying `provider`
    pub fn new(provider: Arc<dyn ProviderClient>, config: ReconcileConfig) -> Self {
        Self { provider, config }
    }

    /// Run one pass over `items`
    ///
    /// Queries run with at most `max_concurrent_queries` in flight; results
    /// are consumed in input order so the outcome does not depend on which
    /// query finishes first. `now` supplies both `last_checked` and the date
    /// used for due checks.
    pub async fn reconcile(&self, items: &[TrackedItem], now: DateTime<Utc>) -> PassOutcome {
        let parallelism = self.config.max_concurrent_queries.max(1);

        let results: Vec<(TrackedItem, ItemResult)> = futures::stream::iter(items.iter().cloned())
            .map(|item| self.check_item(item, now))
            .buffered(parallelism)
            .collect()
            .await;

        let mut outcome = PassOutcome {
            items: Vec::with_capacity(results.len()),
            events: Vec::new(),
            errors: BTreeMap::new(),
        };

        for (item, result) in results {
            match result {
                ItemResult::Checked(Some(event)) => outcome.events.push(event),
                ItemResult::Checked(None) | ItemResult::Skipped => {}
                ItemResult::Failed(error) => {
                    outcome.errors.insert(item.id, error);
                }
            }
            outcome.items.push(item);
        }

        outcome
    }

    async fn check_item(&self, mut item: TrackedItem, now: DateTime<Utc>) -> (TrackedItem, ItemResult) {
        let external_id = item.external_id;

        let kind = match item.media_kind {
            MediaKind::Series => {
                match self
                    .query(|| self.provider.next_episode(external_id))
                    .await
                {
                    Ok(fetched) => transition::apply_series(&mut item, fetched, now),
                    Err(error) => return self.failed(item, error),
                }
            }
            MediaKind::Film => {
                if !item.providers.is_empty() {
                    return (item, ItemResult::Skipped);
                }
                match self
                    .query(|| self.provider.availability(external_id, MediaKind::Film))
                    .await
                {
                    Ok(available) => transition::apply_film(&mut item, available, now),
                    Err(error) => return self.failed(item, error),
                }
            }
        };

        let event = kind.map(|kind| {
            let event = ReconciliationEvent::new(&item, kind);
            tracing::info!(
                item_id = %item.id,
                title = %item.title,
                kind = event.kind.tag(),
                "transition fired"
            );
            event
        });

        (item, ItemResult::Checked(event))
    }

    async fn query<T, F, Fut>(&self, mut attempt: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ProviderError>>,
    {
        let timeout = self.config.query_timeout;
        with_retry(&self.config.retry, || attempt_with_timeout(timeout, attempt())).await
    }

    fn failed(&self, item: TrackedItem, error: ProviderError) -> (TrackedItem, ItemResult) {
        tracing::warn!(
            item_id = %item.id,
            provider = self.provider.name(),
            error = %error,
            "provider query failed, keeping last-known state"
        );
        (item, ItemResult::Failed(error))
    }
}
