//! Service handle tying the watchlist, reconciliation and delivery together.
//!
//! The `StreamNotifier` struct and its methods are organized by domain:
//! - [`watchlist`] - Adding, removing and listing tracked items
//! - [`passes`] - Reconciliation passes and notification dispatch
//! - [`subscription`] - Push subscription management
//! - [`notifications`] - Notification log access
//! - [`lifecycle`] - Startup and shutdown coordination
//! - [`services`] - Background service starters

mod lifecycle;
mod notifications;
mod passes;
mod services;
mod subscription;
mod watchlist;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::catalog::{SERVICES, ServiceEntry};
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::provider::{ProviderClient, TmdbClient};
use crate::reconcile::ReconciliationEngine;
use crate::sink::{NoOpSink, NotificationSink, RelaySink};
use crate::store::WatchlistStore;
use crate::types::Event;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio_util::sync::CancellationToken;

/// Main service handle
///
/// Cheap to clone; every clone shares the same watchlist, database and event
/// channel. Passes, additions and removals are serialized through a single
/// gate so they never interleave.
#[derive(Clone)]
pub struct StreamNotifier {
    /// Database connection pool
    pub db: Arc<Database>,
    pub(crate) store: Arc<WatchlistStore>,
    pub(crate) engine: Arc<ReconciliationEngine>,
    pub(crate) provider: Arc<dyn ProviderClient>,
    pub(crate) sink: Arc<dyn NotificationSink>,
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    pub(crate) config: Arc<Config>,
    /// Held for the duration of every pass and every watchlist mutation
    pub(crate) pass_gate: Arc<tokio::sync::Mutex<()>>,
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Cancelled on shutdown; background services run on child tokens
    pub(crate) shutdown_token: CancellationToken,
}

impl StreamNotifier {
    /// Create a notifier querying TMDB
    ///
    /// Deliveries go to the configured relay, or are only logged when no relay
    /// is configured.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stream_notifier::{StreamNotifier, Config};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let mut config = Config::default();
    ///     config.provider.api_key = "tmdb-key".into();
    ///     let notifier = StreamNotifier::new(config).await?;
    ///     let report = notifier.check_now().await?;
    ///     println!("{} events", report.events.len());
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let provider: Arc<dyn ProviderClient> = Arc::new(TmdbClient::new(&config.provider)?);

        let sink: Arc<dyn NotificationSink> = match &config.notifications.relay {
            Some(relay) => Arc::new(RelaySink::new(relay)),
            None => Arc::new(NoOpSink),
        };

        Self::with_components(config, provider, sink).await
    }

    /// Create a notifier with explicit provider and sink implementations
    pub async fn with_components(
        config: Config,
        provider: Arc<dyn ProviderClient>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(Database::new(&config.persistence.database_path).await?);

        if db.was_unclean_shutdown().await? {
            tracing::warn!("previous session did not shut down cleanly");
        }
        db.set_clean_start().await?;

        let store = Arc::new(WatchlistStore::load(db.clone()).await?);
        let engine = Arc::new(ReconciliationEngine::new(
            provider.clone(),
            config.reconcile.clone(),
        ));

        // Slow subscribers receive RecvError::Lagged past this many events
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        tracing::info!(
            provider = provider.name(),
            sink = sink.name(),
            items = store.len().await,
            "stream notifier initialized"
        );

        Ok(Self {
            db,
            store,
            engine,
            provider,
            sink,
            event_tx,
            config: Arc::new(config),
            pass_gate: Arc::new(tokio::sync::Mutex::new(())),
            accepting_new: Arc::new(AtomicBool::new(true)),
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Subscribe to service events
    ///
    /// Each subscriber receives every event independently. A subscriber that
    /// falls more than 1000 events behind gets `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Streaming services the notifier can report
    pub fn services(&self) -> &'static [ServiceEntry] {
        &SERVICES
    }

    pub(crate) fn emit(&self, event: Event) {
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }
}
