//! Shared fakes for unit tests

use crate::catalog::ServiceId;
use crate::config::{Config, RetryConfig};
use crate::error::{DeliveryError, ProviderError};
use crate::notifier::StreamNotifier;
use crate::provider::ProviderClient;
use crate::sink::NotificationSink;
use crate::types::{MediaKind, NextEpisode, Notification, PushSubscription};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

type EpisodeAnswer = Result<Option<NextEpisode>, ProviderError>;
type AvailabilityAnswer = Result<BTreeSet<ServiceId>, ProviderError>;

/// Provider whose answers are scripted per external id
///
/// Unscripted ids answer "nothing announced" and "not available".
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    episodes: Mutex<HashMap<i64, EpisodeAnswer>>,
    availability: Mutex<HashMap<i64, AvailabilityAnswer>>,
    calls: Mutex<HashMap<i64, u32>>,
    delays: Mutex<HashMap<i64, Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn set_episode(&self, external_id: i64, episode: Option<NextEpisode>) {
        self.episodes.lock().unwrap().insert(external_id, Ok(episode));
    }

    pub(crate) fn fail_episode(&self, external_id: i64, error: ProviderError) {
        self.episodes.lock().unwrap().insert(external_id, Err(error));
    }

    pub(crate) fn set_availability(&self, external_id: i64, services: &[ServiceId]) {
        self.availability
            .lock()
            .unwrap()
            .insert(external_id, Ok(services.iter().copied().collect()));
    }

    pub(crate) fn fail_availability(&self, external_id: i64, error: ProviderError) {
        self.availability.lock().unwrap().insert(external_id, Err(error));
    }

    pub(crate) fn set_delay(&self, external_id: i64, delay: Duration) {
        self.delays.lock().unwrap().insert(external_id, delay);
    }

    pub(crate) fn calls(&self, external_id: i64) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(&external_id)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, external_id: i64) {
        *self.calls.lock().unwrap().entry(external_id).or_insert(0) += 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().get(&external_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    async fn next_episode(&self, external_id: i64) -> EpisodeAnswer {
        self.enter(external_id).await;
        let answer = self
            .episodes
            .lock()
            .unwrap()
            .get(&external_id)
            .cloned()
            .unwrap_or(Ok(None));
        self.leave();
        answer
    }

    async fn availability(&self, external_id: i64, _media_kind: MediaKind) -> AvailabilityAnswer {
        self.enter(external_id).await;
        let answer = self
            .availability
            .lock()
            .unwrap()
            .get(&external_id)
            .cloned()
            .unwrap_or_else(|| Ok(BTreeSet::new()));
        self.leave();
        answer
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Sink that records deliveries and can be told to reject some
#[derive(Default)]
pub(crate) struct RecordingSink {
    delivered: Mutex<Vec<(PushSubscription, Notification)>>,
    reject_containing: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reject every notification whose body contains `needle`
    pub(crate) fn reject_when_body_contains(&self, needle: &str) {
        self.reject_containing.lock().unwrap().push(needle.to_string());
    }

    pub(crate) fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(_, n)| n.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        notification: &Notification,
    ) -> Result<(), DeliveryError> {
        let rejected = self
            .reject_containing
            .lock()
            .unwrap()
            .iter()
            .any(|needle| notification.body.contains(needle));
        if rejected {
            return Err(DeliveryError::Rejected {
                status: 410,
                body: "subscription expired".into(),
            });
        }

        self.delivered
            .lock()
            .unwrap()
            .push((subscription.clone(), notification.clone()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Config with fast retries and a database inside `dir`
pub(crate) fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.path().join("test.db");
    config.reconcile.query_timeout = Duration::from_secs(2);
    config.reconcile.retry = RetryConfig {
        max_attempts: 0,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    config
}

pub(crate) fn test_subscription() -> PushSubscription {
    PushSubscription {
        endpoint: "https://push.example.com/send/test".into(),
        expiration_time: None,
        keys: None,
    }
}

/// Notifier wired to a scripted provider and recording sink
pub(crate) async fn create_test_notifier() -> (
    StreamNotifier,
    Arc<ScriptedProvider>,
    Arc<RecordingSink>,
    TempDir,
) {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new();
    let sink = RecordingSink::new();
    let notifier = StreamNotifier::with_components(test_config(&dir), provider.clone(), sink.clone())
        .await
        .unwrap();
    (notifier, provider, sink, dir)
}
