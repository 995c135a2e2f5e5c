//! End-to-end pass against mocked TMDB and push relay servers

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use std::time::Duration;
use stream_notifier::config::RelayConfig;
use stream_notifier::{
    Config, Event, EventKind, MediaKind, NewItem, PushSubscription, ServiceId, StreamNotifier,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    notifier: StreamNotifier,
    tmdb: MockServer,
    relay: MockServer,
    _dir: TempDir,
}

async fn harness() -> Harness {
    let tmdb = MockServer::start().await;
    let relay = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.provider.api_key = "test-key".into();
    config.provider.base_url = format!("{}/3", tmdb.uri());
    config.persistence.database_path = dir.path().join("notifier.db");
    config.reconcile.retry.initial_delay = Duration::from_millis(10);
    config.reconcile.retry.jitter = false;
    config.notifications.relay = Some(RelayConfig {
        url: format!("{}/api/notifications", relay.uri()),
        auth_header: None,
        timeout: Duration::from_secs(2),
    });

    Mock::given(method("POST"))
        .and(path("/api/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": true })))
        .mount(&relay)
        .await;

    let notifier = StreamNotifier::new(config).await.unwrap();
    Harness {
        notifier,
        tmdb,
        relay,
        _dir: dir,
    }
}

fn subscription() -> PushSubscription {
    PushSubscription {
        endpoint: "https://push.example.com/send/device-1".into(),
        expiration_time: None,
        keys: None,
    }
}

#[tokio::test]
async fn due_episode_and_new_availability_reach_the_relay() {
    let h = harness().await;
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();

    Mock::given(method("GET"))
        .and(path("/3/tv/1399"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1399,
            "next_episode_to_air": {
                "air_date": today,
                "season_number": 8,
                "episode_number": 3,
                "name": "The Long Night"
            }
        })))
        .mount(&h.tmdb)
        .await;
    Mock::given(method("GET"))
        .and(path("/3/movie/603/watch/providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 603,
            "results": { "GB": { "flatrate": [ { "provider_id": 8 } ] } }
        })))
        .mount(&h.tmdb)
        .await;

    let mut events = h.notifier.subscribe();

    let series = h
        .notifier
        .add_item(NewItem {
            external_id: 1399,
            title: "Game of Thrones".into(),
            media_kind: MediaKind::Series,
            providers: Default::default(),
            release_date: None,
        })
        .await
        .unwrap();
    assert_eq!(series.next_episode.as_ref().unwrap().episode_number, 3);

    h.notifier
        .add_item(NewItem {
            external_id: 603,
            title: "The Matrix".into(),
            media_kind: MediaKind::Film,
            providers: Default::default(),
            release_date: None,
        })
        .await
        .unwrap();

    let confirmation_error = h.notifier.set_subscription(subscription()).await.unwrap();
    assert!(confirmation_error.is_none());

    let report = h.notifier.check_now().await.unwrap();
    assert_eq!(report.checked, 2);
    assert!(report.errors.is_empty());
    assert!(report.delivery_failures.is_empty());
    assert_eq!(report.events.len(), 2);
    assert!(matches!(
        report.events[0].kind,
        EventKind::NewEpisode { season_number: 8, episode_number: 3, .. }
    ));
    assert_eq!(
        report.events[1].kind,
        EventKind::NowAvailable {
            services: vec![ServiceId::Netflix]
        }
    );

    // confirmation plus one delivery per event
    assert_eq!(h.relay.received_requests().await.unwrap().len(), 3);

    let log = h.notifier.list_notifications(false, 50).await.unwrap();
    assert_eq!(log.len(), 2);

    let notified = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|e| matches!(e, Event::Notified { .. }))
        .count();
    assert_eq!(notified, 2);

    // Nothing changed upstream, so a second pass stays quiet
    let again = h.notifier.check_now().await.unwrap();
    assert!(again.events.is_empty());
    assert_eq!(h.relay.received_requests().await.unwrap().len(), 3);

    h.notifier.shutdown().await.unwrap();
}

#[tokio::test]
async fn provider_outage_is_reported_per_item() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/3/tv/42"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.tmdb)
        .await;

    let item = h
        .notifier
        .add_item(NewItem {
            external_id: 42,
            title: "Flaky Show".into(),
            media_kind: MediaKind::Series,
            providers: Default::default(),
            release_date: None,
        })
        .await
        .unwrap();
    assert!(item.next_episode.is_none());

    let report = h.notifier.check_now().await.unwrap();
    assert!(report.events.is_empty());
    assert!(report.errors.contains_key(&item.id));
    assert!(h.relay.received_requests().await.unwrap().is_empty());

    h.notifier.shutdown().await.unwrap();
}
