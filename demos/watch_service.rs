//! Watch service example
//!
//! Runs stream-notifier as a long-lived service: periodic reconciliation,
//! the REST API, and a log line for every event.
//!
//! ```text
//! TMDB_API_KEY=... cargo run --example watch_service
//! RUST_LOG=stream_notifier=debug TMDB_API_KEY=... cargo run --example watch_service
//! ```
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:6790/swagger-ui
//! - Track a series via POST http://localhost:6790/watchlist
//! - Force a check via POST http://localhost:6790/check
//! - Stream events via GET http://localhost:6790/events
//!
//! Set `RELAY_URL` to forward notifications to a push relay.

use std::time::Duration;
use stream_notifier::config::RelayConfig;
use stream_notifier::{Config, Event, StreamNotifier, run_with_shutdown};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = Config::default();
    config.provider.api_key = std::env::var("TMDB_API_KEY")
        .map_err(|_| "set TMDB_API_KEY to your TMDB v3 API key")?;
    config.reconcile.check_on_startup = true;
    config.reconcile.check_interval = Duration::from_secs(15 * 60);

    if let Ok(url) = std::env::var("RELAY_URL") {
        config.notifications.relay = Some(RelayConfig {
            url,
            auth_header: std::env::var("RELAY_AUTH").ok(),
            timeout: Duration::from_secs(10),
        });
    }

    let notifier = StreamNotifier::new(config).await?;

    let mut events = notifier.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Notified { event } => {
                    println!("🔔 {}: {}", event.notification.title, event.notification.body);
                }
                Event::PassCompleted { events, errors, .. } => {
                    println!("✅ pass finished: {events} notifications, {errors} failed checks");
                }
                Event::Shutdown => break,
                _ => {}
            }
        }
    });

    println!("📺 stream-notifier watching {} items", notifier.list_items().await.len());
    println!("📖 Swagger UI: http://localhost:6790/swagger-ui");
    println!();
    println!("  # Track a series");
    println!("  curl -X POST http://localhost:6790/watchlist \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"external_id\": 1399, \"title\": \"Game of Thrones\", \"media_kind\": \"series\"}}'");
    println!();

    run_with_shutdown(notifier).await?;
    Ok(())
}
