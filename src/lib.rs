//! # stream-notifier
//!
//! Watchlist change detection and notification dispatch for TV series and
//! films.
//!
//! A watchlist of tracked items is periodically reconciled against a metadata
//! provider (TMDB). When a tracked series' next episode has aired, or a
//! tracked film shows up on a known streaming service, an event fires exactly
//! once and a notification is handed to the configured delivery sink.
//!
//! ## Design
//!
//! - **Fire once** - a per-item `notified` flag is committed together with the
//!   updated watchlist before anything is delivered
//! - **Failure isolation** - a provider error affects only its own item
//! - **Event-driven** - consumers subscribe to events, no polling required
//! - **Serialized passes** - passes and watchlist edits never interleave
//!
//! ## Quick Start
//!
//! ```no_run
//! use stream_notifier::{Config, StreamNotifier};
//! use stream_notifier::types::{MediaKind, NewItem};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.provider.api_key = "tmdb-api-key".to_string();
//!
//!     let notifier = StreamNotifier::new(config).await?;
//!
//!     let mut events = notifier.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     notifier
//!         .add_item(NewItem {
//!             external_id: 1399,
//!             title: "Game of Thrones".to_string(),
//!             media_kind: MediaKind::Series,
//!             providers: Default::default(),
//!             release_date: None,
//!         })
//!         .await?;
//!
//!     let report = notifier.check_now().await?;
//!     println!("{} notifications", report.events.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Streaming service catalog
pub mod catalog;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Service handle (decomposed into focused submodules)
pub mod notifier;
/// Metadata provider clients
pub mod provider;
/// Reconciliation engine and transition rules
pub mod reconcile;
/// Retry logic with exponential backoff
pub mod retry;
/// Periodic pass scheduling
pub mod scheduler;
/// Notification delivery sinks
pub mod sink;
/// In-memory watchlist store
pub mod store;
/// Core types and events
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use catalog::ServiceId;
pub use config::Config;
pub use db::Database;
pub use error::{
    ApiError, DatabaseError, DeliveryError, Error, ErrorDetail, ProviderError, Result,
    ToHttpStatus,
};
pub use notifier::StreamNotifier;
pub use scheduler::{ReconcileScheduler, SchedulerHandle, TriggerOutcome};
pub use types::{
    Event, EventKind, ItemId, MediaKind, NewItem, NextEpisode, Notification, PassReport,
    PassTrigger, PushSubscription, ReconciliationEvent, TrackedItem,
};

/// Run the notifier as a service until a termination signal arrives.
///
/// Starts the reconcile scheduler and the REST API, then waits for SIGTERM,
/// SIGINT (Ctrl+C on other platforms) or a `POST /shutdown`, and shuts
/// everything down gracefully.
///
/// # Example
///
/// ```no_run
/// use stream_notifier::{StreamNotifier, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let notifier = StreamNotifier::new(config).await?;
///
///     run_with_shutdown(notifier).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(notifier: StreamNotifier) -> Result<()> {
    let scheduler = notifier.start_scheduler();

    let notifier = std::sync::Arc::new(notifier);
    let mut api = tokio::spawn(api::start_api_server(
        notifier.clone(),
        notifier.get_config(),
        notifier.shutdown_token.child_token(),
    ));

    let api_result = tokio::select! {
        _ = wait_for_signal() => None,
        _ = notifier.shutdown_token.cancelled() => {
            tracing::info!("Shutdown requested through the API");
            None
        }
        finished = &mut api => Some(finished),
    };

    let result = notifier.shutdown().await;
    scheduler.stop().await;

    let api_result = match api_result {
        Some(finished) => finished,
        None => api.await,
    };
    match api_result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "API server failed"),
        Err(e) => tracing::error!(error = %e, "API server task panicked"),
    }

    result
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
