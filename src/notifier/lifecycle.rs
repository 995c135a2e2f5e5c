//! Startup and shutdown coordination.

use crate::error::Result;
use crate::types::Event;
use std::sync::atomic::Ordering;

use super::StreamNotifier;

/// Longest shutdown waits for an in-flight pass
const SHUTDOWN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

impl StreamNotifier {
    /// Gracefully shut down the notifier
    ///
    /// 1. Stops accepting new passes and watchlist additions
    /// 2. Cancels background services started from this handle
    /// 3. Waits (up to 30 seconds) for an in-flight pass to commit
    /// 4. Marks the clean shutdown in the database
    ///
    /// A second call only waits for the in-flight pass.
    ///
    /// # Errors
    ///
    /// Returns an error only if the clean-shutdown marker cannot be written.
    pub async fn shutdown(&self) -> Result<()> {
        if !self.accepting_new.swap(false, Ordering::SeqCst) {
            let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, self.pass_gate.lock()).await;
            return Ok(());
        }

        tracing::info!("Initiating graceful shutdown");
        self.shutdown_token.cancel();

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.pass_gate.lock()).await {
            Ok(_gate) => tracing::debug!("no pass in flight"),
            Err(_) => tracing::warn!("Timeout waiting for in-flight pass, proceeding with shutdown"),
        }

        self.db.set_clean_shutdown().await?;
        tracing::info!("Marked clean shutdown in database");

        self.emit(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether the notifier still accepts new work
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }
}
