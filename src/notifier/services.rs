//! Background service starters.

use crate::scheduler::{ReconcileScheduler, SchedulerHandle};
use std::sync::Arc;

use super::StreamNotifier;

impl StreamNotifier {
    /// Start the periodic reconciliation scheduler
    ///
    /// The scheduler stops on its own when [`StreamNotifier::shutdown`] runs.
    pub fn start_scheduler(&self) -> SchedulerHandle {
        let scheduler = ReconcileScheduler::new(Arc::new(self.clone()), &self.config.reconcile);
        let handle = scheduler.start(self.shutdown_token.child_token());

        tracing::info!(
            interval_secs = self.config.reconcile.check_interval.as_secs(),
            "reconcile scheduler background task started"
        );

        handle
    }
}
