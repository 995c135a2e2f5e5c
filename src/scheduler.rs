//! Periodic reconciliation scheduling
//!
//! A single background task runs passes on a fixed interval and on demand.
//! Passes never overlap: the task awaits each pass before looking at the next
//! tick or trigger. Manual triggers go through a one-slot channel, so a burst
//! of triggers while a pass is running collapses into one follow-up pass.
//!
//! # Example
//!
//! ```no_run
//! use stream_notifier::{StreamNotifier, Config};
//! use stream_notifier::scheduler::{ReconcileScheduler, TriggerOutcome};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let notifier = Arc::new(StreamNotifier::new(config.clone()).await?);
//!
//! let handle = ReconcileScheduler::new(notifier, &config.reconcile)
//!     .start(CancellationToken::new());
//!
//! assert_eq!(handle.trigger_now(), TriggerOutcome::Queued);
//! handle.stop().await;
//! # Ok(())
//! # }
//! ```

use crate::config::ReconcileConfig;
use crate::error::Result;
use crate::types::{PassReport, PassTrigger};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Something that can run a reconciliation pass
#[async_trait]
pub trait PassRunner: Send + Sync + 'static {
    /// Run one pass to completion
    async fn run_pass(&self, trigger: PassTrigger) -> Result<PassReport>;
}

#[async_trait]
impl PassRunner for crate::StreamNotifier {
    async fn run_pass(&self, trigger: PassTrigger) -> Result<PassReport> {
        crate::StreamNotifier::run_pass(self, trigger).await
    }
}

/// What happened to a manual trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A pass will run as soon as the scheduler is free
    Queued,
    /// A pass was already queued; this trigger folds into it
    Coalesced,
    /// The scheduler has stopped
    Stopped,
}

/// Periodic pass scheduler
pub struct ReconcileScheduler {
    runner: Arc<dyn PassRunner>,
    interval: Duration,
    run_on_startup: bool,
}

impl ReconcileScheduler {
    /// Creates a scheduler driving `runner` per `config`
    pub fn new(runner: Arc<dyn PassRunner>, config: &ReconcileConfig) -> Self {
        Self {
            runner,
            interval: config.check_interval,
            run_on_startup: config.check_on_startup,
        }
    }

    /// Spawn the scheduler task
    ///
    /// The task stops when `cancel` fires or [`SchedulerHandle::stop`] is
    /// called. A pass that is already running is allowed to finish.
    pub fn start(self, cancel: CancellationToken) -> SchedulerHandle {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let task = tokio::spawn(self.run(trigger_rx, cancel.clone()));

        SchedulerHandle {
            trigger_tx,
            cancel,
            task: tokio::sync::Mutex::new(Some(task)),
        }
    }

    async fn run(self, mut trigger_rx: mpsc::Receiver<()>, cancel: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            run_on_startup = self.run_on_startup,
            "reconcile scheduler started"
        );

        if self.run_on_startup && !cancel.is_cancelled() {
            self.execute(PassTrigger::Startup).await;
        }

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let trigger = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(()) = trigger_rx.recv() => PassTrigger::Manual,
                _ = ticker.tick() => PassTrigger::Scheduled,
            };

            self.execute(trigger).await;
        }

        info!("reconcile scheduler stopped");
    }

    async fn execute(&self, trigger: PassTrigger) {
        debug!(?trigger, "scheduler running pass");
        if let Err(e) = self.runner.run_pass(trigger).await {
            error!(?trigger, error = %e, "scheduled pass failed");
        }
    }
}

/// Control handle for a running [`ReconcileScheduler`]
pub struct SchedulerHandle {
    trigger_tx: mpsc::Sender<()>,
    cancel: CancellationToken,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SchedulerHandle {
    /// Ask for a pass as soon as possible
    pub fn trigger_now(&self) -> TriggerOutcome {
        match self.trigger_tx.try_send(()) {
            Ok(()) => TriggerOutcome::Queued,
            Err(TrySendError::Full(())) => TriggerOutcome::Coalesced,
            Err(TrySendError::Closed(())) => TriggerOutcome::Stopped,
        }
    }

    /// Whether the scheduler task is still running
    pub fn is_running(&self) -> bool {
        !self.trigger_tx.is_closed()
    }

    /// Stop the scheduler and wait for its task to exit
    ///
    /// An in-flight pass runs to completion first. Calling this twice is fine.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let task = self.task.lock().await.take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            error!(error = %e, "reconcile scheduler task panicked");
        }
    }
}
