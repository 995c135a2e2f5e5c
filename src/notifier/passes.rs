//! Reconciliation passes and notification dispatch.

use crate::error::{Error, Result};
use crate::types::{
    DeliveryFailure, Event, PassReport, PassTrigger, PushSubscription, ReconciliationEvent,
};
use chrono::Utc;
use std::sync::atomic::Ordering;

use super::StreamNotifier;

impl StreamNotifier {
    /// Run one reconciliation pass over the whole watchlist
    ///
    /// Waits for any pass or watchlist mutation already in progress. The
    /// updated watchlist and the fired events are committed together before
    /// anything is delivered, so a crash after the commit can lose a delivery
    /// but never re-fire an event.
    ///
    /// # Errors
    ///
    /// Provider failures are per-item and end up in [`PassReport::errors`].
    /// The pass itself fails only when shutdown has begun or the commit
    /// fails; in the latter case nothing is delivered and the stored
    /// watchlist is unchanged.
    pub async fn run_pass(&self, trigger: PassTrigger) -> Result<PassReport> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let _gate = self.pass_gate.lock().await;

        let started_at = Utc::now();
        tracing::info!(?trigger, "reconciliation pass started");
        self.emit(Event::PassStarted { trigger });

        let snapshot = self.store.snapshot().await;
        let outcome = self.engine.reconcile(&snapshot, started_at).await;

        for (id, error) in &outcome.errors {
            self.emit(Event::ItemCheckFailed {
                id: *id,
                error: error.to_string(),
            });
        }

        let events = outcome.events;
        if let Err(e) = self.store.commit(outcome.items, &events, started_at).await {
            tracing::error!(
                ?trigger,
                error = %e,
                "failed to commit pass, no notifications sent"
            );
            return Err(e);
        }

        for event in &events {
            self.emit(Event::Notified {
                event: event.clone(),
            });
        }

        let delivery_failures = self.dispatch(&events).await;

        let report = PassReport {
            trigger,
            started_at,
            finished_at: Utc::now(),
            checked: snapshot.len(),
            events,
            errors: outcome.errors,
            delivery_failures,
        };

        tracing::info!(
            ?trigger,
            checked = report.checked,
            events = report.events.len(),
            errors = report.errors.len(),
            delivery_failures = report.delivery_failures.len(),
            "reconciliation pass completed"
        );

        self.emit(Event::PassCompleted {
            trigger,
            events: report.events.len(),
            errors: report.errors.len(),
        });

        Ok(report)
    }

    /// Run a pass right now on behalf of the user
    pub async fn check_now(&self) -> Result<PassReport> {
        self.run_pass(PassTrigger::Manual).await
    }

    /// Hand every fired event to the sink
    ///
    /// Deliveries run concurrently and are never retried. Without a stored
    /// subscription the events stay in the notification log only.
    async fn dispatch(&self, events: &[ReconciliationEvent]) -> Vec<DeliveryFailure> {
        if events.is_empty() {
            return Vec::new();
        }

        let subscription = match self.db.get_push_subscription().await {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                tracing::debug!(
                    events = events.len(),
                    "no push subscription, notifications kept in log only"
                );
                return Vec::new();
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load push subscription, skipping delivery");
                return Vec::new();
            }
        };

        let deliveries = events
            .iter()
            .map(|event| self.deliver_one(&subscription, event));
        let failures: Vec<DeliveryFailure> = futures::future::join_all(deliveries)
            .await
            .into_iter()
            .flatten()
            .collect();

        for failure in &failures {
            self.emit(Event::DeliveryFailed {
                id: failure.item_id,
                error: failure.error.to_string(),
            });
        }

        failures
    }

    async fn deliver_one(
        &self,
        subscription: &PushSubscription,
        event: &ReconciliationEvent,
    ) -> Option<DeliveryFailure> {
        match self.sink.deliver(subscription, &event.notification).await {
            Ok(()) => {
                tracing::debug!(item_id = %event.item_id, sink = self.sink.name(), "notification delivered");
                None
            }
            Err(error) => {
                tracing::warn!(
                    item_id = %event.item_id,
                    sink = self.sink.name(),
                    error = %error,
                    "notification delivery failed"
                );
                Some(DeliveryFailure {
                    item_id: event.item_id,
                    error,
                })
            }
        }
    }
}
