//! Per-item transition rules
//!
//! Pure functions over a [`TrackedItem`] and a fresh provider answer. They
//! mutate the item in place and return the event kind when a transition
//! fires. The `notified` flag guarantees each transition fires at most once.

use crate::catalog::ServiceId;
use crate::types::{EventKind, NextEpisode, TrackedItem};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Apply a series answer
///
/// A fetched episode with a different `(air_date, episode_number)` key becomes
/// the new target and re-arms `notified`; the same key only refreshes the
/// stored record. `None` leaves the stored target alone. Afterwards, a due
/// target that has not fired yet fires now.
pub fn apply_series(
    item: &mut TrackedItem,
    fetched: Option<NextEpisode>,
    now: DateTime<Utc>,
) -> Option<EventKind> {
    if let Some(episode) = fetched {
        let same_target = item
            .next_episode
            .as_ref()
            .is_some_and(|current| current.same_target(&episode));

        if !same_target {
            tracing::debug!(
                item_id = %item.id,
                target = %episode.label(),
                air_date = %episode.air_date,
                "new target episode"
            );
            item.notified = false;
        }
        item.next_episode = Some(episode);
    }

    item.last_checked = now;

    let target = item.next_episode.as_ref()?;
    if item.notified || !target.is_due(now.date_naive()) {
        return None;
    }

    item.notified = true;
    Some(EventKind::NewEpisode {
        season_number: target.season_number,
        episode_number: target.episode_number,
        air_date: target.air_date,
    })
}

/// Apply a film availability answer
///
/// Only meaningful while `providers` is empty; the caller skips films that are
/// already known to be available. A non-empty answer replaces `providers` and
/// fires once.
pub fn apply_film(
    item: &mut TrackedItem,
    available: BTreeSet<ServiceId>,
    now: DateTime<Utc>,
) -> Option<EventKind> {
    item.last_checked = now;

    if available.is_empty() {
        return None;
    }

    item.providers = available;

    if item.notified {
        return None;
    }

    item.notified = true;
    Some(EventKind::NowAvailable {
        services: item.providers.iter().copied().collect(),
    })
}
