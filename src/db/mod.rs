//! Database layer for stream-notifier
//!
//! Handles SQLite persistence for the watchlist, the notification log and
//! runtime state.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`watchlist`] — Tracked item CRUD and pass commits
//! - [`notifications`] — Notification log
//! - [`state`] — Runtime state (shutdown tracking, push subscription)

use crate::catalog::ServiceId;
use crate::error::DatabaseError;
use crate::types::{ItemId, MediaKind, NextEpisode, NotificationRecord, TrackedItem};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};
use std::collections::BTreeSet;

mod migrations;
mod notifications;
mod state;
mod watchlist;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Tracked item record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct TrackedItemRow {
    /// Unique database ID
    pub id: i64,
    /// TMDB id
    pub external_id: i64,
    /// Display title
    pub title: String,
    /// "series" or "film"
    pub media_kind: String,
    /// Comma-separated service ids
    pub providers: String,
    /// Next episode air date (YYYY-MM-DD)
    pub next_air_date: Option<String>,
    /// Next episode season number
    pub next_season: Option<i64>,
    /// Next episode number
    pub next_episode: Option<i64>,
    /// Next episode name
    pub next_name: Option<String>,
    /// Release date (YYYY-MM-DD)
    pub release_date: Option<String>,
    /// 0 = pending, 1 = fired
    pub notified: i32,
    /// Unix timestamp in milliseconds
    pub last_checked: i64,
    /// Unix timestamp in milliseconds
    pub added_at: i64,
}

impl TryFrom<TrackedItemRow> for TrackedItem {
    type Error = DatabaseError;

    fn try_from(row: TrackedItemRow) -> Result<Self, Self::Error> {
        let media_kind = MediaKind::parse(&row.media_kind).ok_or_else(|| {
            DatabaseError::CorruptRow(format!(
                "item {}: unknown media kind '{}'",
                row.id, row.media_kind
            ))
        })?;

        let next_episode = match (row.next_air_date, row.next_season, row.next_episode) {
            (Some(air_date), Some(season), Some(episode)) => Some(NextEpisode {
                air_date: parse_date(row.id, &air_date)?,
                season_number: season as u32,
                episode_number: episode as u32,
                name: row.next_name,
            }),
            _ => None,
        };

        let release_date = row
            .release_date
            .map(|d| parse_date(row.id, &d))
            .transpose()?;

        Ok(TrackedItem {
            id: ItemId(row.id),
            external_id: row.external_id,
            title: row.title,
            media_kind,
            providers: decode_providers(&row.providers),
            next_episode,
            release_date,
            notified: row.notified != 0,
            last_checked: from_millis(row.last_checked),
            added_at: from_millis(row.added_at),
        })
    }
}

/// Notification log record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    /// Unique database ID
    pub id: i64,
    /// Item the notification was about
    pub item_id: i64,
    /// Event tag
    pub kind: String,
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
    /// 0 = visible, 1 = dismissed
    pub dismissed: i32,
}

impl From<NotificationRow> for NotificationRecord {
    fn from(row: NotificationRow) -> Self {
        NotificationRecord {
            id: row.id,
            item_id: ItemId(row.item_id),
            kind: row.kind,
            title: row.title,
            body: row.body,
            created_at: from_millis(row.created_at),
            dismissed: row.dismissed != 0,
        }
    }
}

/// Database handle for stream-notifier
pub struct Database {
    pool: SqlitePool,
}

fn parse_date(id: i64, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| DatabaseError::CorruptRow(format!("item {}: date '{}': {}", id, value, e)))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// Unknown ids are skipped so a catalog change never makes a row unreadable
fn decode_providers(value: &str) -> BTreeSet<ServiceId> {
    value
        .split(',')
        .filter(|s| !s.is_empty())
        .filter_map(ServiceId::parse)
        .collect()
}

fn encode_providers(providers: &BTreeSet<ServiceId>) -> String {
    providers
        .iter()
        .map(ServiceId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
