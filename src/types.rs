//! Core types for stream-notifier

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use utoipa::ToSchema;

use crate::catalog::ServiceId;
use crate::error::{DeliveryError, ProviderError};

/// Unique identifier for a tracked item
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    /// Create a new ItemId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for i64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for ItemId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for ItemId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for ItemId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Kind of tracked media; selects the transition rule applied during a pass
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// TV series: watched for newly aired episodes
    #[serde(alias = "tv")]
    Series,
    /// Film: watched for streaming availability
    #[serde(alias = "movie")]
    Film,
}

impl MediaKind {
    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Series => "series",
            MediaKind::Film => "film",
        }
    }

    /// Parse the persisted string form
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "series" | "tv" => Some(MediaKind::Series),
            "film" | "movie" => Some(MediaKind::Film),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next episode scheduled to air for a series
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NextEpisode {
    /// Scheduled air date
    #[schema(value_type = String, format = Date)]
    pub air_date: NaiveDate,
    /// Season number
    pub season_number: u32,
    /// Episode number within the season
    pub episode_number: u32,
    /// Episode name, when announced
    #[serde(default)]
    pub name: Option<String>,
}

impl NextEpisode {
    /// Whether two records describe the same target episode.
    ///
    /// Identity is the compound key `(air_date, episode_number)`; a rename or a
    /// season renumbering alone is not a new target.
    pub fn same_target(&self, other: &NextEpisode) -> bool {
        self.air_date == other.air_date && self.episode_number == other.episode_number
    }

    /// Whether the episode has aired on or before `today`
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.air_date <= today
    }

    /// Short label such as `S2E4`
    pub fn label(&self) -> String {
        format!("S{}E{}", self.season_number, self.episode_number)
    }
}

/// A series or film on the watchlist
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrackedItem {
    /// Locally assigned identifier
    pub id: ItemId,
    /// Identifier in the external catalog (TMDB id)
    pub external_id: i64,
    /// Display title
    pub title: String,
    /// Series or film
    pub media_kind: MediaKind,
    /// Streaming services currently believed to carry the item
    #[schema(value_type = Vec<ServiceId>)]
    pub providers: BTreeSet<ServiceId>,
    /// Target episode (series only)
    pub next_episode: Option<NextEpisode>,
    /// Release date (informational, films)
    #[schema(value_type = Option<String>, format = Date)]
    pub release_date: Option<NaiveDate>,
    /// Whether the current pending transition has already fired
    pub notified: bool,
    /// Last successful reconciliation touching this item
    pub last_checked: DateTime<Utc>,
    /// When the item was added
    pub added_at: DateTime<Utc>,
}

/// Request to add an item to the watchlist
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NewItem {
    /// Identifier in the external catalog (TMDB id)
    pub external_id: i64,
    /// Display title
    pub title: String,
    /// Series or film
    pub media_kind: MediaKind,
    /// Services already known to carry the item (from the search result)
    #[serde(default)]
    #[schema(value_type = Vec<ServiceId>)]
    pub providers: BTreeSet<ServiceId>,
    /// Release date (films)
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub release_date: Option<NaiveDate>,
}

/// User-facing notification payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
}

impl Notification {
    /// Create a notification
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// What kind of transition an event reports
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// The target episode of a series has aired
    NewEpisode {
        /// Season number
        season_number: u32,
        /// Episode number
        episode_number: u32,
        /// Air date
        #[schema(value_type = String, format = Date)]
        air_date: NaiveDate,
    },
    /// A film became available on at least one streaming service
    NowAvailable {
        /// Services now carrying the film, catalog order
        services: Vec<ServiceId>,
    },
}

impl EventKind {
    /// Stable tag used in the notification log
    pub fn tag(&self) -> &'static str {
        match self {
            EventKind::NewEpisode { .. } => "new_episode",
            EventKind::NowAvailable { .. } => "now_available",
        }
    }
}

/// A transition decided during a reconciliation pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReconciliationEvent {
    /// Item the event belongs to
    pub item_id: ItemId,
    /// Item title at the time of the event
    pub title: String,
    /// Transition kind
    #[serde(flatten)]
    pub kind: EventKind,
    /// Message handed to the notification sink
    pub notification: Notification,
}

impl ReconciliationEvent {
    /// Build an event and its user-facing message for `item`
    pub fn new(item: &TrackedItem, kind: EventKind) -> Self {
        let notification = match &kind {
            EventKind::NewEpisode {
                season_number,
                episode_number,
                ..
            } => Notification::new(
                "New Episode Available",
                format!(
                    "{} S{}E{} is now available!",
                    item.title, season_number, episode_number
                ),
            ),
            EventKind::NowAvailable { services } => {
                let names: Vec<&str> = services.iter().map(|s| s.display_name()).collect();
                Notification::new(
                    "Movie Now Available",
                    format!("{} is now available on {}!", item.title, names.join(", ")),
                )
            }
        };

        Self {
            item_id: item.id,
            title: item.title.clone(),
            kind,
            notification,
        }
    }
}

/// What started a reconciliation pass
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PassTrigger {
    /// Periodic timer tick
    Scheduled,
    /// Explicit user request
    Manual,
    /// Run once when the scheduler starts
    Startup,
}

/// A notification that could not be delivered
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryFailure {
    /// Item whose event failed to deliver
    pub item_id: ItemId,
    /// Why delivery failed
    #[schema(value_type = Object)]
    pub error: DeliveryError,
}

/// Result of one reconciliation pass
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PassReport {
    /// What started the pass
    pub trigger: PassTrigger,
    /// When the pass started
    pub started_at: DateTime<Utc>,
    /// When the pass finished
    pub finished_at: DateTime<Utc>,
    /// Number of items on the watchlist during the pass
    pub checked: usize,
    /// Events fired, in watchlist order
    pub events: Vec<ReconciliationEvent>,
    /// Per-item query failures
    #[schema(value_type = Object)]
    pub errors: BTreeMap<ItemId, ProviderError>,
    /// Events whose delivery failed (the event still counts as fired)
    pub delivery_failures: Vec<DeliveryFailure>,
}

/// Browser push subscription the sink delivers to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    /// Push service endpoint URL
    pub endpoint: String,
    /// Expiration time in milliseconds since the epoch, if any
    #[serde(default)]
    pub expiration_time: Option<i64>,
    /// Encryption keys
    #[serde(default)]
    pub keys: Option<PushKeys>,
}

/// Encryption keys of a push subscription
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PushKeys {
    /// Client public key
    pub p256dh: String,
    /// Authentication secret
    pub auth: String,
}

/// Entry in the persisted notification log
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationRecord {
    /// Log entry id
    pub id: i64,
    /// Item the notification was about
    pub item_id: ItemId,
    /// Event tag (`new_episode` or `now_available`)
    pub kind: String,
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
    /// When the event fired
    pub created_at: DateTime<Utc>,
    /// Whether the user dismissed it
    pub dismissed: bool,
}

/// Event broadcast to subscribers
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Item added to the watchlist
    ItemAdded {
        /// Item ID
        id: ItemId,
        /// Item title
        title: String,
    },

    /// Item removed from the watchlist
    ItemRemoved {
        /// Item ID
        id: ItemId,
    },

    /// Reconciliation pass started
    PassStarted {
        /// What started the pass
        trigger: PassTrigger,
    },

    /// Provider query for an item failed (soft failure)
    ItemCheckFailed {
        /// Item ID
        id: ItemId,
        /// Error message
        error: String,
    },

    /// A transition fired
    Notified {
        /// The decided event
        event: ReconciliationEvent,
    },

    /// Delivering a fired event failed
    DeliveryFailed {
        /// Item ID
        id: ItemId,
        /// Error message
        error: String,
    },

    /// Reconciliation pass finished
    PassCompleted {
        /// What started the pass
        trigger: PassTrigger,
        /// Number of events fired
        events: usize,
        /// Number of items whose query failed
        errors: usize,
    },

    /// Push subscription set or cleared
    SubscriptionChanged {
        /// Whether a subscription is now active
        active: bool,
    },

    /// Service is shutting down
    Shutdown,
}
