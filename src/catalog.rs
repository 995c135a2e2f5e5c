//! Static catalog of known streaming services
//!
//! Maps the metadata provider's watch-provider ids onto the locally known
//! [`ServiceId`]s. Provider ids without an entry are not tracked.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Locally known streaming service
///
/// Declaration order is the catalog order used when listing services.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ServiceId {
    /// Netflix
    Netflix,
    /// Amazon Prime Video
    Prime,
    /// Disney+
    Disney,
    /// Apple TV+
    Apple,
    /// BBC iPlayer
    Bbc,
    /// Paramount+
    Paramount,
}

/// Catalog entry for one service
#[derive(Clone, Copy, Debug, Serialize, ToSchema)]
pub struct ServiceEntry {
    /// Local identifier
    pub id: ServiceId,
    /// Display name
    pub name: &'static str,
    /// TMDB watch-provider id
    pub provider_id: u32,
}

/// All known services, catalog order
pub const SERVICES: [ServiceEntry; 6] = [
    ServiceEntry {
        id: ServiceId::Netflix,
        name: "Netflix",
        provider_id: 8,
    },
    ServiceEntry {
        id: ServiceId::Prime,
        name: "Amazon Prime Video",
        provider_id: 9,
    },
    ServiceEntry {
        id: ServiceId::Disney,
        name: "Disney+",
        provider_id: 337,
    },
    ServiceEntry {
        id: ServiceId::Apple,
        name: "Apple TV+",
        provider_id: 350,
    },
    ServiceEntry {
        id: ServiceId::Bbc,
        name: "BBC iPlayer",
        provider_id: 38,
    },
    ServiceEntry {
        id: ServiceId::Paramount,
        name: "Paramount+",
        provider_id: 531,
    },
];

impl ServiceId {
    /// Look up the service for a TMDB watch-provider id
    pub fn from_provider_id(provider_id: u32) -> Option<Self> {
        SERVICES
            .iter()
            .find(|entry| entry.provider_id == provider_id)
            .map(|entry| entry.id)
    }

    /// Display name of the service
    pub fn display_name(&self) -> &'static str {
        self.entry().name
    }

    /// TMDB watch-provider id of the service
    pub fn provider_id(&self) -> u32 {
        self.entry().provider_id
    }

    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::Netflix => "netflix",
            ServiceId::Prime => "prime",
            ServiceId::Disney => "disney",
            ServiceId::Apple => "apple",
            ServiceId::Bbc => "bbc",
            ServiceId::Paramount => "paramount",
        }
    }

    /// Parse the persisted string form
    pub fn parse(value: &str) -> Option<Self> {
        SERVICES
            .iter()
            .map(|entry| entry.id)
            .find(|id| id.as_str() == value)
    }

    fn entry(&self) -> &'static ServiceEntry {
        // SERVICES is declared in enum order
        &SERVICES[*self as usize]
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
