//! Metadata provider seam
//!
//! The reconciliation engine reads external state only through
//! [`ProviderClient`]. [`TmdbClient`] is the HTTP implementation; tests plug
//! in scripted fakes.

mod tmdb;

pub use tmdb::TmdbClient;

use crate::catalog::ServiceId;
use crate::error::ProviderError;
use crate::types::{MediaKind, NextEpisode};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Read-only access to the external media catalog
///
/// Both queries are idempotent. Implementations map every failure onto
/// [`ProviderError`]; the caller decides about retries and timeouts.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Next episode scheduled to air for a series, `None` when nothing is announced
    async fn next_episode(&self, external_id: i64) -> Result<Option<NextEpisode>, ProviderError>;

    /// Known streaming services currently carrying the item
    ///
    /// Raw provider ids without a catalog entry are dropped.
    async fn availability(
        &self,
        external_id: i64,
        media_kind: MediaKind,
    ) -> Result<BTreeSet<ServiceId>, ProviderError>;

    /// Human-readable name for logging
    fn name(&self) -> &str;
}
