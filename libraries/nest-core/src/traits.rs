/// Collaborator traits consumed by the core
use crate::error::Result;
use crate::types::TrackMetadata;
use async_trait::async_trait;
use std::collections::HashMap;

/// External music catalog
///
/// Lookups are best-effort. Unknown ids are simply absent from the returned
/// map; a failed lookup must never fail a structural operation, callers turn
/// it into "metadata unavailable".
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Resolve display metadata for a batch of external track ids
    ///
    /// # Errors
    /// Returns `UpstreamUnavailable` when the catalog cannot be reached
    async fn lookup(&self, external_track_ids: &[String]) -> Result<HashMap<String, TrackMetadata>>;
}

/// Catalog used when none is configured; resolves nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCatalog;

#[async_trait]
impl TrackCatalog for NoCatalog {
    async fn lookup(&self, _external_track_ids: &[String]) -> Result<HashMap<String, TrackMetadata>> {
        Ok(HashMap::new())
    }
}
