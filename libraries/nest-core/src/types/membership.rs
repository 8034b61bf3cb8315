/// Track membership domain types
use crate::types::{MembershipId, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One occurrence of an external track inside a playlist node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMembership {
    /// Unique membership identifier
    pub id: MembershipId,

    /// Node that directly contains this track
    pub playlist_id: NodeId,

    /// Track reference in the external catalog
    pub external_track_id: String,

    /// Position among the items of the containing node
    pub order: u32,

    /// When the track was added (immutable)
    pub added_at: DateTime<Utc>,
}

impl TrackMembership {
    /// Create a new membership at the given position
    pub fn new(playlist_id: NodeId, external_track_id: impl Into<String>, order: u32) -> Self {
        Self {
            id: MembershipId::generate(),
            playlist_id,
            external_track_id: external_track_id.into(),
            order,
            added_at: Utc::now(),
        }
    }
}

/// A membership produced by linearization, tagged with its direct owner's name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearizedTrack {
    #[serde(flatten)]
    pub membership: TrackMembership,

    /// Name of the node that directly owns the membership
    pub source_container_name: String,
}

/// Display metadata from the external catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub external_track_id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub duration_ms: u64,
    pub image_url: Option<String>,
    pub preview_url: Option<String>,
}

/// A linearized track with optional catalog metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedTrack {
    #[serde(flatten)]
    pub track: LinearizedTrack,

    /// `None` when the catalog did not resolve this track
    pub metadata: Option<TrackMetadata>,
}

/// Linearized tracks of a subtree, enriched for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackListing {
    pub tracks: Vec<EnrichedTrack>,

    /// Set when the catalog could not be reached
    pub metadata_unavailable: bool,
}
