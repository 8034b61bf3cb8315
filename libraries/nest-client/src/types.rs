//! Types for Nest server API requests and responses.

use nest_core::{ItemRef, NewNode, NodeId};
use serde::{Deserialize, Serialize};

/// Configuration for connecting to a Nest server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the server (e.g., "https://nest.example.com")
    pub url: String,
    /// Bearer token identifying the owner
    pub access_token: Option<String>,
}

impl ClientConfig {
    /// Create a new config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
        }
    }

    /// Create a config with an existing token.
    pub fn with_token(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: Some(access_token.into()),
        }
    }
}

/// Health endpoint payload.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body for `POST /playlists`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistRequest {
    #[serde(flatten)]
    pub attrs: NewNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
}

/// Body for `POST /playlists/:id/reparent`.
#[derive(Debug, Clone, Serialize)]
pub struct ReparentRequest {
    pub parent_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

/// Body for `PATCH /playlists/:id/items/reorder`.
#[derive(Debug, Clone, Serialize)]
pub struct ReorderRequest {
    pub items: Vec<ItemRef>,
}

/// Body for `POST /playlists/:id/tracks`.
#[derive(Debug, Clone, Serialize)]
pub struct AddTrackRequest {
    pub external_track_id: String,
}

/// Body for `PATCH /playlists/:id/tracks/:track_id/move`.
#[derive(Debug, Clone, Serialize)]
pub struct MoveTrackRequest {
    pub target_playlist_id: NodeId,
    pub order: u32,
}

/// Acknowledgement of a cascading delete.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    #[serde(default)]
    pub removed_nodes: usize,
    #[serde(default)]
    pub removed_tracks: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReorderResponse {
    pub reordered: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MoveResponse {
    pub moved: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RemoveResponse {
    pub removed: bool,
}
