/// Playlist tree API routes
///
/// Every handler is scoped to the authenticated owner; nodes and tracks of
/// other owners answer 404 exactly like missing ones.
use crate::{
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use nest_core::{
    ContainerItems, ItemRef, MembershipId, NewNode, NodeId, NodeUpdate, PlaylistNode,
    TrackListing, TrackMembership, TreeNode,
};
use nest_engine::{Deleted, Moved, Removed, Reordered};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    #[serde(flatten)]
    pub attrs: NewNode,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
}

/// `parent_id: null` (or absent) moves the node to the root level
#[derive(Debug, Deserialize)]
pub struct ReparentRequest {
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub items: Vec<ItemRef>,
}

#[derive(Debug, Deserialize)]
pub struct AddTrackRequest {
    pub external_track_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveTrackRequest {
    pub target_playlist_id: NodeId,
    pub order: u32,
}

/// GET /api/playlists
/// The caller's whole forest, nested
pub async fn list_playlists(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<TreeNode>>> {
    let tree = app_state.engine.get_tree(auth.owner_id()).await?;
    Ok(Json(tree))
}

/// POST /api/playlists
pub async fn create_playlist(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<PlaylistNode>)> {
    let node = app_state
        .engine
        .create_node(auth.owner_id(), req.parent_id.as_ref(), req.attrs)
        .await?;
    Ok((StatusCode::CREATED, Json(node)))
}

/// GET /api/playlists/:id
pub async fn get_playlist(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<PlaylistNode>> {
    let node = app_state
        .engine
        .get_node(auth.owner_id(), &NodeId::new(id))
        .await?;
    Ok(Json(node))
}

/// PATCH /api/playlists/:id
/// Partial attribute update; structure is never touched here
pub async fn update_playlist(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(update): Json<NodeUpdate>,
) -> Result<Json<PlaylistNode>> {
    if update.is_empty() {
        return Err(ServerError::BadRequest("No attributes to update".to_string()));
    }
    let node = app_state
        .engine
        .update_attributes(auth.owner_id(), &NodeId::new(id), update)
        .await?;
    Ok(Json(node))
}

/// DELETE /api/playlists/:id
/// Removes the node, its whole subtree and every track inside it
pub async fn delete_playlist(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Deleted>> {
    let deleted = app_state
        .engine
        .delete_node(auth.owner_id(), &NodeId::new(id))
        .await?;
    Ok(Json(deleted))
}

/// POST /api/playlists/:id/reparent
pub async fn reparent_playlist(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<ReparentRequest>,
) -> Result<Json<PlaylistNode>> {
    let node = app_state
        .engine
        .reparent_node(
            auth.owner_id(),
            &NodeId::new(id),
            req.parent_id.as_ref(),
            req.order,
        )
        .await?;
    Ok(Json(node))
}

/// GET /api/playlists/:id/tracks
/// Depth-first track listing of the subtree with catalog metadata
pub async fn get_tracks(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<TrackListing>> {
    let listing = app_state
        .engine
        .tracks_with_metadata(auth.owner_id(), &NodeId::new(id))
        .await?;
    Ok(Json(listing))
}

/// GET /api/playlists/:id/items
pub async fn get_items(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<ContainerItems>> {
    let items = app_state
        .engine
        .container_items(auth.owner_id(), &NodeId::new(id))
        .await?;
    Ok(Json(items))
}

/// PATCH /api/playlists/:id/items/reorder
pub async fn reorder_items(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<Reordered>> {
    let reordered = app_state
        .engine
        .reorder_container(auth.owner_id(), &NodeId::new(id), &req.items)
        .await?;
    Ok(Json(reordered))
}

/// POST /api/playlists/:id/tracks
pub async fn add_track(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<AddTrackRequest>,
) -> Result<(StatusCode, Json<TrackMembership>)> {
    let membership = app_state
        .engine
        .add_track(auth.owner_id(), &NodeId::new(id), &req.external_track_id)
        .await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

/// DELETE /api/playlists/:id/tracks/:track_id
pub async fn remove_track(
    Path((id, track_id)): Path<(String, String)>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Removed>> {
    let removed = app_state
        .engine
        .remove_track(
            auth.owner_id(),
            &NodeId::new(id),
            &MembershipId::new(track_id),
        )
        .await?;
    Ok(Json(removed))
}

/// PATCH /api/playlists/:id/tracks/:track_id/move
/// `:id` is the container the caller believes holds the track
pub async fn move_track(
    Path((id, track_id)): Path<(String, String)>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<MoveTrackRequest>,
) -> Result<Json<Moved>> {
    let moved = app_state
        .engine
        .move_track(
            auth.owner_id(),
            &MembershipId::new(track_id),
            &NodeId::new(id),
            &req.target_playlist_id,
            req.order,
        )
        .await?;
    Ok(Json(moved))
}
