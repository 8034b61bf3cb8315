//! The Mutation Engine
//!
//! Every write follows the same shape: take the owner's lock, load the forest,
//! run guard checks against the state as loaded, mutate a working copy, and
//! commit the diff as one change set. Reads never take the lock.

use crate::locks::OwnerLocks;
use nest_core::guard;
use nest_core::{
    linearize, ChangeSet, ContainerItems, EnrichedTrack, Expectation, Forest, ItemRef,
    LinearizedTrack, MembershipId, NestError, NewNode, NodeId, NodeStore, NodeUpdate, OwnerId,
    PlaylistNode, Result, TrackCatalog, TrackListing, TrackMembership, TreeNode,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Result of a cascading delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub deleted: bool,
    /// Nodes removed, the target included
    pub removed_nodes: usize,
    /// Track memberships removed with them
    pub removed_tracks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reordered {
    pub reordered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moved {
    pub moved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removed {
    pub removed: bool,
}

/// Owner-scoped operations over playlist forests
pub struct MutationEngine {
    store: Arc<dyn NodeStore>,
    catalog: Arc<dyn TrackCatalog>,
    locks: OwnerLocks,
}

impl MutationEngine {
    pub fn new(store: Arc<dyn NodeStore>, catalog: Arc<dyn TrackCatalog>) -> Self {
        Self {
            store,
            catalog,
            locks: OwnerLocks::new(),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// The owner's forest, nested, children sorted by order
    pub async fn get_tree(&self, owner: &OwnerId) -> Result<Vec<TreeNode>> {
        let forest = self.store.load_forest(owner).await?;
        Ok(forest.tree())
    }

    pub async fn get_node(&self, owner: &OwnerId, id: &NodeId) -> Result<PlaylistNode> {
        self.store
            .get_node(owner, id)
            .await?
            .ok_or_else(|| NestError::node_not_found(id))
    }

    /// Every track under `id`, depth-first, tagged with its direct container's name
    pub async fn linearized_tracks(
        &self,
        owner: &OwnerId,
        id: &NodeId,
    ) -> Result<Vec<LinearizedTrack>> {
        let subtree = self.subtree(owner, id).await?;
        linearize(&subtree, id)
    }

    /// Ordered items of `id` and of every container below it
    pub async fn container_items(&self, owner: &OwnerId, id: &NodeId) -> Result<ContainerItems> {
        let subtree = self.subtree(owner, id).await?;
        subtree.container_items(id)
    }

    /// Linearized tracks enriched from the catalog
    ///
    /// A catalog failure never fails the call; tracks come back without
    /// metadata and the listing is flagged.
    pub async fn tracks_with_metadata(&self, owner: &OwnerId, id: &NodeId) -> Result<TrackListing> {
        let tracks = self.linearized_tracks(owner, id).await?;

        let mut seen = HashSet::new();
        let external_ids: Vec<String> = tracks
            .iter()
            .map(|t| t.membership.external_track_id.clone())
            .filter(|ext| seen.insert(ext.clone()))
            .collect();

        let (metadata, metadata_unavailable) = if external_ids.is_empty() {
            (Default::default(), false)
        } else {
            match self.catalog.lookup(&external_ids).await {
                Ok(found) => (found, false),
                Err(e) => {
                    tracing::warn!(node = %id, error = %e, "catalog lookup failed, serving tracks without metadata");
                    (Default::default(), true)
                }
            }
        };

        let tracks = tracks
            .into_iter()
            .map(|track| {
                let metadata = metadata
                    .get(&track.membership.external_track_id)
                    .cloned();
                EnrichedTrack { track, metadata }
            })
            .collect();

        Ok(TrackListing {
            tracks,
            metadata_unavailable,
        })
    }

    async fn subtree(&self, owner: &OwnerId, id: &NodeId) -> Result<Forest> {
        self.store
            .load_subtree(owner, id)
            .await?
            .ok_or_else(|| NestError::node_not_found(id))
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Run `edit` against a working copy of the owner's forest and commit the diff
    async fn mutate<T>(
        &self,
        owner: &OwnerId,
        edit: impl FnOnce(&mut Forest, &mut Vec<Expectation>) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.locks.acquire(owner).await;

        let before = self.store.load_forest(owner).await?;
        let mut after = before.clone();
        let mut expectations = Vec::new();
        let value = edit(&mut after, &mut expectations)?;

        let mut changes: ChangeSet = after.changes_since(&before);
        changes.expectations = expectations;
        tracing::debug!(owner = %owner, writes = changes.len(), "committing change set");
        self.store.apply(owner, &changes).await?;

        Ok(value)
    }

    /// Create a node appended to `parent` (or to the root level)
    pub async fn create_node(
        &self,
        owner: &OwnerId,
        parent: Option<&NodeId>,
        attrs: NewNode,
    ) -> Result<PlaylistNode> {
        guard::validate_name(&attrs.name)?;

        let node = self
            .mutate(owner, |forest, _| {
                if let Some(parent) = parent {
                    forest.require_node(parent)?;
                }
                let order = guard::next_order(forest, parent)?;
                let node = PlaylistNode::new(owner.clone(), parent.cloned(), order, attrs);
                forest.insert_node(node.clone());
                Ok(node)
            })
            .await?;

        tracing::info!(owner = %owner, node = %node.id, order = node.order, "playlist created");
        Ok(node)
    }

    pub async fn rename_node(
        &self,
        owner: &OwnerId,
        id: &NodeId,
        name: &str,
    ) -> Result<PlaylistNode> {
        self.update_attributes(owner, id, NodeUpdate::rename(name))
            .await
    }

    /// Apply a partial attribute update; structure is never touched
    pub async fn update_attributes(
        &self,
        owner: &OwnerId,
        id: &NodeId,
        update: NodeUpdate,
    ) -> Result<PlaylistNode> {
        if let Some(name) = &update.name {
            guard::validate_name(name)?;
        }

        self.mutate(owner, |forest, _| {
            let node = forest
                .node_mut(id)
                .ok_or_else(|| NestError::node_not_found(id))?;
            node.apply_update(update);
            Ok(node.clone())
        })
        .await
    }

    /// Move a node under `new_parent` (`None` = root level)
    ///
    /// Placed at `explicit_order` when given (clamped to the end), appended
    /// otherwise. Both containers are renumbered.
    pub async fn reparent_node(
        &self,
        owner: &OwnerId,
        id: &NodeId,
        new_parent: Option<&NodeId>,
        explicit_order: Option<u32>,
    ) -> Result<PlaylistNode> {
        let node = self
            .mutate(owner, |forest, expectations| {
                let old_parent = forest.require_node(id)?.parent_id.clone();
                if let Some(parent) = new_parent {
                    forest.require_node(parent)?;
                }
                if let Err(e) = guard::check_reparent(forest, id, new_parent) {
                    tracing::info!(owner = %owner, node = %id, "reparent rejected: would create a cycle");
                    return Err(e);
                }

                expectations.push(Expectation::NodeUnder {
                    id: id.clone(),
                    parent_id: old_parent,
                });
                if let Some(parent) = new_parent {
                    expectations.push(Expectation::NodeUnder {
                        id: parent.clone(),
                        parent_id: forest.require_node(parent)?.parent_id.clone(),
                    });
                }

                let index = explicit_order.map(|o| o as usize);
                forest.relocate(&ItemRef::Node(id.clone()), new_parent, index)?;
                let node = forest
                    .node_mut(id)
                    .ok_or_else(|| NestError::node_not_found(id))?;
                node.touch();
                Ok(node.clone())
            })
            .await?;

        tracing::info!(
            owner = %owner,
            node = %id,
            parent = ?node.parent_id.as_ref().map(NodeId::as_str),
            order = node.order,
            "playlist reparented"
        );
        Ok(node)
    }

    /// Delete a node with its whole subtree and every membership inside it
    pub async fn delete_node(&self, owner: &OwnerId, id: &NodeId) -> Result<Deleted> {
        let deleted = self
            .mutate(owner, |forest, expectations| {
                let parent = forest.require_node(id)?.parent_id.clone();
                expectations.push(Expectation::NodeUnder {
                    id: id.clone(),
                    parent_id: parent.clone(),
                });

                let mut doomed: HashSet<NodeId> = forest.descendants(id).into_iter().collect();
                doomed.insert(id.clone());

                let tracks: Vec<MembershipId> = forest
                    .memberships()
                    .filter(|m| doomed.contains(&m.playlist_id))
                    .map(|m| m.id.clone())
                    .collect();
                for track in &tracks {
                    forest.remove_membership(track);
                }
                for node in &doomed {
                    forest.remove_node(node);
                }
                guard::renumber(forest, parent.as_ref())?;

                Ok(Deleted {
                    deleted: true,
                    removed_nodes: doomed.len(),
                    removed_tracks: tracks.len(),
                })
            })
            .await?;

        tracing::info!(
            owner = %owner,
            node = %id,
            removed_nodes = deleted.removed_nodes,
            removed_tracks = deleted.removed_tracks,
            "playlist deleted"
        );
        Ok(deleted)
    }

    /// Assign orders `0..n` to `container`'s items in the supplied sequence
    ///
    /// `items` must list the container's current items exactly.
    pub async fn reorder_container(
        &self,
        owner: &OwnerId,
        container: &NodeId,
        items: &[ItemRef],
    ) -> Result<Reordered> {
        self.mutate(owner, |forest, expectations| {
            forest.require_node(container)?;
            guard::validate_reorder(forest, Some(container), items)?;

            for item in items {
                expectations.push(match item {
                    ItemRef::Track(id) => Expectation::MembershipIn {
                        id: id.clone(),
                        playlist_id: container.clone(),
                    },
                    ItemRef::Node(id) => Expectation::NodeUnder {
                        id: id.clone(),
                        parent_id: Some(container.clone()),
                    },
                });
            }
            forest.arrange(Some(container), items)
        })
        .await?;

        tracing::debug!(owner = %owner, container = %container, items = items.len(), "container reordered");
        Ok(Reordered { reordered: true })
    }

    /// Append an external track to `playlist`
    pub async fn add_track(
        &self,
        owner: &OwnerId,
        playlist: &NodeId,
        external_track_id: &str,
    ) -> Result<TrackMembership> {
        guard::validate_external_id(external_track_id)?;

        let membership = self
            .mutate(owner, |forest, _| {
                forest.require_node(playlist)?;
                let order = guard::next_order(forest, Some(playlist))?;
                let membership =
                    TrackMembership::new(playlist.clone(), external_track_id.trim(), order);
                forest.insert_membership(membership.clone());
                touch(forest, playlist)?;
                Ok(membership)
            })
            .await?;

        tracing::info!(owner = %owner, playlist = %playlist, track = %membership.id, "track added");
        Ok(membership)
    }

    /// Remove one membership from `playlist` and close the gap
    pub async fn remove_track(
        &self,
        owner: &OwnerId,
        playlist: &NodeId,
        track: &MembershipId,
    ) -> Result<Removed> {
        self.mutate(owner, |forest, expectations| {
            let membership = forest.require_membership(track)?;
            if &membership.playlist_id != playlist {
                return Err(NestError::track_not_found(track));
            }
            expectations.push(Expectation::MembershipIn {
                id: track.clone(),
                playlist_id: playlist.clone(),
            });
            forest.remove_membership(track);
            guard::renumber(forest, Some(playlist))?;
            touch(forest, playlist)
        })
        .await?;

        tracing::info!(owner = %owner, playlist = %playlist, track = %track, "track removed");
        Ok(Removed { removed: true })
    }

    /// Move a membership from `source` to `target` at `target_order`
    ///
    /// Rejected with `StaleSource` when the track does not currently live in
    /// `source`; nothing is written in that case.
    pub async fn move_track(
        &self,
        owner: &OwnerId,
        track: &MembershipId,
        source: &NodeId,
        target: &NodeId,
        target_order: u32,
    ) -> Result<Moved> {
        self.mutate(owner, |forest, expectations| {
            let membership = forest.require_membership(track)?;
            if &membership.playlist_id != source {
                tracing::info!(owner = %owner, track = %track, claimed = %source, actual = %membership.playlist_id, "stale move rejected");
                return Err(NestError::StaleSource {
                    track: track.clone(),
                    claimed_source: source.clone(),
                });
            }
            forest.require_node(target)?;

            expectations.push(Expectation::MembershipIn {
                id: track.clone(),
                playlist_id: source.clone(),
            });
            forest.relocate(
                &ItemRef::Track(track.clone()),
                Some(target),
                Some(target_order as usize),
            )?;
            touch(forest, source)?;
            touch(forest, target)
        })
        .await?;

        tracing::info!(owner = %owner, track = %track, from = %source, to = %target, order = target_order, "track moved");
        Ok(Moved { moved: true })
    }
}

/// Bump `updated_at` on a playlist whose track list changed
fn touch(forest: &mut Forest, id: &NodeId) -> Result<()> {
    forest
        .node_mut(id)
        .ok_or_else(|| NestError::node_not_found(id))?
        .touch();
    Ok(())
}
