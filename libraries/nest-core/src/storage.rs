//! Node Store abstraction
//!
//! The engine reads an owner's forest (or one subtree of it), mutates a copy
//! and commits the diff as a single [`ChangeSet`]. Implementations must apply
//! a change set atomically and check its expectations inside the same unit of
//! work.

use crate::changes::ChangeSet;
use crate::error::Result;
use crate::forest::Forest;
use crate::types::{NodeId, OwnerId, PlaylistNode};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Durable record of playlist nodes and track memberships
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Every node and membership owned by `owner`
    async fn load_forest(&self, owner: &OwnerId) -> Result<Forest>;

    /// `root`, its descendants and their memberships; `None` if `root` is not owned
    async fn load_subtree(&self, owner: &OwnerId, root: &NodeId) -> Result<Option<Forest>>;

    /// One node, scoped to `owner`
    async fn get_node(&self, owner: &OwnerId, id: &NodeId) -> Result<Option<PlaylistNode>>;

    /// Commit `changes` all-or-nothing
    ///
    /// Fails with `Conflict` and writes nothing when an expectation no longer holds.
    async fn apply(&self, owner: &OwnerId, changes: &ChangeSet) -> Result<()>;
}

/// In-process store, one forest per owner
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    forests: RwLock<HashMap<OwnerId, Forest>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    async fn load_forest(&self, owner: &OwnerId) -> Result<Forest> {
        let forests = self.forests.read().await;
        Ok(forests
            .get(owner)
            .cloned()
            .unwrap_or_else(|| Forest::new(owner.clone())))
    }

    async fn load_subtree(&self, owner: &OwnerId, root: &NodeId) -> Result<Option<Forest>> {
        let forests = self.forests.read().await;
        let Some(forest) = forests.get(owner) else {
            return Ok(None);
        };
        let Some(root_node) = forest.node(root) else {
            return Ok(None);
        };

        let mut scope = forest.descendants(root);
        let nodes: Vec<PlaylistNode> = std::iter::once(root_node.clone())
            .chain(scope.iter().filter_map(|id| forest.node(id).cloned()))
            .collect();
        scope.push(root.clone());
        let memberships = forest
            .memberships()
            .filter(|m| scope.contains(&m.playlist_id))
            .cloned()
            .collect::<Vec<_>>();

        Ok(Some(Forest::from_parts(owner.clone(), nodes, memberships)))
    }

    async fn get_node(&self, owner: &OwnerId, id: &NodeId) -> Result<Option<PlaylistNode>> {
        let forests = self.forests.read().await;
        Ok(forests.get(owner).and_then(|f| f.node(id).cloned()))
    }

    async fn apply(&self, owner: &OwnerId, changes: &ChangeSet) -> Result<()> {
        let mut forests = self.forests.write().await;
        forests
            .entry(owner.clone())
            .or_insert_with(|| Forest::new(owner.clone()))
            .apply(changes)
    }
}
