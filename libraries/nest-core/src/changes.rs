//! Change sets: the unit of atomic persistence
//!
//! The Mutation Engine never writes rows one by one. It mutates a working copy of
//! the owner's [`Forest`](crate::Forest), diffs it against the loaded snapshot and
//! hands the resulting [`ChangeSet`] to a [`NodeStore`](crate::NodeStore), which
//! commits it all-or-nothing.

use crate::types::{MembershipId, NodeId, PlaylistNode, TrackMembership};

/// Precondition checked by the store inside the commit, before any write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// The membership still lives in this container
    MembershipIn {
        id: MembershipId,
        playlist_id: NodeId,
    },
    /// The node still hangs under this parent
    NodeUnder {
        id: NodeId,
        parent_id: Option<NodeId>,
    },
}

/// A single row-level write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    InsertNode(PlaylistNode),
    UpdateNode(PlaylistNode),
    DeleteNode(NodeId),
    InsertMembership(TrackMembership),
    UpdateMembership(TrackMembership),
    DeleteMembership(MembershipId),
}

/// Ordered writes plus the preconditions they depend on
///
/// Write order is significant: node inserts parent-first, then node updates,
/// membership inserts and updates, membership deletes, and node deletes
/// deepest-first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub expectations: Vec<Expectation>,
    pub changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a precondition
    pub fn expect(&mut self, expectation: Expectation) -> &mut Self {
        self.expectations.push(expectation);
        self
    }

    /// Append a write
    pub fn push(&mut self, change: Change) -> &mut Self {
        self.changes.push(change);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Ids of all nodes deleted by this change set
    pub fn deleted_nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.changes.iter().filter_map(|c| match c {
            Change::DeleteNode(id) => Some(id),
            _ => None,
        })
    }

    /// Ids of all memberships deleted by this change set
    pub fn deleted_memberships(&self) -> impl Iterator<Item = &MembershipId> {
        self.changes.iter().filter_map(|c| match c {
            Change::DeleteMembership(id) => Some(id),
            _ => None,
        })
    }
}
