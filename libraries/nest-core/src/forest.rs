//! Arena of one owner's playlist nodes and track memberships
//!
//! Nodes reference their parent by id, never by pointer. Every container
//! (a node acting as parent of child nodes and owner of track memberships)
//! exposes its items in one shared order space.

use crate::changes::{Change, ChangeSet, Expectation};
use crate::error::{NestError, Result};
use crate::types::{
    ContainerItems, ItemRef, MembershipId, NodeId, OwnerId, PlaylistNode, TrackMembership,
    TreeNode,
};
use std::collections::{BTreeMap, HashSet};

/// One owner's forest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest {
    owner_id: OwnerId,
    nodes: BTreeMap<NodeId, PlaylistNode>,
    memberships: BTreeMap<MembershipId, TrackMembership>,
}

impl Forest {
    /// Empty forest
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            nodes: BTreeMap::new(),
            memberships: BTreeMap::new(),
        }
    }

    /// Build from loaded rows
    pub fn from_parts(
        owner_id: OwnerId,
        nodes: impl IntoIterator<Item = PlaylistNode>,
        memberships: impl IntoIterator<Item = TrackMembership>,
    ) -> Self {
        Self {
            owner_id,
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            memberships: memberships
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect(),
        }
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn node(&self, id: &NodeId) -> Option<&PlaylistNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut PlaylistNode> {
        self.nodes.get_mut(id)
    }

    pub fn membership(&self, id: &MembershipId) -> Option<&TrackMembership> {
        self.memberships.get(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &PlaylistNode> {
        self.nodes.values()
    }

    pub fn memberships(&self) -> impl Iterator<Item = &TrackMembership> {
        self.memberships.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn membership_count(&self) -> usize {
        self.memberships.len()
    }

    /// Look up a node or fail with `NotFound`
    pub fn require_node(&self, id: &NodeId) -> Result<&PlaylistNode> {
        self.node(id).ok_or_else(|| NestError::node_not_found(id))
    }

    /// Look up a membership or fail with `NotFound`
    pub fn require_membership(&self, id: &MembershipId) -> Result<&TrackMembership> {
        self.membership(id)
            .ok_or_else(|| NestError::track_not_found(id))
    }

    // ------------------------------------------------------------------
    // Container views
    // ------------------------------------------------------------------

    /// Direct child nodes of a container (`None` = the owner's roots), by order
    pub fn child_nodes(&self, parent: Option<&NodeId>) -> Vec<&PlaylistNode> {
        let mut children: Vec<&PlaylistNode> = self
            .nodes
            .values()
            .filter(|n| n.parent_id.as_ref() == parent)
            .collect();
        children.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        children
    }

    /// Direct track memberships of a node, by order
    pub fn direct_tracks(&self, playlist: &NodeId) -> Vec<&TrackMembership> {
        let mut tracks: Vec<&TrackMembership> = self
            .memberships
            .values()
            .filter(|m| &m.playlist_id == playlist)
            .collect();
        tracks.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        tracks
    }

    /// All direct items of a container in ascending order
    ///
    /// Equal orders only occur in corrupt data; they are broken by kind
    /// (nodes first) and then by id so the result stays deterministic.
    pub fn items(&self, container: Option<&NodeId>) -> Vec<ItemRef> {
        let mut keyed: Vec<(u32, u8, ItemRef)> = self
            .child_nodes(container)
            .into_iter()
            .map(|n| (n.order, 0, ItemRef::Node(n.id.clone())))
            .collect();
        if let Some(playlist) = container {
            keyed.extend(
                self.direct_tracks(playlist)
                    .into_iter()
                    .map(|m| (m.order, 1, ItemRef::Track(m.id.clone()))),
            );
        }
        keyed.sort();
        keyed.into_iter().map(|(_, _, item)| item).collect()
    }

    /// Number of direct items in a container
    pub fn item_count(&self, container: Option<&NodeId>) -> usize {
        let nodes = self
            .nodes
            .values()
            .filter(|n| n.parent_id.as_ref() == container)
            .count();
        let tracks = container.map_or(0, |playlist| {
            self.memberships
                .values()
                .filter(|m| &m.playlist_id == playlist)
                .count()
        });
        nodes + tracks
    }

    /// Container currently holding an item; `Some(None)` means the root level
    pub fn container_of(&self, item: &ItemRef) -> Option<Option<NodeId>> {
        match item {
            ItemRef::Node(id) => self.node(id).map(|n| n.parent_id.clone()),
            ItemRef::Track(id) => self.membership(id).map(|m| Some(m.playlist_id.clone())),
        }
    }

    /// True when the item exists in this forest
    pub fn contains_item(&self, item: &ItemRef) -> bool {
        match item {
            ItemRef::Node(id) => self.nodes.contains_key(id),
            ItemRef::Track(id) => self.memberships.contains_key(id),
        }
    }

    /// Every node strictly below `id`, in depth-first pre-order
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id.clone()]);
        let mut stack: Vec<NodeId> = self
            .child_nodes(Some(id))
            .into_iter()
            .rev()
            .map(|n| n.id.clone())
            .collect();
        while let Some(next) = stack.pop() {
            if !seen.insert(next.clone()) {
                continue;
            }
            stack.extend(
                self.child_nodes(Some(&next))
                    .into_iter()
                    .rev()
                    .map(|n| n.id.clone()),
            );
            out.push(next);
        }
        out
    }

    /// Distance from the root level (roots have depth 0)
    pub fn depth(&self, id: &NodeId) -> usize {
        let mut depth = 0;
        let mut seen = HashSet::new();
        let mut current = self.node(id).and_then(|n| n.parent_id.as_ref());
        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            depth += 1;
            current = self.node(parent).and_then(|n| n.parent_id.as_ref());
        }
        depth
    }

    /// Track memberships anywhere in the subtree rooted at `id`
    pub fn track_count(&self, id: &NodeId) -> usize {
        let mut scope: HashSet<NodeId> = self.descendants(id).into_iter().collect();
        scope.insert(id.clone());
        self.memberships
            .values()
            .filter(|m| scope.contains(&m.playlist_id))
            .count()
    }

    /// Ordered items of `root` and of every container below it
    pub fn container_items(&self, root: &NodeId) -> Result<ContainerItems> {
        self.require_node(root)?;
        let mut map = ContainerItems::new();
        map.insert(root.clone(), self.items(Some(root)));
        for id in self.descendants(root) {
            let items = self.items(Some(&id));
            map.insert(id, items);
        }
        Ok(map)
    }

    /// Nested view of the whole forest, children sorted by order
    pub fn tree(&self) -> Vec<TreeNode> {
        self.child_nodes(None)
            .into_iter()
            .map(|root| self.tree_node(root, &mut HashSet::new()))
            .collect()
    }

    fn tree_node(&self, node: &PlaylistNode, seen: &mut HashSet<NodeId>) -> TreeNode {
        seen.insert(node.id.clone());
        let children = self
            .child_nodes(Some(&node.id))
            .into_iter()
            .filter(|child| !seen.contains(&child.id))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|child| self.tree_node(child, seen))
            .collect();
        TreeNode {
            node: node.clone(),
            track_count: self.track_count(&node.id),
            children,
        }
    }

    // ------------------------------------------------------------------
    // Arena mutation (callers are responsible for invariants)
    // ------------------------------------------------------------------

    pub fn insert_node(&mut self, node: PlaylistNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn insert_membership(&mut self, membership: TrackMembership) {
        self.memberships.insert(membership.id.clone(), membership);
    }

    pub fn remove_node(&mut self, id: &NodeId) -> Option<PlaylistNode> {
        self.nodes.remove(id)
    }

    pub fn remove_membership(&mut self, id: &MembershipId) -> Option<TrackMembership> {
        self.memberships.remove(id)
    }

    /// Place `items` into `container` with orders `0..n` in the given sequence
    ///
    /// Items are re-homed to `container` if they lived elsewhere. Tracks cannot
    /// be placed at the root level.
    pub fn arrange(&mut self, container: Option<&NodeId>, items: &[ItemRef]) -> Result<()> {
        for (index, item) in items.iter().enumerate() {
            let order = u32::try_from(index)
                .map_err(|_| NestError::invalid_operation("container holds too many items"))?;
            match item {
                ItemRef::Node(id) => {
                    let node = self
                        .nodes
                        .get_mut(id)
                        .ok_or_else(|| NestError::node_not_found(id))?;
                    node.parent_id = container.cloned();
                    node.order = order;
                }
                ItemRef::Track(id) => {
                    let playlist = container.ok_or_else(|| {
                        NestError::invalid_operation("tracks cannot be placed at the root level")
                    })?;
                    let membership = self
                        .memberships
                        .get_mut(id)
                        .ok_or_else(|| NestError::track_not_found(id))?;
                    membership.playlist_id = playlist.clone();
                    membership.order = order;
                }
            }
        }
        Ok(())
    }

    /// Move `item` into `container` at `index` (appended when `None` or past the end)
    ///
    /// Both the old and the new container end up with contiguous orders.
    pub fn relocate(
        &mut self,
        item: &ItemRef,
        container: Option<&NodeId>,
        index: Option<usize>,
    ) -> Result<()> {
        let previous = self.container_of(item).ok_or_else(|| match item {
            ItemRef::Node(id) => NestError::node_not_found(id),
            ItemRef::Track(id) => NestError::track_not_found(id),
        })?;

        let mut target: Vec<ItemRef> = self
            .items(container)
            .into_iter()
            .filter(|existing| existing != item)
            .collect();
        let at = index.map_or(target.len(), |i| i.min(target.len()));
        target.insert(at, item.clone());
        self.arrange(container, &target)?;

        if previous.as_ref() != container {
            let rest = self.items(previous.as_ref());
            self.arrange(previous.as_ref(), &rest)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Invariants
    // ------------------------------------------------------------------

    /// Describe every invariant violation; empty when the forest is consistent
    pub fn violations(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for node in self.nodes.values() {
            if node.owner_id != self.owner_id {
                problems.push(format!("node {} belongs to another owner", node.id));
            }
            if let Some(parent) = &node.parent_id {
                if !self.nodes.contains_key(parent) {
                    problems.push(format!("node {} has missing parent {}", node.id, parent));
                }
            }
            let mut seen = HashSet::from([&node.id]);
            let mut current = node.parent_id.as_ref();
            while let Some(parent) = current {
                if !seen.insert(parent) {
                    problems.push(format!("node {} is part of a cycle", node.id));
                    break;
                }
                current = self.node(parent).and_then(|n| n.parent_id.as_ref());
            }
        }

        for membership in self.memberships.values() {
            if !self.nodes.contains_key(&membership.playlist_id) {
                problems.push(format!(
                    "track {} points at missing playlist {}",
                    membership.id, membership.playlist_id
                ));
            }
        }

        let mut containers: Vec<Option<&NodeId>> = vec![None];
        containers.extend(self.nodes.keys().map(Some));
        for container in containers {
            let mut orders: Vec<u32> = self
                .nodes
                .values()
                .filter(|n| n.parent_id.as_ref() == container)
                .map(|n| n.order)
                .collect();
            if let Some(playlist) = container {
                orders.extend(
                    self.memberships
                        .values()
                        .filter(|m| &m.playlist_id == playlist)
                        .map(|m| m.order),
                );
            }
            orders.sort_unstable();
            let contiguous = orders
                .iter()
                .enumerate()
                .all(|(i, order)| usize::try_from(*order).is_ok_and(|o| o == i));
            if !contiguous {
                let label = container.map_or_else(|| "<root>".to_string(), ToString::to_string);
                problems.push(format!("container {} has orders {:?}", label, orders));
            }
        }

        problems
    }

    // ------------------------------------------------------------------
    // Diff / apply
    // ------------------------------------------------------------------

    /// Writes that turn `before` into `self`
    pub fn changes_since(&self, before: &Forest) -> ChangeSet {
        let mut set = ChangeSet::new();

        let mut inserted: Vec<&PlaylistNode> = self
            .nodes
            .values()
            .filter(|n| !before.nodes.contains_key(&n.id))
            .collect();
        inserted.sort_by_key(|n| self.depth(&n.id));
        for node in inserted {
            set.push(Change::InsertNode(node.clone()));
        }

        for node in self.nodes.values() {
            if let Some(old) = before.nodes.get(&node.id) {
                if old != node {
                    set.push(Change::UpdateNode(node.clone()));
                }
            }
        }

        for membership in self.memberships.values() {
            match before.memberships.get(&membership.id) {
                None => {
                    set.push(Change::InsertMembership(membership.clone()));
                }
                Some(old) if old != membership => {
                    set.push(Change::UpdateMembership(membership.clone()));
                }
                Some(_) => {}
            }
        }

        for id in before.memberships.keys() {
            if !self.memberships.contains_key(id) {
                set.push(Change::DeleteMembership(id.clone()));
            }
        }

        let mut removed: Vec<&NodeId> = before
            .nodes
            .keys()
            .filter(|id| !self.nodes.contains_key(*id))
            .collect();
        removed.sort_by_key(|id| std::cmp::Reverse(before.depth(id)));
        for id in removed {
            set.push(Change::DeleteNode(id.clone()));
        }

        set
    }

    /// Verify the expectations of a change set against this forest
    pub fn check_expectations(&self, set: &ChangeSet) -> Result<()> {
        for expectation in &set.expectations {
            match expectation {
                Expectation::MembershipIn { id, playlist_id } => {
                    let actual = self.membership(id).map(|m| &m.playlist_id);
                    if actual != Some(playlist_id) {
                        return Err(NestError::conflict(format!(
                            "track {} is no longer in playlist {}",
                            id, playlist_id
                        )));
                    }
                }
                Expectation::NodeUnder { id, parent_id } => {
                    let actual = self.node(id).map(|n| n.parent_id.as_ref());
                    if actual != Some(parent_id.as_ref()) {
                        return Err(NestError::conflict(format!(
                            "playlist {} moved concurrently",
                            id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply a change set in place, all-or-nothing
    pub fn apply(&mut self, set: &ChangeSet) -> Result<()> {
        self.check_expectations(set)?;
        let mut next = self.clone();

        for change in &set.changes {
            match change {
                Change::InsertNode(node) => {
                    if next.nodes.contains_key(&node.id) {
                        return Err(NestError::conflict(format!("playlist {} already exists", node.id)));
                    }
                    next.insert_node(node.clone());
                }
                Change::UpdateNode(node) => {
                    let slot = next
                        .nodes
                        .get_mut(&node.id)
                        .ok_or_else(|| NestError::conflict(format!("playlist {} vanished", node.id)))?;
                    *slot = node.clone();
                }
                Change::DeleteNode(id) => {
                    let mut doomed = next.descendants(id);
                    doomed.push(id.clone());
                    next.memberships
                        .retain(|_, m| !doomed.contains(&m.playlist_id));
                    for node in &doomed {
                        next.nodes.remove(node);
                    }
                }
                Change::InsertMembership(membership) => {
                    if !next.nodes.contains_key(&membership.playlist_id) {
                        return Err(NestError::conflict(format!(
                            "playlist {} vanished",
                            membership.playlist_id
                        )));
                    }
                    next.insert_membership(membership.clone());
                }
                Change::UpdateMembership(membership) => {
                    let slot = next.memberships.get_mut(&membership.id).ok_or_else(|| {
                        NestError::conflict(format!("track {} vanished", membership.id))
                    })?;
                    *slot = membership.clone();
                }
                Change::DeleteMembership(id) => {
                    next.memberships.remove(id);
                }
            }
        }

        *self = next;
        Ok(())
    }
}
