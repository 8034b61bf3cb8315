//! Optimistic reconciliation of drag-and-drop edits
//!
//! The [`Reconciler`] mirrors the container items of one subtree. During a
//! drag it patches a speculative copy so the UI can render the hovered
//! position immediately; on drop it issues the server calls and then either
//! refreshes from the server or throws the speculative copy away. It never
//! merges and never retries.

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use nest_core::{ContainerItems, ItemRef, MembershipId, NodeId};
use std::collections::HashSet;

/// Operations the reconciler needs from the server
#[async_trait]
pub trait TreeRemote: Send + Sync {
    /// Ordered items of `root` and of every container below it
    async fn container_items(&self, root: &NodeId) -> Result<ContainerItems>;

    /// Replace the full ordering of `container`
    async fn reorder_container(&self, container: &NodeId, items: &[ItemRef]) -> Result<()>;

    /// Move a track the caller believes lives in `source`
    async fn move_track(
        &self,
        track: &MembershipId,
        source: &NodeId,
        target: &NodeId,
        order: u32,
    ) -> Result<()>;

    /// Attach a node under `parent`
    async fn reparent_node(&self, node: &NodeId, parent: &NodeId, order: Option<u32>) -> Result<()>;
}

/// Server-confirmed container items, versioned per refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub version: u64,
    pub containers: ContainerItems,
}

/// What the UI is currently shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShadowState {
    /// Exactly the last server snapshot
    Confirmed,
    /// Locally patched copy derived from snapshot `base_version`
    Speculative {
        base_version: u64,
        containers: ContainerItems,
    },
}

/// Drag gesture state; the source container is captured once at drag start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging {
        source: NodeId,
        item: ItemRef,
    },
    Committing {
        source: NodeId,
        item: ItemRef,
        target: NodeId,
    },
}

/// Where the pointer is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Over another item; the dragged item takes its slot
    Item(ItemRef),
    /// Over a container's empty area; the dragged item goes last
    Container(NodeId),
}

/// Result of a drop
#[derive(Debug)]
pub enum DropOutcome {
    /// Nothing to send (no drag, or dropped where it started)
    Ignored,
    /// Server accepted; `refreshed` is false if the follow-up fetch failed
    Committed { refreshed: bool },
    /// Server refused or was unreachable; local state is back to the snapshot
    RolledBack { error: ClientError },
}

/// Client-side mirror of one subtree's container items
pub struct Reconciler<R> {
    remote: R,
    root: NodeId,
    confirmed: Snapshot,
    shadow: ShadowState,
    drag: DragState,
}

impl<R: TreeRemote> Reconciler<R> {
    /// Empty mirror; call [`Reconciler::refresh`] to populate it
    pub fn new(remote: R, root: NodeId) -> Self {
        Self {
            remote,
            root,
            confirmed: Snapshot::default(),
            shadow: ShadowState::Confirmed,
            drag: DragState::Idle,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.confirmed
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn is_speculative(&self) -> bool {
        matches!(self.shadow, ShadowState::Speculative { base_version, .. } if base_version == self.confirmed.version)
    }

    /// Fetch the authoritative state; any speculative copy is superseded
    pub async fn refresh(&mut self) -> Result<()> {
        let containers = self.remote.container_items(&self.root).await?;
        self.confirmed = Snapshot {
            version: self.confirmed.version + 1,
            containers,
        };
        self.shadow = ShadowState::Confirmed;
        Ok(())
    }

    /// Container items to render
    ///
    /// A speculative copy built on an older snapshot is never shown.
    pub fn view(&self) -> &ContainerItems {
        match &self.shadow {
            ShadowState::Speculative {
                base_version,
                containers,
            } if *base_version == self.confirmed.version => containers,
            _ => &self.confirmed.containers,
        }
    }

    /// Items of one container as rendered
    pub fn items(&self, container: &NodeId) -> &[ItemRef] {
        self.view().get(container).map_or(&[][..], Vec::as_slice)
    }

    fn container_in_view(&self, item: &ItemRef) -> Option<NodeId> {
        self.view()
            .iter()
            .find(|(_, items)| items.contains(item))
            .map(|(id, _)| id.clone())
    }

    /// Containers displayed below (and including) `node`
    fn displayed_subtree(&self, node: &NodeId) -> HashSet<NodeId> {
        let view = self.view();
        let mut seen = HashSet::new();
        let mut stack = vec![node.clone()];
        while let Some(next) = stack.pop() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Some(items) = view.get(&next) {
                stack.extend(items.iter().filter_map(|i| i.as_node().cloned()));
            }
        }
        seen
    }

    /// Patch a copy of what is currently rendered and make it the shadow
    ///
    /// Returns false, leaving the shadow alone, when the edit changed nothing.
    fn patch_shadow(&mut self, edit: impl FnOnce(&mut ContainerItems)) -> bool {
        let mut containers = self.view().clone();
        edit(&mut containers);
        if &containers == self.view() {
            return false;
        }
        self.shadow = ShadowState::Speculative {
            base_version: self.confirmed.version,
            containers,
        };
        true
    }

    fn discard_shadow(&mut self) {
        self.shadow = ShadowState::Confirmed;
    }

    /// Begin dragging `item`; its container is recorded now and never re-derived
    pub fn drag_start(&mut self, item: ItemRef) -> bool {
        if self.drag != DragState::Idle {
            return false;
        }
        let Some(source) = self.container_in_view(&item) else {
            return false;
        };
        tracing::debug!(item = %item, source = %source, "drag started");
        self.drag = DragState::Dragging { source, item };
        true
    }

    /// Abandon the gesture without any network call
    pub fn drag_cancel(&mut self) {
        self.drag = DragState::Idle;
        self.discard_shadow();
    }

    /// Container a pointer position falls in, as currently rendered
    fn target_container(&self, target: &DropTarget) -> Option<NodeId> {
        match target {
            DropTarget::Item(over) => self.container_in_view(over),
            DropTarget::Container(id) => self.view().contains_key(id).then(|| id.clone()),
        }
    }

    fn refuses(&self, item: &ItemRef, container: &NodeId) -> bool {
        match item {
            ItemRef::Node(node) => self.displayed_subtree(node).contains(container),
            ItemRef::Track(_) => false,
        }
    }

    /// Hover over a position; cross-container hovers move the item speculatively
    ///
    /// Outside the drag-start container the item is re-inserted before the
    /// hovered item (or at the end of a hovered container) on every call.
    /// Hovers inside the source change nothing until the drop. Purely local.
    /// Returns true when the rendered state changed.
    pub fn drag_over(&mut self, target: &DropTarget) -> bool {
        let DragState::Dragging { source, item } = &self.drag else {
            return false;
        };
        let (source, item) = (source.clone(), item.clone());
        if target == &DropTarget::Item(item.clone()) {
            return false;
        }
        let (Some(current), Some(container)) =
            (self.container_in_view(&item), self.target_container(target))
        else {
            return false;
        };
        if (container == source && current == source) || self.refuses(&item, &container) {
            return false;
        }

        self.patch_shadow(|containers| {
            for list in containers.values_mut() {
                list.retain(|i| i != &item);
            }
            let list = containers.entry(container).or_default();
            let index = match target {
                DropTarget::Item(over) => list.iter().position(|i| i == over),
                DropTarget::Container(_) => None,
            }
            .unwrap_or(list.len());
            list.insert(index, item);
        })
    }

    /// Finish the gesture and commit it to the server
    pub async fn drop_on(&mut self, target: &DropTarget) -> DropOutcome {
        let DragState::Dragging { source, item } = self.drag.clone() else {
            return DropOutcome::Ignored;
        };

        self.drag_over(target);
        let Some(destination) = self.container_in_view(&item) else {
            self.drag_cancel();
            return DropOutcome::Ignored;
        };

        if destination == source {
            // Positions come from the confirmed order, so a detour through
            // other containers does not shift where the item lands
            let confirmed = self
                .confirmed
                .containers
                .get(&source)
                .cloned()
                .unwrap_or_default();
            let Some(from) = confirmed.iter().position(|i| i == &item) else {
                self.drag_cancel();
                return DropOutcome::Ignored;
            };
            let to = match target {
                DropTarget::Item(over) => confirmed.iter().position(|i| i == over).unwrap_or(from),
                DropTarget::Container(id) if id == &source => confirmed.len() - 1,
                DropTarget::Container(_) => from,
            };
            if from == to {
                self.drag_cancel();
                return DropOutcome::Ignored;
            }
            let mut items = confirmed;
            let moving = items.remove(from);
            items.insert(to, moving);
            let container = source.clone();
            self.patch_shadow(|containers| {
                containers.insert(container, items);
            });
        }

        let final_items = self.items(&destination).to_vec();
        self.drag = DragState::Committing {
            source: source.clone(),
            item: item.clone(),
            target: destination.clone(),
        };

        let result = self
            .commit(&source, &item, &destination, &final_items)
            .await;
        self.drag = DragState::Idle;

        match result {
            Ok(()) => {
                let refreshed = match self.refresh().await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(error = %e, "refresh after commit failed");
                        self.discard_shadow();
                        false
                    }
                };
                DropOutcome::Committed { refreshed }
            }
            Err(error) => {
                tracing::info!(item = %item, error = %error, "drop rejected, rolling back");
                self.discard_shadow();
                DropOutcome::RolledBack { error }
            }
        }
    }

    /// Ownership change first, then the destination's final ordering
    async fn commit(
        &self,
        source: &NodeId,
        item: &ItemRef,
        destination: &NodeId,
        final_items: &[ItemRef],
    ) -> Result<()> {
        if destination != source {
            let index = final_items
                .iter()
                .position(|i| i == item)
                .unwrap_or(final_items.len());
            let order = u32::try_from(index).unwrap_or(u32::MAX);
            match item {
                ItemRef::Track(track) => {
                    self.remote
                        .move_track(track, source, destination, order)
                        .await?;
                }
                ItemRef::Node(node) => {
                    self.remote
                        .reparent_node(node, destination, Some(order))
                        .await?;
                }
            }
        }
        self.remote
            .reorder_container(destination, final_items)
            .await
    }
}
