//! Depth-first linearization of a subtree into a single track sequence

use crate::error::Result;
use crate::forest::Forest;
use crate::types::{ItemRef, LinearizedTrack, NodeId};
use std::collections::HashSet;

/// All tracks reachable from `root`, in depth-first pre-order
///
/// At each container, direct tracks and child nodes are visited together in
/// ascending order; entering a child node yields its whole subtree before the
/// next sibling. Fails with `NotFound` if `root` is not in `forest`.
pub fn linearize(forest: &Forest, root: &NodeId) -> Result<Vec<LinearizedTrack>> {
    forest.require_node(root)?;

    let mut out = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![ItemRef::Node(root.clone())];

    while let Some(item) = stack.pop() {
        match item {
            ItemRef::Track(id) => {
                let Some(membership) = forest.membership(&id) else {
                    continue;
                };
                let source_container_name = forest
                    .node(&membership.playlist_id)
                    .map(|n| n.name.clone())
                    .unwrap_or_default();
                out.push(LinearizedTrack {
                    membership: membership.clone(),
                    source_container_name,
                });
            }
            ItemRef::Node(id) => {
                if !visited.insert(id.clone()) {
                    continue;
                }
                let mut items = forest.items(Some(&id));
                items.reverse();
                stack.extend(items);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NestError;
    use crate::types::{MembershipId, NewNode, OwnerId, PlaylistNode, TrackMembership};

    fn add_node(forest: &mut Forest, id: &str, parent: Option<&str>, order: u32) {
        let mut node = PlaylistNode::new(
            forest.owner_id().clone(),
            parent.map(NodeId::new),
            order,
            NewNode::named(id),
        );
        node.id = NodeId::new(id);
        forest.insert_node(node);
    }

    fn add_track(forest: &mut Forest, id: &str, playlist: &str, order: u32) {
        let mut m = TrackMembership::new(NodeId::new(playlist), id, order);
        m.id = MembershipId::new(id);
        forest.insert_membership(m);
    }

    fn ids(tracks: &[LinearizedTrack]) -> Vec<&str> {
        tracks.iter().map(|t| t.membership.id.as_str()).collect()
    }

    #[test]
    fn interleaves_tracks_and_children() {
        let mut f = Forest::new(OwnerId::new("o"));
        add_node(&mut f, "R", None, 0);
        add_node(&mut f, "A", Some("R"), 0);
        add_node(&mut f, "B", Some("R"), 1);
        add_track(&mut f, "t1", "A", 0);
        add_track(&mut f, "t2", "R", 2);

        let tracks = linearize(&f, &NodeId::new("R")).unwrap();
        assert_eq!(ids(&tracks), vec!["t1", "t2"]);
        assert_eq!(tracks[0].source_container_name, "A");
        assert_eq!(tracks[1].source_container_name, "R");
    }

    #[test]
    fn track_before_child_is_yielded_first() {
        let mut f = Forest::new(OwnerId::new("o"));
        add_node(&mut f, "R", None, 0);
        add_track(&mut f, "x", "R", 0);
        add_node(&mut f, "Y", Some("R"), 1);
        add_track(&mut f, "z", "R", 2);
        add_track(&mut f, "y1", "Y", 0);
        add_track(&mut f, "y2", "Y", 1);

        let tracks = linearize(&f, &NodeId::new("R")).unwrap();
        assert_eq!(ids(&tracks), vec!["x", "y1", "y2", "z"]);
    }

    #[test]
    fn empty_subtree_and_missing_root() {
        let mut f = Forest::new(OwnerId::new("o"));
        add_node(&mut f, "R", None, 0);
        add_node(&mut f, "A", Some("R"), 0);

        assert!(linearize(&f, &NodeId::new("R")).unwrap().is_empty());
        assert!(matches!(
            linearize(&f, &NodeId::new("nope")),
            Err(NestError::NotFound { .. })
        ));
    }
}
