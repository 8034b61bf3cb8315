//! Tree invariant checks
//!
//! Pure functions over a [`Forest`]. Every structural mutation runs the
//! relevant check before anything is written.

use crate::error::{NestError, Result};
use crate::forest::Forest;
use crate::types::{ItemRef, NodeId, MAX_NAME_LEN};
use std::collections::HashSet;

/// Longest accepted external track reference
pub const MAX_EXTERNAL_ID_LEN: usize = 255;

/// True iff `node` is `ancestor` itself or sits anywhere below it
///
/// Walks the parent chain upward from `node`, visiting every ancestor.
pub fn is_descendant(forest: &Forest, ancestor: &NodeId, node: &NodeId) -> bool {
    let mut seen = HashSet::new();
    let mut current = Some(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        if !seen.insert(id) {
            // corrupt data; a cycle never leads to `ancestor`
            return false;
        }
        current = forest.node(id).and_then(|n| n.parent_id.as_ref());
    }
    false
}

/// Whether `node` may be attached under `new_parent` (`None` = root level)
pub fn can_reparent(forest: &Forest, node: &NodeId, new_parent: Option<&NodeId>) -> bool {
    match new_parent {
        None => true,
        Some(parent) => parent != node && !is_descendant(forest, node, parent),
    }
}

/// [`can_reparent`] as a `Result`, carrying the distinct cycle error
pub fn check_reparent(forest: &Forest, node: &NodeId, new_parent: Option<&NodeId>) -> Result<()> {
    if can_reparent(forest, node, new_parent) {
        Ok(())
    } else {
        Err(NestError::CyclicReparent {
            node: node.clone(),
            parent: new_parent.cloned().unwrap_or_else(|| node.clone()),
        })
    }
}

/// Append position for a new item in `container`
pub fn next_order(forest: &Forest, container: Option<&NodeId>) -> Result<u32> {
    u32::try_from(forest.item_count(container))
        .map_err(|_| NestError::invalid_operation("container holds too many items"))
}

/// Rewrite `container`'s orders to `0..n` keeping their relative sequence
pub fn renumber(forest: &mut Forest, container: Option<&NodeId>) -> Result<()> {
    let items = forest.items(container);
    forest.arrange(container, &items)
}

/// Check that `proposed` is exactly the current item set of `container`
pub fn validate_reorder(
    forest: &Forest,
    container: Option<&NodeId>,
    proposed: &[ItemRef],
) -> Result<()> {
    let mut unique = HashSet::with_capacity(proposed.len());
    for item in proposed {
        if !unique.insert(item) {
            return Err(NestError::ReorderMismatch(format!("{} listed twice", item)));
        }
    }

    let current = forest.items(container);
    if let Some(missing) = current.iter().find(|item| !unique.contains(item)) {
        return Err(NestError::ReorderMismatch(format!("{} is missing", missing)));
    }
    if current.len() != proposed.len() {
        let current: HashSet<&ItemRef> = current.iter().collect();
        let extra = proposed
            .iter()
            .find(|item| !current.contains(item))
            .map_or_else(String::new, ToString::to_string);
        return Err(NestError::ReorderMismatch(format!(
            "{} does not belong to this playlist",
            extra
        )));
    }
    Ok(())
}

/// Trimmed name must be 1..=100 characters
pub fn validate_name(name: &str) -> Result<()> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(NestError::invalid_input("name must not be empty"));
    }
    if len > MAX_NAME_LEN {
        return Err(NestError::invalid_input(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// External track references are opaque but must be non-blank and bounded
pub fn validate_external_id(external_track_id: &str) -> Result<()> {
    if external_track_id.trim().is_empty() {
        return Err(NestError::invalid_input("external track id must not be empty"));
    }
    if external_track_id.len() > MAX_EXTERNAL_ID_LEN {
        return Err(NestError::invalid_input("external track id is too long"));
    }
    Ok(())
}
