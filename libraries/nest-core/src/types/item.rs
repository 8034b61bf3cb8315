/// Mixed container items
use crate::types::{MembershipId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A direct item of a container: a track membership or a child node
///
/// Both kinds share one order space per container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum ItemRef {
    Track(MembershipId),
    #[serde(rename = "playlist")]
    Node(NodeId),
}

impl ItemRef {
    /// Identifier as a plain string
    pub fn id_str(&self) -> &str {
        match self {
            ItemRef::Track(id) => id.as_str(),
            ItemRef::Node(id) => id.as_str(),
        }
    }

    /// The node id when this item is a child node
    pub fn as_node(&self) -> Option<&NodeId> {
        match self {
            ItemRef::Node(id) => Some(id),
            ItemRef::Track(_) => None,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Track(id) => write!(f, "track:{}", id),
            ItemRef::Node(id) => write!(f, "playlist:{}", id),
        }
    }
}

/// Ordered items per container, for a node and all its descendants
pub type ContainerItems = BTreeMap<NodeId, Vec<ItemRef>>;
