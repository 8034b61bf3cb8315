/// Playlist node domain types
use crate::types::{NodeId, OwnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Icon given to nodes created without one
pub const DEFAULT_ICON: &str = "🎵";

/// Cover gradient given to nodes created without one
pub const DEFAULT_COLOR: &str = "linear-gradient(135deg,#7c6af7,#f76a8a)";

/// Longest accepted node name, in characters
pub const MAX_NAME_LEN: usize = 100;

/// A playlist in an owner's forest
///
/// A node is a container: its direct child nodes and direct track memberships
/// share one order space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistNode {
    /// Unique node identifier
    pub id: NodeId,

    /// Owning user
    pub owner_id: OwnerId,

    /// Parent node, `None` for a root
    pub parent_id: Option<NodeId>,

    /// Position among the items of the parent container
    pub order: u32,

    /// Display name
    pub name: String,

    /// Emoji icon
    pub icon: String,

    /// CSS gradient used for the cover
    pub color: String,

    /// Optional cover artwork
    pub cover_image_url: Option<String>,

    /// Optional link to a playlist in the external catalog
    pub external_playlist_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last attribute or structure change on this node
    pub updated_at: DateTime<Utc>,
}

impl PlaylistNode {
    /// Build a fresh node from creation attributes
    pub fn new(owner_id: OwnerId, parent_id: Option<NodeId>, order: u32, attrs: NewNode) -> Self {
        let now = Utc::now();
        Self {
            id: NodeId::generate(),
            owner_id,
            parent_id,
            order,
            name: attrs.name.trim().to_string(),
            icon: attrs.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            color: attrs.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            cover_image_url: attrs.cover_image_url,
            external_playlist_id: attrs.external_playlist_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial attribute update; structure is untouched
    pub fn apply_update(&mut self, update: NodeUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(icon) = update.icon {
            self.icon = icon;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(url) = update.cover_image_url {
            self.cover_image_url = url;
        }
        if let Some(external) = update.external_playlist_id {
            self.external_playlist_id = external;
        }
        self.touch();
    }

    /// Bump `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Attributes for creating a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNode {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub external_playlist_id: Option<String>,
}

impl NewNode {
    /// Creation attributes with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial attribute update; `None` leaves a field unchanged
///
/// The optional links take `Some(None)` to clear them. On the wire an absent
/// key leaves the link alone and an explicit `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub cover_image_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub external_playlist_id: Option<Option<String>>,
}

/// A key that is present, `null` included
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl NodeUpdate {
    /// Update that only renames
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.icon.is_none()
            && self.color.is_none()
            && self.cover_image_url.is_none()
            && self.external_playlist_id.is_none()
    }
}

/// A node in the nested tree view, children sorted by `order`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: PlaylistNode,

    /// Track memberships anywhere in this node's subtree
    pub track_count: usize,

    pub children: Vec<TreeNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_gets_defaults() {
        let node = PlaylistNode::new(OwnerId::new("u1"), None, 0, NewNode::named("  Chill  "));

        assert_eq!(node.name, "Chill");
        assert_eq!(node.icon, DEFAULT_ICON);
        assert_eq!(node.color, DEFAULT_COLOR);
        assert!(node.parent_id.is_none());
        assert_eq!(node.created_at, node.updated_at);
    }

    #[test]
    fn partial_update_keeps_unset_fields() {
        let mut node = PlaylistNode::new(OwnerId::new("u1"), None, 0, NewNode::named("A"));
        node.apply_update(NodeUpdate {
            icon: Some("🎸".to_string()),
            ..NodeUpdate::default()
        });

        assert_eq!(node.name, "A");
        assert_eq!(node.icon, "🎸");
        assert_eq!(node.color, DEFAULT_COLOR);
    }

    #[test]
    fn null_clears_optional_links() {
        let mut node = PlaylistNode::new(
            OwnerId::new("u1"),
            None,
            0,
            NewNode {
                cover_image_url: Some("https://img/a.png".to_string()),
                external_playlist_id: Some("37i9dQZF1DX".to_string()),
                ..NewNode::named("A")
            },
        );

        let keep: NodeUpdate = serde_json::from_str(r#"{"name": "B"}"#).unwrap();
        assert_eq!(keep.cover_image_url, None);
        node.apply_update(keep);
        assert_eq!(node.cover_image_url.as_deref(), Some("https://img/a.png"));

        let clear: NodeUpdate =
            serde_json::from_str(r#"{"cover_image_url": null, "external_playlist_id": null}"#)
                .unwrap();
        assert_eq!(clear.cover_image_url, Some(None));
        assert!(!clear.is_empty());
        node.apply_update(clear.clone());
        assert!(node.cover_image_url.is_none());
        assert!(node.external_playlist_id.is_none());
        assert_eq!(node.name, "B");

        // what the client sends is what the server reads back
        let wire = serde_json::to_string(&clear).unwrap();
        assert_eq!(serde_json::from_str::<NodeUpdate>(&wire).unwrap(), clear);
    }

    #[test]
    fn tree_node_flattens_node_fields() {
        let node = PlaylistNode::new(OwnerId::new("u1"), None, 0, NewNode::named("A"));
        let tree = TreeNode {
            node,
            track_count: 3,
            children: vec![],
        };
        let value = serde_json::to_value(&tree).unwrap();

        assert_eq!(value["name"], "A");
        assert_eq!(value["track_count"], 3);
    }
}
