//! Nest Core
//!
//! Domain model for nested playlists: an owner's forest of playlist nodes in
//! which tracks and sub-playlists share one order space per container.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `PlaylistNode`, `TrackMembership`, `ItemRef`, ids
//! - **Forest**: an id-keyed arena with ordered container views and diffing
//! - **Guard**: pure invariant checks (cycles, order, reorder sets, names)
//! - **Linearizer**: depth-first flattening of a subtree into tracks
//! - **Collaborator traits**: `NodeStore`, `TrackCatalog`
//! - **Error Handling**: unified `NestError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use nest_core::{linearize, Forest, NewNode, OwnerId, PlaylistNode, TrackMembership};
//!
//! let owner = OwnerId::new("alice");
//! let mut forest = Forest::new(owner.clone());
//!
//! let road_trip = PlaylistNode::new(owner, None, 0, NewNode::named("Road trip"));
//! let id = road_trip.id.clone();
//! forest.insert_node(road_trip);
//! forest.insert_membership(TrackMembership::new(id.clone(), "4uLU6hMCjMI75M1A2tKUQC", 0));
//!
//! let tracks = linearize(&forest, &id).unwrap();
//! assert_eq!(tracks.len(), 1);
//! assert_eq!(tracks[0].source_container_name, "Road trip");
//! ```

#![forbid(unsafe_code)]

pub mod changes;
pub mod error;
pub mod forest;
pub mod guard;
pub mod linearize;
pub mod storage;
pub mod traits;
pub mod types;

pub use changes::{Change, ChangeSet, Expectation};
pub use error::{ErrorKind, NestError, Result};
pub use forest::Forest;
pub use linearize::linearize;
pub use storage::{MemoryNodeStore, NodeStore};
pub use traits::{NoCatalog, TrackCatalog};

pub use types::{
    ContainerItems, EnrichedTrack, ItemRef, LinearizedTrack, MembershipId, NewNode, NodeId,
    NodeUpdate, OwnerId, PlaylistNode, TrackListing, TrackMembership, TrackMetadata, TreeNode,
    DEFAULT_COLOR, DEFAULT_ICON, MAX_NAME_LEN,
};
