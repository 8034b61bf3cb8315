mod ids;
mod item;
mod membership;
mod node;

pub use ids::{MembershipId, NodeId, OwnerId};
pub use item::{ContainerItems, ItemRef};
pub use membership::{EnrichedTrack, LinearizedTrack, TrackListing, TrackMembership, TrackMetadata};
pub use node::{
    NewNode, NodeUpdate, PlaylistNode, TreeNode, DEFAULT_COLOR, DEFAULT_ICON, MAX_NAME_LEN,
};
