//! Nest Engine
//!
//! Owner-scoped operations over nested playlist forests: create, rename,
//! reparent, cascade delete, mixed reordering, cross-container track moves,
//! plus tree, linearization and container-item reads.
//!
//! The engine is the only writer. It checks every tree invariant against the
//! forest as loaded, then hands the store a single atomic change set.
//!
//! # Example
//!
//! ```rust
//! use nest_core::{MemoryNodeStore, NewNode, NoCatalog, OwnerId};
//! use nest_engine::MutationEngine;
//! use std::sync::Arc;
//!
//! # async fn example() -> nest_core::Result<()> {
//! let engine = MutationEngine::new(Arc::new(MemoryNodeStore::new()), Arc::new(NoCatalog));
//! let owner = OwnerId::new("alice");
//!
//! let root = engine.create_node(&owner, None, NewNode::named("Chill")).await?;
//! engine.add_track(&owner, &root.id, "4uLU6hMCjMI75M1A2tKUQC").await?;
//!
//! let tracks = engine.linearized_tracks(&owner, &root.id).await?;
//! assert_eq!(tracks.len(), 1);
//! # Ok(())
//! # }
//! ```

mod engine;
mod locks;

pub use engine::{Deleted, Moved, MutationEngine, Removed, Reordered};
pub use locks::OwnerLocks;
