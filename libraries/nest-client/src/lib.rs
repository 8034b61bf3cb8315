//! Nest Client
//!
//! HTTP client for the Nest server plus the optimistic reconciliation layer
//! used by drag-and-drop front ends.
//!
//! # Features
//!
//! - **Tree API**: playlists, reparenting, tracks, container items
//! - **Reconciliation**: speculative drag state with full rollback on failure
//!
//! # Example
//!
//! ```ignore
//! use nest_client::{ClientConfig, DropTarget, NestClient, Reconciler};
//! use nest_core::{ItemRef, NodeId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NestClient::new(ClientConfig::with_token("http://localhost:3001", "jwt"))?;
//!
//!     let root = NodeId::new("road-trip");
//!     let mut mirror = Reconciler::new(client, root.clone());
//!     mirror.refresh().await?;
//!
//!     let item = mirror.items(&root)[0].clone();
//!     mirror.drag_start(item);
//!     let outcome = mirror.drop_on(&DropTarget::Container(root)).await;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

mod client;
mod error;
pub mod reconcile;
mod types;

pub use client::NestClient;
pub use error::{ClientError, Result};
pub use reconcile::{
    DragState, DropOutcome, DropTarget, Reconciler, ShadowState, Snapshot, TreeRemote,
};
pub use types::{
    AddTrackRequest, ClientConfig, CreatePlaylistRequest, DeleteResponse, HealthResponse,
    MoveResponse, MoveTrackRequest, RemoveResponse, ReorderRequest, ReorderResponse,
    ReparentRequest,
};
