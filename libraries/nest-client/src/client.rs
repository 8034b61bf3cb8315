//! HTTP client for the Nest server.

use crate::error::{ClientError, ErrorBody, Result};
use crate::reconcile::TreeRemote;
use crate::types::{
    AddTrackRequest, ClientConfig, CreatePlaylistRequest, DeleteResponse, HealthResponse,
    MoveResponse, MoveTrackRequest, RemoveResponse, ReorderRequest, ReorderResponse,
    ReparentRequest,
};
use async_trait::async_trait;
use nest_core::{
    ContainerItems, ItemRef, MembershipId, NewNode, NodeId, NodeUpdate, PlaylistNode,
    TrackListing, TrackMembership, TreeNode,
};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// Client for a Nest server.
///
/// Cheap to clone; clones share the token.
#[derive(Clone)]
pub struct NestClient {
    http: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl NestClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let parsed =
            Url::parse(&config.url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Nest/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(config.access_token)),
        })
    }

    /// Get the server URL.
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Replace the bearer token.
    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    /// Forget the bearer token.
    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self
            .token
            .read()
            .await
            .clone()
            .ok_or(ClientError::AuthRequired)?;
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "nest request");
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ClientError::ServerUnreachable(e.to_string())
            } else {
                ClientError::Request(e)
            }
        })?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ClientError::ParseError(format!("Failed to parse response: {}", e)))
        } else if status.as_u16() == 401 {
            Err(ClientError::AuthRequired)
        } else {
            let text = response.text().await.unwrap_or_default();
            let (message, kind) = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => (body.error, body.kind),
                Err(_) => (text, None),
            };
            debug!(status = status.as_u16(), kind = ?kind, "nest request failed");
            Err(ClientError::Api {
                status: status.as_u16(),
                kind,
                message,
            })
        }
    }

    async fn call<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let mut builder = self.request(method, path).await?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call::<(), T>(Method::GET, path, None).await
    }

    // ------------------------------------------------------------------
    // Endpoints
    // ------------------------------------------------------------------

    /// Check that the server is up. Does not require a token.
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);
        self.send(self.http.get(url)).await
    }

    pub async fn get_tree(&self) -> Result<Vec<TreeNode>> {
        self.get("/playlists").await
    }

    pub async fn get_playlist(&self, id: &NodeId) -> Result<PlaylistNode> {
        self.get(&format!("/playlists/{}", id)).await
    }

    pub async fn create_playlist(
        &self,
        parent_id: Option<&NodeId>,
        attrs: NewNode,
    ) -> Result<PlaylistNode> {
        let body = CreatePlaylistRequest {
            attrs,
            parent_id: parent_id.cloned(),
        };
        self.call(Method::POST, "/playlists", Some(&body)).await
    }

    pub async fn update_playlist(&self, id: &NodeId, update: &NodeUpdate) -> Result<PlaylistNode> {
        self.call(Method::PATCH, &format!("/playlists/{}", id), Some(update))
            .await
    }

    pub async fn delete_playlist(&self, id: &NodeId) -> Result<DeleteResponse> {
        self.call::<(), _>(Method::DELETE, &format!("/playlists/{}", id), None)
            .await
    }

    pub async fn reparent_playlist(
        &self,
        id: &NodeId,
        parent_id: Option<&NodeId>,
        order: Option<u32>,
    ) -> Result<PlaylistNode> {
        let body = ReparentRequest {
            parent_id: parent_id.cloned(),
            order,
        };
        self.call(Method::POST, &format!("/playlists/{}/reparent", id), Some(&body))
            .await
    }

    /// Linearized tracks of a subtree with catalog metadata
    pub async fn get_tracks(&self, id: &NodeId) -> Result<TrackListing> {
        self.get(&format!("/playlists/{}/tracks", id)).await
    }

    /// Ordered items of a node and every container below it
    pub async fn get_items(&self, id: &NodeId) -> Result<ContainerItems> {
        self.get(&format!("/playlists/{}/items", id)).await
    }

    pub async fn reorder_items(&self, id: &NodeId, items: &[ItemRef]) -> Result<ReorderResponse> {
        let body = ReorderRequest {
            items: items.to_vec(),
        };
        self.call(
            Method::PATCH,
            &format!("/playlists/{}/items/reorder", id),
            Some(&body),
        )
        .await
    }

    pub async fn add_track(&self, id: &NodeId, external_track_id: &str) -> Result<TrackMembership> {
        let body = AddTrackRequest {
            external_track_id: external_track_id.to_string(),
        };
        self.call(Method::POST, &format!("/playlists/{}/tracks", id), Some(&body))
            .await
    }

    pub async fn remove_track(&self, id: &NodeId, track: &MembershipId) -> Result<RemoveResponse> {
        self.call::<(), _>(
            Method::DELETE,
            &format!("/playlists/{}/tracks/{}", id, track),
            None,
        )
        .await
    }

    /// Move a track out of `source` (where the caller believes it lives)
    pub async fn move_track(
        &self,
        source: &NodeId,
        track: &MembershipId,
        target: &NodeId,
        order: u32,
    ) -> Result<MoveResponse> {
        let body = MoveTrackRequest {
            target_playlist_id: target.clone(),
            order,
        };
        self.call(
            Method::PATCH,
            &format!("/playlists/{}/tracks/{}/move", source, track),
            Some(&body),
        )
        .await
    }
}

#[async_trait]
impl TreeRemote for NestClient {
    async fn container_items(&self, root: &NodeId) -> Result<ContainerItems> {
        self.get_items(root).await
    }

    async fn reorder_container(&self, container: &NodeId, items: &[ItemRef]) -> Result<()> {
        self.reorder_items(container, items).await.map(|_| ())
    }

    async fn move_track(
        &self,
        track: &MembershipId,
        source: &NodeId,
        target: &NodeId,
        order: u32,
    ) -> Result<()> {
        NestClient::move_track(self, source, track, target, order)
            .await
            .map(|_| ())
    }

    async fn reparent_node(&self, node: &NodeId, parent: &NodeId, order: Option<u32>) -> Result<()> {
        self.reparent_playlist(node, Some(parent), order)
            .await
            .map(|_| ())
    }
}
