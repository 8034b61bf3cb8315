/// Common test utilities and fixtures
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use nest_core::OwnerId;
use nest_engine::MutationEngine;
use nest_server::{api, AppState, AuthService, HttpCatalog};
use nest_storage::SqliteNodeStore;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key";

/// Router over a real SQLite file; the directory lives as long as the app
pub struct TestApp {
    pub router: Router,
    pub auth: Arc<AuthService>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("nest.db").display());
        let pool = nest_storage::create_pool(&url).await.unwrap();
        nest_storage::run_migrations(&pool).await.unwrap();

        // No token configured: every lookup reports the catalog unavailable
        let catalog =
            HttpCatalog::new("http://127.0.0.1:1", None, Duration::from_secs(1)).unwrap();
        let engine = Arc::new(MutationEngine::new(
            Arc::new(SqliteNodeStore::new(pool)),
            Arc::new(catalog),
        ));
        let auth = Arc::new(AuthService::new(TEST_SECRET.to_string(), 1));

        Self {
            router: api::router(AppState::new(engine, Arc::clone(&auth))),
            auth,
            _dir: dir,
        }
    }

    pub fn token(&self, owner: &str) -> String {
        self.auth
            .create_access_token(&OwnerId::new(owner))
            .unwrap()
    }

    /// Send one request; the body is decoded as JSON (`Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    /// Create a playlist as `token`, returning its id
    pub async fn create(&self, token: &str, name: &str, parent: Option<&str>) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/playlists",
                Some(token),
                Some(serde_json::json!({ "name": name, "parent_id": parent })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Add a track as `token`, returning the membership id
    pub async fn add_track(&self, token: &str, playlist: &str, external: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                &format!("/api/playlists/{}/tracks", playlist),
                Some(token),
                Some(serde_json::json!({ "external_track_id": external })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add track failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }
}
