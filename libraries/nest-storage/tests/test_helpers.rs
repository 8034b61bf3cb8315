//! Test helpers and fixtures for storage integration tests
//!
//! These helpers create test databases using REAL SQLite files (NOT in-memory)
//! so migrations, foreign keys and cascades behave as in production.

#![allow(dead_code)]

use nest_core::{MembershipId, NewNode, NoCatalog, NodeId, OwnerId, PlaylistNode, TrackMembership};
use nest_engine::MutationEngine;
use nest_storage::SqliteNodeStore;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

/// Test database wrapper that cleans up on drop
pub struct TestDb {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let pool = nest_storage::create_pool(&db_url)
            .await
            .expect("Failed to create pool");

        nest_storage::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        Self {
            pool,
            _temp_dir: temp_dir,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn store(&self) -> Arc<SqliteNodeStore> {
        Arc::new(SqliteNodeStore::new(self.pool.clone()))
    }

    /// Engine over this database with no catalog
    pub fn engine(&self) -> MutationEngine {
        MutationEngine::new(self.store(), Arc::new(NoCatalog))
    }
}

/// Test fixture: create a node through the engine
pub async fn create_test_node(
    engine: &MutationEngine,
    owner: &OwnerId,
    parent: Option<&NodeId>,
    name: &str,
) -> PlaylistNode {
    engine
        .create_node(owner, parent, NewNode::named(name))
        .await
        .expect("Failed to create node")
}

/// Test fixture: add a track through the engine
pub async fn add_test_track(
    engine: &MutationEngine,
    owner: &OwnerId,
    playlist: &NodeId,
    external_track_id: &str,
) -> TrackMembership {
    engine
        .add_track(owner, playlist, external_track_id)
        .await
        .expect("Failed to add track")
}

/// Raw position column of a membership
pub async fn membership_position(pool: &SqlitePool, id: &MembershipId) -> Option<i64> {
    sqlx::query_scalar("SELECT position FROM track_memberships WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await
        .expect("Failed to query membership")
}

/// Number of rows in a table
pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}
