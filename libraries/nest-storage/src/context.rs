use crate::error::{Result, StorageError};
use crate::{memberships, nodes};
use async_trait::async_trait;
use nest_core::{
    Change, ChangeSet, Expectation, Forest, NodeId, NodeStore, OwnerId, PlaylistNode,
};
use sqlx::{SqliteConnection, SqlitePool};

/// `SQLite`-backed node store
#[derive(Debug, Clone)]
pub struct SqliteNodeStore {
    pool: SqlitePool,
}

impl SqliteNodeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn commit(&self, owner: &OwnerId, set: &ChangeSet) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        check_expectations(&mut *tx, owner, &set.expectations).await?;

        for change in &set.changes {
            match change {
                Change::InsertNode(node) => {
                    if &node.owner_id != owner {
                        return Err(StorageError::Expectation(format!(
                            "playlist {} belongs to another owner",
                            node.id
                        )));
                    }
                    nodes::insert(&mut *tx, node).await?;
                }
                Change::UpdateNode(node) => nodes::update(&mut *tx, owner, node).await?,
                Change::DeleteNode(id) => nodes::delete(&mut *tx, owner, id).await?,
                Change::InsertMembership(membership) => {
                    if nodes::current_parent(&mut *tx, owner, &membership.playlist_id)
                        .await?
                        .is_none()
                    {
                        return Err(StorageError::Vanished(format!(
                            "playlist {}",
                            membership.playlist_id
                        )));
                    }
                    memberships::insert(&mut *tx, membership).await?;
                }
                Change::UpdateMembership(membership) => {
                    memberships::update(&mut *tx, owner, membership).await?;
                }
                Change::DeleteMembership(id) => memberships::delete(&mut *tx, owner, id).await?,
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn check_expectations(
    conn: &mut SqliteConnection,
    owner: &OwnerId,
    expectations: &[Expectation],
) -> Result<()> {
    for expectation in expectations {
        match expectation {
            Expectation::MembershipIn { id, playlist_id } => {
                let actual = memberships::current_playlist(&mut *conn, owner, id).await?;
                if actual.as_ref() != Some(playlist_id) {
                    return Err(StorageError::Expectation(format!(
                        "track {} is no longer in playlist {}",
                        id, playlist_id
                    )));
                }
            }
            Expectation::NodeUnder { id, parent_id } => {
                let actual = nodes::current_parent(&mut *conn, owner, id).await?;
                if actual.as_ref() != Some(parent_id) {
                    return Err(StorageError::Expectation(format!(
                        "playlist {} moved concurrently",
                        id
                    )));
                }
            }
        }
    }
    Ok(())
}

#[async_trait]
impl NodeStore for SqliteNodeStore {
    async fn load_forest(&self, owner: &OwnerId) -> nest_core::Result<Forest> {
        let nodes = nodes::list_for_owner(&self.pool, owner).await?;
        let memberships = memberships::list_for_owner(&self.pool, owner).await?;
        Ok(Forest::from_parts(owner.clone(), nodes, memberships))
    }

    async fn load_subtree(
        &self,
        owner: &OwnerId,
        root: &NodeId,
    ) -> nest_core::Result<Option<Forest>> {
        let nodes = nodes::list_subtree(&self.pool, owner, root).await?;
        if nodes.is_empty() {
            return Ok(None);
        }
        let memberships = memberships::list_subtree(&self.pool, owner, root).await?;
        Ok(Some(Forest::from_parts(owner.clone(), nodes, memberships)))
    }

    async fn get_node(
        &self,
        owner: &OwnerId,
        id: &NodeId,
    ) -> nest_core::Result<Option<PlaylistNode>> {
        Ok(nodes::get_by_id(&self.pool, owner, id).await?)
    }

    async fn apply(&self, owner: &OwnerId, changes: &ChangeSet) -> nest_core::Result<()> {
        if changes.is_empty() && changes.expectations.is_empty() {
            return Ok(());
        }
        self.commit(owner, changes).await.map_err(|e| {
            tracing::warn!(owner = %owner, error = %e, "change set rejected");
            e.into()
        })
    }
}
