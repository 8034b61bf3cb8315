use crate::error::{Result, StorageError};
use nest_core::types::{NodeId, OwnerId, PlaylistNode};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, owner_id, parent_id, position, name, icon, color, \
                       cover_image_url, external_playlist_id, created_at, updated_at";

pub(crate) fn from_row(row: &SqliteRow) -> Result<PlaylistNode> {
    Ok(PlaylistNode {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        parent_id: row.get("parent_id"),
        order: crate::order_from_column(row.get("position"))?,
        name: row.get("name"),
        icon: row.get("icon"),
        color: row.get("color"),
        cover_image_url: row.get("cover_image_url"),
        external_playlist_id: row.get("external_playlist_id"),
        created_at: crate::timestamp_from_column(row.get("created_at"))?,
        updated_at: crate::timestamp_from_column(row.get("updated_at"))?,
    })
}

/// All nodes owned by `owner`
pub async fn list_for_owner(pool: &SqlitePool, owner: &OwnerId) -> Result<Vec<PlaylistNode>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM playlist_nodes WHERE owner_id = ? ORDER BY parent_id, position"
    ))
    .bind(owner)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// `root` and every node below it, if `root` is owned by `owner`
pub async fn list_subtree(
    pool: &SqlitePool,
    owner: &OwnerId,
    root: &NodeId,
) -> Result<Vec<PlaylistNode>> {
    let rows = sqlx::query(&format!(
        r#"
        WITH RECURSIVE subtree(id) AS (
            SELECT id FROM playlist_nodes WHERE id = ? AND owner_id = ?
            UNION
            SELECT n.id FROM playlist_nodes n
            INNER JOIN subtree s ON n.parent_id = s.id
            WHERE n.owner_id = ?
        )
        SELECT {COLUMNS} FROM playlist_nodes
        WHERE id IN (SELECT id FROM subtree)
        "#
    ))
    .bind(root)
    .bind(owner)
    .bind(owner)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// One node, scoped to `owner`
pub async fn get_by_id(
    pool: &SqlitePool,
    owner: &OwnerId,
    id: &NodeId,
) -> Result<Option<PlaylistNode>> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM playlist_nodes WHERE id = ? AND owner_id = ?"
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(from_row).transpose()
}

/// Current parent of a node, `None` when the node is missing or not owned
pub(crate) async fn current_parent(
    conn: &mut SqliteConnection,
    owner: &OwnerId,
    id: &NodeId,
) -> Result<Option<Option<NodeId>>> {
    let row = sqlx::query("SELECT parent_id FROM playlist_nodes WHERE id = ? AND owner_id = ?")
        .bind(id)
        .bind(owner)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(|r| r.get::<Option<NodeId>, _>("parent_id")))
}

pub(crate) async fn insert(conn: &mut SqliteConnection, node: &PlaylistNode) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO playlist_nodes (id, owner_id, parent_id, position, name, icon, color,
                                    cover_image_url, external_playlist_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&node.id)
    .bind(&node.owner_id)
    .bind(&node.parent_id)
    .bind(i64::from(node.order))
    .bind(&node.name)
    .bind(&node.icon)
    .bind(&node.color)
    .bind(&node.cover_image_url)
    .bind(&node.external_playlist_id)
    .bind(node.created_at.timestamp_millis())
    .bind(node.updated_at.timestamp_millis())
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) async fn update(
    conn: &mut SqliteConnection,
    owner: &OwnerId,
    node: &PlaylistNode,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE playlist_nodes
        SET parent_id = ?, position = ?, name = ?, icon = ?, color = ?,
            cover_image_url = ?, external_playlist_id = ?, updated_at = ?
        WHERE id = ? AND owner_id = ?
        "#,
    )
    .bind(&node.parent_id)
    .bind(i64::from(node.order))
    .bind(&node.name)
    .bind(&node.icon)
    .bind(&node.color)
    .bind(&node.cover_image_url)
    .bind(&node.external_playlist_id)
    .bind(node.updated_at.timestamp_millis())
    .bind(&node.id)
    .bind(owner)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::Vanished(format!("playlist {}", node.id)));
    }
    Ok(())
}

/// Delete a node; descendants and their memberships go with it via cascade
pub(crate) async fn delete(conn: &mut SqliteConnection, owner: &OwnerId, id: &NodeId) -> Result<()> {
    sqlx::query("DELETE FROM playlist_nodes WHERE id = ? AND owner_id = ?")
        .bind(id)
        .bind(owner)
        .execute(conn)
        .await?;

    Ok(())
}
