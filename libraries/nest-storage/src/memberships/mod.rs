use crate::error::{Result, StorageError};
use nest_core::types::{MembershipId, NodeId, OwnerId, TrackMembership};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

fn from_row(row: &SqliteRow) -> Result<TrackMembership> {
    Ok(TrackMembership {
        id: row.get("id"),
        playlist_id: row.get("playlist_id"),
        external_track_id: row.get("external_track_id"),
        order: crate::order_from_column(row.get("position"))?,
        added_at: crate::timestamp_from_column(row.get("added_at"))?,
    })
}

/// Memberships of every node owned by `owner`
pub async fn list_for_owner(pool: &SqlitePool, owner: &OwnerId) -> Result<Vec<TrackMembership>> {
    let rows = sqlx::query(
        r#"
        SELECT m.id, m.playlist_id, m.external_track_id, m.position, m.added_at
        FROM track_memberships m
        INNER JOIN playlist_nodes n ON m.playlist_id = n.id
        WHERE n.owner_id = ?
        ORDER BY m.playlist_id, m.position
        "#,
    )
    .bind(owner)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Memberships owned by `root` or any node below it
pub async fn list_subtree(
    pool: &SqlitePool,
    owner: &OwnerId,
    root: &NodeId,
) -> Result<Vec<TrackMembership>> {
    let rows = sqlx::query(
        r#"
        WITH RECURSIVE subtree(id) AS (
            SELECT id FROM playlist_nodes WHERE id = ? AND owner_id = ?
            UNION
            SELECT n.id FROM playlist_nodes n
            INNER JOIN subtree s ON n.parent_id = s.id
            WHERE n.owner_id = ?
        )
        SELECT m.id, m.playlist_id, m.external_track_id, m.position, m.added_at
        FROM track_memberships m
        WHERE m.playlist_id IN (SELECT id FROM subtree)
        ORDER BY m.playlist_id, m.position
        "#,
    )
    .bind(root)
    .bind(owner)
    .bind(owner)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Playlist currently holding a membership, `None` when missing or not owned
pub(crate) async fn current_playlist(
    conn: &mut SqliteConnection,
    owner: &OwnerId,
    id: &MembershipId,
) -> Result<Option<NodeId>> {
    let row = sqlx::query(
        r#"
        SELECT m.playlist_id
        FROM track_memberships m
        INNER JOIN playlist_nodes n ON m.playlist_id = n.id
        WHERE m.id = ? AND n.owner_id = ?
        "#,
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|r| r.get("playlist_id")))
}

pub(crate) async fn insert(conn: &mut SqliteConnection, membership: &TrackMembership) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO track_memberships (id, playlist_id, external_track_id, position, added_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&membership.id)
    .bind(&membership.playlist_id)
    .bind(&membership.external_track_id)
    .bind(i64::from(membership.order))
    .bind(membership.added_at.timestamp_millis())
    .execute(conn)
    .await?;

    Ok(())
}

/// Move and/or reposition a membership; `added_at` is never rewritten
pub(crate) async fn update(
    conn: &mut SqliteConnection,
    owner: &OwnerId,
    membership: &TrackMembership,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE track_memberships
        SET playlist_id = ?, position = ?
        WHERE id = ?
          AND playlist_id IN (SELECT id FROM playlist_nodes WHERE owner_id = ?)
        "#,
    )
    .bind(&membership.playlist_id)
    .bind(i64::from(membership.order))
    .bind(&membership.id)
    .bind(owner)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::Vanished(format!("track {}", membership.id)));
    }
    Ok(())
}

pub(crate) async fn delete(
    conn: &mut SqliteConnection,
    owner: &OwnerId,
    id: &MembershipId,
) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM track_memberships
        WHERE id = ?
          AND playlist_id IN (SELECT id FROM playlist_nodes WHERE owner_id = ?)
        "#,
    )
    .bind(id)
    .bind(owner)
    .execute(conn)
    .await?;

    Ok(())
}
