//! Integration tests for the SQLite node store
//!
//! Tests:
//! - Forest and subtree loading with owner scoping
//! - Change-set atomicity and expectation checks
//! - Cascade delete through foreign keys
//! - The full engine walkthrough persisted to disk

mod test_helpers;

use nest_core::{
    Change, ChangeSet, ErrorKind, Expectation, ItemRef, NestError, NewNode, NodeId, NodeStore,
    OwnerId, PlaylistNode, TrackMembership,
};
use test_helpers::*;

#[tokio::test]
async fn test_round_trip_preserves_fields() {
    let test_db = TestDb::new().await;
    let store = test_db.store();
    let owner = OwnerId::new("alice");

    let mut node = PlaylistNode::new(
        owner.clone(),
        None,
        0,
        NewNode {
            name: "Late night".to_string(),
            icon: Some("🌙".to_string()),
            cover_image_url: Some("https://img.example/cover.png".to_string()),
            external_playlist_id: Some("37i9dQZF1DX4sWSpwq3LiO".to_string()),
            ..NewNode::default()
        },
    );
    node.id = NodeId::new("late-night");
    let track = TrackMembership::new(node.id.clone(), "4uLU6hMCjMI75M1A2tKUQC", 0);

    let mut set = ChangeSet::new();
    set.push(Change::InsertNode(node.clone()));
    set.push(Change::InsertMembership(track.clone()));
    store.apply(&owner, &set).await.unwrap();

    let loaded = store.get_node(&owner, &node.id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "Late night");
    assert_eq!(loaded.icon, "🌙");
    assert_eq!(loaded.color, nest_core::DEFAULT_COLOR);
    assert_eq!(loaded.external_playlist_id, node.external_playlist_id);
    assert_eq!(
        loaded.created_at.timestamp_millis(),
        node.created_at.timestamp_millis()
    );

    let forest = store.load_forest(&owner).await.unwrap();
    let m = forest.membership(&track.id).unwrap();
    assert_eq!(m.external_track_id, "4uLU6hMCjMI75M1A2tKUQC");
    assert_eq!(m.added_at.timestamp_millis(), track.added_at.timestamp_millis());
}

#[tokio::test]
async fn test_owner_scoping() {
    let test_db = TestDb::new().await;
    let engine = test_db.engine();
    let store = test_db.store();
    let alice = OwnerId::new("alice");
    let bob = OwnerId::new("bob");

    let root = create_test_node(&engine, &alice, None, "mine").await;
    add_test_track(&engine, &alice, &root.id, "ext").await;

    assert!(store.get_node(&bob, &root.id).await.unwrap().is_none());
    assert!(store.load_subtree(&bob, &root.id).await.unwrap().is_none());
    let bobs = store.load_forest(&bob).await.unwrap();
    assert_eq!(bobs.node_count(), 0);
    assert_eq!(bobs.membership_count(), 0);

    let err = engine.delete_node(&bob, &root.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(count_rows(test_db.pool(), "playlist_nodes").await, 1);
}

#[tokio::test]
async fn test_subtree_query_is_recursive() {
    let test_db = TestDb::new().await;
    let engine = test_db.engine();
    let store = test_db.store();
    let owner = OwnerId::new("alice");

    let root = create_test_node(&engine, &owner, None, "root").await;
    let a = create_test_node(&engine, &owner, Some(&root.id), "a").await;
    let b = create_test_node(&engine, &owner, Some(&a.id), "b").await;
    let c = create_test_node(&engine, &owner, Some(&b.id), "c").await;
    let sibling = create_test_node(&engine, &owner, Some(&root.id), "sibling").await;
    add_test_track(&engine, &owner, &c.id, "deep").await;
    add_test_track(&engine, &owner, &sibling.id, "aside").await;

    let sub = store.load_subtree(&owner, &a.id).await.unwrap().unwrap();
    assert_eq!(sub.node_count(), 3);
    assert_eq!(sub.membership_count(), 1);
    assert!(!sub.contains_node(&sibling.id));
}

#[tokio::test]
async fn test_failed_expectation_writes_nothing() {
    let test_db = TestDb::new().await;
    let engine = test_db.engine();
    let store = test_db.store();
    let owner = OwnerId::new("alice");

    let left = create_test_node(&engine, &owner, None, "left").await;
    let right = create_test_node(&engine, &owner, None, "right").await;
    let track = add_test_track(&engine, &owner, &left.id, "ext").await;

    let mut moved = track.clone();
    moved.playlist_id = right.id.clone();
    let mut set = ChangeSet::new();
    set.expect(Expectation::MembershipIn {
        id: track.id.clone(),
        playlist_id: right.id.clone(),
    });
    set.push(Change::UpdateMembership(moved));

    let err = store.apply(&owner, &set).await.unwrap_err();
    assert!(matches!(err, NestError::Conflict(_)));

    let forest = store.load_forest(&owner).await.unwrap();
    assert_eq!(forest.membership(&track.id).unwrap().playlist_id, left.id);
}

#[tokio::test]
async fn test_mid_commit_failure_rolls_back() {
    let test_db = TestDb::new().await;
    let store = test_db.store();
    let owner = OwnerId::new("alice");

    let node = PlaylistNode::new(owner.clone(), None, 0, NewNode::named("kept?"));
    let mut ghost = node.clone();
    ghost.id = NodeId::new("never-inserted");

    let mut set = ChangeSet::new();
    set.push(Change::InsertNode(node.clone()));
    set.push(Change::UpdateNode(ghost));

    assert!(store.apply(&owner, &set).await.is_err());
    assert!(store.get_node(&owner, &node.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_walkthrough_persists() {
    let test_db = TestDb::new().await;
    let engine = test_db.engine();
    let owner = OwnerId::new("alice");

    let r = create_test_node(&engine, &owner, None, "R").await;
    let a = create_test_node(&engine, &owner, Some(&r.id), "A").await;
    let b = create_test_node(&engine, &owner, Some(&r.id), "B").await;
    let t1 = add_test_track(&engine, &owner, &a.id, "ext-1").await;
    let t2 = add_test_track(&engine, &owner, &r.id, "ext-2").await;
    assert_eq!(t2.order, 2);

    let ids: Vec<_> = engine
        .linearized_tracks(&owner, &r.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.membership.id)
        .collect();
    assert_eq!(ids, vec![t1.id.clone(), t2.id.clone()]);

    let err = engine
        .reparent_node(&owner, &r.id, Some(&a.id), None)
        .await
        .unwrap_err();
    assert!(matches!(err, NestError::CyclicReparent { .. }));

    engine.delete_node(&owner, &a.id).await.unwrap();
    assert_eq!(membership_position(test_db.pool(), &t1.id).await, None);
    assert_eq!(membership_position(test_db.pool(), &t2.id).await, Some(1));
    assert_eq!(count_rows(test_db.pool(), "playlist_nodes").await, 2);

    engine.move_track(&owner, &t2.id, &r.id, &b.id, 0).await.unwrap();
    let err = engine
        .move_track(&owner, &t2.id, &r.id, &b.id, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, NestError::StaleSource { .. }));

    let items = engine.container_items(&owner, &r.id).await.unwrap();
    assert_eq!(items[&r.id], vec![ItemRef::Node(b.id.clone())]);
    assert_eq!(items[&b.id], vec![ItemRef::Track(t2.id.clone())]);

    let store = test_db.store();
    let forest = store.load_forest(&owner).await.unwrap();
    assert!(forest.violations().is_empty());
}

#[tokio::test]
async fn test_foreign_key_cascade() {
    let test_db = TestDb::new().await;
    let engine = test_db.engine();
    let owner = OwnerId::new("alice");

    let root = create_test_node(&engine, &owner, None, "root").await;
    let child = create_test_node(&engine, &owner, Some(&root.id), "child").await;
    add_test_track(&engine, &owner, &child.id, "x").await;

    // Bypass the engine: the schema alone must not leave orphans behind
    sqlx::query("DELETE FROM playlist_nodes WHERE id = ?")
        .bind(root.id.as_str())
        .execute(test_db.pool())
        .await
        .unwrap();

    assert_eq!(count_rows(test_db.pool(), "playlist_nodes").await, 0);
    assert_eq!(count_rows(test_db.pool(), "track_memberships").await, 0);
}
