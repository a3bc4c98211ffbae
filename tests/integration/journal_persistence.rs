//! Restart behavior: persistent comments survive, memory-only ones do not

use std::time::Duration;

use pretty_assertions::assert_eq;
use status_comments::actors::comments::CommentHandle;
use status_comments::journal::sqlite::SqliteJournal;
use status_comments::registry::{EntityRef, EntityRegistry, HostRef};
use tokio::sync::broadcast;

use crate::helpers::*;

const IDLE_SWEEP: Duration = Duration::from_secs(3600);

async fn spawn_with_registry(
    db_path: &std::path::Path,
    registry: EntityRegistry,
) -> CommentHandle {
    let journal = SqliteJournal::new(db_path).await.unwrap();
    let (event_tx, _) = broadcast::channel(256);
    CommentHandle::spawn(registry, Some(Box::new(journal)), IDLE_SWEEP, event_tx)
        .await
        .unwrap()
}

async fn spawn_with_sqlite(db_path: &std::path::Path) -> CommentHandle {
    spawn_with_registry(db_path, create_test_registry()).await
}

#[tokio::test]
async fn test_persistent_comments_survive_restart() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("comments.db");

    let persistent_id;
    {
        let handle = spawn_with_sqlite(&db_path).await;

        let persistent = handle
            .add_comment(create_persistent_request(EntityRef::Service(http_service())))
            .await
            .unwrap();
        persistent_id = persistent.id();

        // Memory-only comment, must not come back
        handle
            .add_comment(create_comment_request(EntityRef::Host(web_host())))
            .await
            .unwrap();

        assert_eq!(handle.list_comments(None).await.unwrap().len(), 2);
        handle.shutdown().await.unwrap();
    }

    // "Restart": fresh actor over the same database
    let handle = spawn_with_sqlite(&db_path).await;

    let restored = handle.list_comments(None).await.unwrap();
    assert_eq!(restored.len(), 1);

    let comment = &restored[0];
    assert_eq!(comment.id(), persistent_id);
    assert_eq!(comment.author(), "alice");
    assert_eq!(comment.text(), "investigating outage");
    assert!(comment.persistent());
    assert!(comment.applies_to_service());
    assert_eq!(comment.service(), Some(&http_service()));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_identities_continue_above_restored_ones() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("comments.db");

    let old_id;
    {
        let handle = spawn_with_sqlite(&db_path).await;
        let comment = handle
            .add_comment(create_persistent_request(EntityRef::Host(web_host())))
            .await
            .unwrap();
        old_id = comment.id();
        handle.shutdown().await.unwrap();
    }

    let handle = spawn_with_sqlite(&db_path).await;
    let new_comment = handle
        .add_comment(create_comment_request(EntityRef::Host(web_host())))
        .await
        .unwrap();

    assert!(new_comment.id() > old_id, "restored identity was reused");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_deleted_persistent_comment_stays_deleted() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("comments.db");

    {
        let handle = spawn_with_sqlite(&db_path).await;
        let comment = handle
            .add_comment(create_persistent_request(EntityRef::Host(web_host())))
            .await
            .unwrap();
        handle.delete_comment(comment.id()).await.unwrap();
        handle.shutdown().await.unwrap();
    }

    let handle = spawn_with_sqlite(&db_path).await;
    assert!(handle.list_comments(None).await.unwrap().is_empty());
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_restored_comments_on_missing_entities_are_discarded() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("comments.db");

    {
        let handle = spawn_with_sqlite(&db_path).await;
        handle
            .add_comment(create_persistent_request(EntityRef::Service(http_service())))
            .await
            .unwrap();
        handle.shutdown().await.unwrap();
    }

    // web-01 is gone from the startup config this time around
    {
        let mut registry = EntityRegistry::new();
        registry.add_host(HostRef::new("db-01"), None);

        let handle = spawn_with_registry(&db_path, registry).await;
        assert!(handle.list_comments(None).await.unwrap().is_empty());
        handle.shutdown().await.unwrap();
    }

    // The journal row was purged too, so bringing web-01 back does not
    // resurrect the comment
    let handle = spawn_with_sqlite(&db_path).await;
    assert!(handle.list_comments(None).await.unwrap().is_empty());
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_entity_removal_purges_journal() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("comments.db");

    {
        let handle = spawn_with_sqlite(&db_path).await;
        handle
            .add_comment(create_persistent_request(EntityRef::Service(http_service())))
            .await
            .unwrap();
        let dropped = handle.remove_host(web_host()).await.unwrap();
        assert_eq!(dropped, 1);
        handle.shutdown().await.unwrap();
    }

    // The journaled comment died with its host and must not be restored
    let handle = spawn_with_sqlite(&db_path).await;
    assert!(handle.list_comments(None).await.unwrap().is_empty());
    handle.shutdown().await.unwrap();
}
