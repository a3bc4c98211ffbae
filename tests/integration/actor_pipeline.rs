//! Integration tests for the comment actor
//!
//! These drive the full front end: commands through the handle, events out
//! of the broadcast channel, expiry via the sweep, entity removal dropping
//! dependent comments.

use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;
use status_comments::actors::comments::CommentHandle;
use status_comments::actors::messages::{CommentEvent, RemovalReason};
use status_comments::journal::memory::MemoryJournal;
use status_comments::registry::{EntityRef, HostRef};
use tokio::sync::broadcast;

use crate::helpers::*;

/// Long interval so only explicit sweep_now calls sweep
const IDLE_SWEEP: Duration = Duration::from_secs(3600);

async fn spawn_with_events() -> (CommentHandle, broadcast::Receiver<CommentEvent>) {
    let (event_tx, event_rx) = broadcast::channel(256);
    let handle = CommentHandle::spawn(
        create_test_registry(),
        Some(Box::new(MemoryJournal::new())),
        IDLE_SWEEP,
        event_tx,
    )
    .await
    .unwrap();
    (handle, event_rx)
}

#[tokio::test]
async fn test_add_list_delete_round_trip() {
    let (handle, _event_rx) = spawn_with_events().await;

    let host_entity = EntityRef::Host(web_host());
    let service_entity = EntityRef::Service(http_service());

    let host_comment = handle
        .add_comment(create_comment_request(host_entity.clone()))
        .await
        .unwrap();
    let service_comment = handle
        .add_comment(create_comment_request(service_entity.clone()))
        .await
        .unwrap();

    // Listing is exact per entity
    let for_host = handle.list_comments(Some(host_entity)).await.unwrap();
    assert_eq!(for_host.len(), 1);
    assert_eq!(for_host[0].id(), host_comment.id());

    let for_service = handle.list_comments(Some(service_entity)).await.unwrap();
    assert_eq!(for_service.len(), 1);
    assert_eq!(for_service[0].id(), service_comment.id());

    let all = handle.list_comments(None).await.unwrap();
    assert_eq!(all.len(), 2);

    // Delete by identity
    let removed = handle.delete_comment(host_comment.id()).await.unwrap();
    assert_eq!(removed.id(), host_comment.id());
    assert!(handle.get_comment(host_comment.id()).await.unwrap().is_none());
    assert_eq!(handle.list_comments(None).await.unwrap().len(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_events_are_published() {
    let (handle, mut event_rx) = spawn_with_events().await;

    let comment = handle
        .add_comment(create_comment_request(EntityRef::Host(web_host())))
        .await
        .unwrap();

    match event_rx.recv().await.unwrap() {
        CommentEvent::Added(added) => assert_eq!(added.id(), comment.id()),
        other => panic!("expected Added event, got {other:?}"),
    }

    handle.delete_comment(comment.id()).await.unwrap();

    match event_rx.recv().await.unwrap() {
        CommentEvent::Removed { comment: removed, reason } => {
            assert_eq!(removed.id(), comment.id());
            assert_eq!(reason, RemovalReason::Deleted);
        }
        other => panic!("expected Removed event, got {other:?}"),
    }

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sweep_removes_expired_comments() {
    let (handle, mut event_rx) = spawn_with_events().await;
    let entity = EntityRef::Host(web_host());

    let expiring = handle
        .add_comment(create_expiring_request(
            entity.clone(),
            Utc::now() + chrono::Duration::milliseconds(50),
        ))
        .await
        .unwrap();
    handle
        .add_comment(create_comment_request(entity))
        .await
        .unwrap();

    // Not expired yet
    assert_eq!(handle.sweep_now().await.unwrap(), 0);

    tokio::time::sleep(Duration::from_millis(80)).await;

    let swept = handle.sweep_now().await.unwrap();
    assert_eq!(swept, 1);
    assert!(handle.get_comment(expiring.id()).await.unwrap().is_none());

    // The sweep published a Removed event with the Expired reason
    let _added = event_rx.recv().await.unwrap();
    let _added = event_rx.recv().await.unwrap();
    match event_rx.recv().await.unwrap() {
        CommentEvent::Removed { comment, reason } => {
            assert_eq!(comment.id(), expiring.id());
            assert_eq!(reason, RemovalReason::Expired);
        }
        other => panic!("expected Removed event, got {other:?}"),
    }

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.swept_total, 1);
    assert_eq!(stats.live_comments, 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_host_removal_drops_dependent_comments() {
    let (handle, _event_rx) = spawn_with_events().await;

    let host_comment = handle
        .add_comment(create_comment_request(EntityRef::Host(web_host())))
        .await
        .unwrap();
    let service_comment = handle
        .add_comment(create_comment_request(EntityRef::Service(http_service())))
        .await
        .unwrap();
    let unrelated = handle
        .add_comment(create_comment_request(EntityRef::Host(HostRef::new(
            "db-01",
        ))))
        .await
        .unwrap();

    let dropped = handle.remove_host(web_host()).await.unwrap();
    assert_eq!(dropped, 2);

    // Lookup by identity reports not-found for the dead comments
    assert!(handle.get_comment(host_comment.id()).await.unwrap().is_none());
    assert!(
        handle
            .get_comment(service_comment.id())
            .await
            .unwrap()
            .is_none()
    );
    assert!(handle.get_comment(unrelated.id()).await.unwrap().is_some());

    // The host is gone: new comments on it are rejected
    let result = handle
        .add_comment(create_comment_request(EntityRef::Host(web_host())))
        .await;
    assert!(result.is_err());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_service_removal_is_scoped() {
    let (handle, _event_rx) = spawn_with_events().await;

    let host_comment = handle
        .add_comment(create_comment_request(EntityRef::Host(web_host())))
        .await
        .unwrap();
    let service_comment = handle
        .add_comment(create_comment_request(EntityRef::Service(http_service())))
        .await
        .unwrap();

    let dropped = handle.remove_service(http_service()).await.unwrap();
    assert_eq!(dropped, 1);

    assert!(
        handle
            .get_comment(service_comment.id())
            .await
            .unwrap()
            .is_none()
    );
    assert!(handle.get_comment(host_comment.id()).await.unwrap().is_some());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_registering_entities_at_runtime() {
    let (handle, _event_rx) = spawn_with_events().await;

    let new_host = HostRef::new("cache-01");
    assert!(handle.add_host(new_host.clone(), None).await.unwrap());
    // Second registration of the same name is reported
    assert!(!handle.add_host(new_host.clone(), None).await.unwrap());

    let service = status_comments::registry::ServiceRef::new(new_host.clone(), "Redis");
    handle.add_service(service.clone(), None).await.unwrap();

    let comment = handle
        .add_comment(create_comment_request(EntityRef::Service(service)))
        .await
        .unwrap();
    assert!(comment.applies_to_service());
    assert_eq!(comment.host(), &new_host);

    // A service on an unknown host is rejected
    let orphan = status_comments::registry::ServiceRef::new(HostRef::new("ghost"), "DNS");
    assert!(handle.add_service(orphan, None).await.is_err());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_periodic_sweep_runs_without_commands() {
    let (event_tx, mut event_rx) = broadcast::channel(256);
    let handle = CommentHandle::spawn(
        create_test_registry(),
        None,
        Duration::from_millis(50),
        event_tx,
    )
    .await
    .unwrap();

    handle
        .add_comment(create_expiring_request(
            EntityRef::Host(web_host()),
            Utc::now() + chrono::Duration::milliseconds(20),
        ))
        .await
        .unwrap();

    let _added = event_rx.recv().await.unwrap();

    // No explicit sweep; the interval timer must pick it up
    let removed = tokio::time::timeout(Duration::from_secs(2), event_rx.recv())
        .await
        .expect("sweep never ran")
        .unwrap();

    match removed {
        CommentEvent::Removed { reason, .. } => assert_eq!(reason, RemovalReason::Expired),
        other => panic!("expected Removed event, got {other:?}"),
    }

    handle.shutdown().await.unwrap();
}
