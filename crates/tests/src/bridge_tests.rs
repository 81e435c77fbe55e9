use crate::fixtures::mock_backend::MockBackend;
use hrsaas_model::{NewNotification, NotificationType};
use hrsaas_services::{
    CountMode, NotificationApi, NotificationBridge, NotificationStore, RealtimeClient,
    StaticToken, StoreSummary,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

async fn wait_until<F>(changes: &mut watch::Receiver<StoreSummary>, mut done: F) -> StoreSummary
where
    F: FnMut(&StoreSummary) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let summary = *changes.borrow_and_update();
            if done(&summary) {
                return summary;
            }
            changes.changed().await.expect("Store dropped");
        }
    })
    .await
    .expect("Store never reached expected state")
}

fn connected_pipeline(
    backend: &MockBackend,
    with_api: bool,
) -> (RealtimeClient, NotificationStore, NotificationBridge) {
    let settings = backend.settings();
    let tokens = Arc::new(StaticToken::new(Some("access-token".to_string())));
    let client = RealtimeClient::new(&settings, tokens.clone());
    let api = with_api.then(|| NotificationApi::new(&settings.api, tokens).unwrap());
    let store = NotificationStore::new();
    let bridge = NotificationBridge::attach(&client, store.clone(), api);
    client.connect();
    (client, store, bridge)
}

#[tokio::test]
async fn pushed_events_update_the_store() {
    let backend = MockBackend::spawn().await;
    let (_client, store, _bridge) = connected_pipeline(&backend, false);
    let mut changes = store.subscribe();
    backend.wait_for_subscriber().await;

    backend.emit(
        "notification",
        r#"{"id":"n-1","type":"APPROVAL_REQUESTED","title":"결재 요청","message":"검토 바랍니다"}"#,
    );
    backend.emit(
        "notification",
        r#"{"id":"n-2","type":"LEAVE_APPROVED","title":"휴가 승인","message":"승인되었습니다"}"#,
    );
    wait_until(&mut changes, |s| s.total == 2).await;
    assert_eq!(store.unread_count(), 2);
    assert_eq!(store.notifications()[0].id, "n-2");

    backend.emit("notification:read", "n-1");
    let summary = wait_until(&mut changes, |s| s.unread_count == 1).await;
    assert_eq!(summary.mode, CountMode::Derived);

    backend.emit("notification:count", r#"{"count":42}"#);
    let summary = wait_until(&mut changes, |s| s.unread_count == 42).await;
    assert_eq!(summary.mode, CountMode::Overridden);
}

#[tokio::test]
async fn connect_reconciles_with_the_backend() {
    let backend = MockBackend::spawn().await;
    let seeded: Vec<_> = (0..3)
        .map(|i| {
            NewNotification::new(NotificationType::Announcement, format!("공지 {i}"), "본문")
                .with_id(format!("srv-{i}"))
                .read(i == 0)
                .into_notification()
        })
        .collect();
    backend.seed(seeded, 7);

    let (_client, store, _bridge) = connected_pipeline(&backend, true);
    let mut changes = store.subscribe();

    let summary = wait_until(&mut changes, |s| s.unread_count == 7).await;
    assert_eq!(summary.total, 3);
    assert_eq!(summary.mode, CountMode::Overridden);
    assert_eq!(store.notifications()[0].id, "srv-0");
}

#[tokio::test]
async fn stream_items_survive_a_slow_reconcile() {
    let backend = MockBackend::spawn().await;
    let seeded = vec![
        NewNotification::new(NotificationType::Announcement, "공지", "본문")
            .with_id("srv-1")
            .read(true)
            .into_notification(),
    ];
    backend.seed(seeded, 1);
    *backend.state.list_delay.lock() = Some(Duration::from_millis(300));

    let (_client, store, _bridge) = connected_pipeline(&backend, true);
    let mut changes = store.subscribe();
    backend.wait_for_subscriber().await;

    backend.emit(
        "notification",
        r#"{"id":"live-1","type":"LEAVE_REQUESTED","title":"휴가 신청","message":"검토 바랍니다"}"#,
    );
    wait_until(&mut changes, |s| s.total == 1).await;

    let summary = wait_until(&mut changes, |s| s.total == 2).await;
    assert_eq!(summary.unread_count, 1);
    let ids: Vec<_> = store.notifications().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["live-1", "srv-1"]);
}

#[tokio::test]
async fn matching_server_count_keeps_derived_mode() {
    let backend = MockBackend::spawn().await;
    let seeded = vec![
        NewNotification::new(NotificationType::System, "점검", "오늘 밤")
            .with_id("srv-1")
            .into_notification(),
    ];
    backend.seed(seeded, 1);

    let (_client, store, _bridge) = connected_pipeline(&backend, true);
    let mut changes = store.subscribe();

    let summary = wait_until(&mut changes, |s| s.total == 1).await;
    assert_eq!(summary.unread_count, 1);
    // Give the count request time to land.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.count_mode(), CountMode::Derived);
}

#[tokio::test]
async fn detached_bridge_ignores_stream() {
    let backend = MockBackend::spawn().await;
    let (_client, store, bridge) = connected_pipeline(&backend, false);
    backend.wait_for_subscriber().await;

    bridge.detach();
    backend.emit("notification", r#"{"id":"n-1","title":"무시됨"}"#);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(store.is_empty());
}
