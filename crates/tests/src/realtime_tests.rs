use crate::fixtures::mock_backend::MockBackend;
use axum::http::StatusCode;
use hrsaas_services::{ConnectionState, EventKind, RealtimeClient, RealtimeEvent, StaticToken};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const ALL_KINDS: [EventKind; 10] = [
    EventKind::Connect,
    EventKind::Disconnect,
    EventKind::Error,
    EventKind::NotificationNew,
    EventKind::NotificationRead,
    EventKind::NotificationCount,
    EventKind::ApprovalStatusChanged,
    EventKind::ApprovalNewRequest,
    EventKind::AttendanceCheckedIn,
    EventKind::AttendanceCheckedOut,
];

fn client_for(backend: &MockBackend, token: Option<&str>) -> RealtimeClient {
    let tokens = Arc::new(StaticToken::new(token.map(str::to_string)));
    RealtimeClient::new(&backend.settings(), tokens)
}

fn record_all(client: &RealtimeClient) -> mpsc::UnboundedReceiver<RealtimeEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    for kind in ALL_KINDS {
        let tx = tx.clone();
        client.on(kind, move |event: &RealtimeEvent| {
            let _ = tx.send(event.clone());
        });
    }
    rx
}

async fn next(rx: &mut mpsc::UnboundedReceiver<RealtimeEvent>) -> RealtimeEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("Timed out waiting for realtime event")
        .expect("Event channel closed")
}

async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<RealtimeEvent>) {
    let extra = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(extra.is_err(), "unexpected event: {:?}", extra);
}

async fn connected(backend: &MockBackend) -> (RealtimeClient, mpsc::UnboundedReceiver<RealtimeEvent>) {
    let client = client_for(backend, Some("access-token"));
    let mut events = record_all(&client);
    client.connect();
    assert_eq!(next(&mut events).await, RealtimeEvent::Connect);
    backend.wait_for_subscriber().await;
    (client, events)
}

#[tokio::test]
async fn connect_sends_token_as_query_parameter() {
    let backend = MockBackend::spawn().await;
    let (client, _events) = connected(&backend).await;

    assert_eq!(client.state(), ConnectionState::Connected);
    assert!(client.is_connected());
    assert_eq!(
        *backend.state.sse_tokens.lock(),
        vec![Some("access-token".to_string())]
    );
}

#[tokio::test]
async fn connect_without_token_never_subscribes() {
    let backend = MockBackend::spawn().await;
    let client = client_for(&backend, None);
    let mut events = record_all(&client);

    client.connect();
    assert_quiet(&mut events).await;
    assert!(backend.state.sse_tokens.lock().is_empty());
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn second_connect_reuses_open_transport() {
    let backend = MockBackend::spawn().await;
    let (client, mut events) = connected(&backend).await;

    client.connect();
    assert_quiet(&mut events).await;
    assert_eq!(backend.state.sse_tokens.lock().len(), 1);
}

#[tokio::test]
async fn frames_become_typed_events() {
    let backend = MockBackend::spawn().await;
    let (_client, mut events) = connected(&backend).await;

    backend.emit(
        "notification",
        r#"{"id":"n-1","type":"LEAVE_APPROVED","title":"휴가 승인","message":"연차가 승인되었습니다","link":"/leave/7"}"#,
    );
    backend.emit("notification:read", r#"{"id":"n-1"}"#);
    backend.emit("notification:count", "3");
    backend.emit(
        "approval:status_changed",
        r#"{"approvalId":"appr-001","documentNumber":"APR-2024-001","title":"출장 신청","status":"APPROVED","approverName":"이영희","processedAt":"2024-01-02T09:00:00Z"}"#,
    );
    backend.emit(
        "attendance:checked_in",
        r#"{"employeeId":"e-1","employeeName":"김철수","time":"09:00","date":"2024-01-02"}"#,
    );

    let RealtimeEvent::NotificationNew(notification) = next(&mut events).await else {
        panic!("expected a new notification");
    };
    assert_eq!(notification.id, "n-1");
    assert_eq!(notification.content, "연차가 승인되었습니다");
    assert_eq!(notification.link_url.as_deref(), Some("/leave/7"));
    assert!(!notification.is_read);

    assert_eq!(
        next(&mut events).await,
        RealtimeEvent::NotificationRead("n-1".to_string())
    );
    assert_eq!(next(&mut events).await, RealtimeEvent::NotificationCount(3));

    let RealtimeEvent::ApprovalStatusChanged(status) = next(&mut events).await else {
        panic!("expected an approval status change");
    };
    assert_eq!(status.status, "APPROVED");

    let RealtimeEvent::AttendanceCheckedIn(attendance) = next(&mut events).await else {
        panic!("expected a check-in");
    };
    assert_eq!(attendance.employee_name, "김철수");
}

#[tokio::test]
async fn malformed_frames_are_dropped() {
    let backend = MockBackend::spawn().await;
    let (client, mut events) = connected(&backend).await;

    backend.emit("notification", "{not json");
    backend.emit("approval:new_request", r#"{"approvalId":"a"}"#);
    backend.emit("heartbeat", "ping");
    backend.emit("notification:count", "9");

    assert_eq!(next(&mut events).await, RealtimeEvent::NotificationCount(9));
    assert!(client.is_connected());
}

#[tokio::test]
async fn listeners_run_in_order_and_unsubscribe_individually() {
    let backend = MockBackend::spawn().await;
    let client = client_for(&backend, Some("access-token"));
    let log = Arc::new(Mutex::new(Vec::new()));

    let a_log = Arc::clone(&log);
    let a = client.on_notification(move |_| a_log.lock().push("A"));
    let b_log = Arc::clone(&log);
    let _b = client.on_notification(move |_| b_log.lock().push("B"));
    let mut events = record_all(&client);

    client.connect();
    assert_eq!(next(&mut events).await, RealtimeEvent::Connect);
    backend.wait_for_subscriber().await;

    backend.emit("notification:new", r#"{"id":"n-1","title":"첫번째"}"#);
    next(&mut events).await;
    assert_eq!(*log.lock(), vec!["A", "B"]);

    a.unsubscribe();
    backend.emit("notification:new", r#"{"id":"n-2","title":"두번째"}"#);
    next(&mut events).await;
    assert_eq!(*log.lock(), vec!["A", "B", "B"]);
}

#[tokio::test]
async fn disconnect_stops_delivery() {
    let backend = MockBackend::spawn().await;
    let (client, mut events) = connected(&backend).await;

    client.disconnect("logout");
    assert_eq!(
        next(&mut events).await,
        RealtimeEvent::Disconnect("logout".to_string())
    );
    assert_eq!(client.state(), ConnectionState::Disconnected);

    backend.emit("notification:count", "1");
    assert_quiet(&mut events).await;

    client.disconnect("again");
    assert_quiet(&mut events).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn disconnect_waits_for_frame_in_flight() {
    let backend = MockBackend::spawn().await;
    let (client, _events) = connected(&backend).await;
    let (entered_tx, mut entered_rx) = mpsc::unbounded_channel();
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&delivered);
    client.on_notification_count(move |count| {
        let _ = entered_tx.send(());
        std::thread::sleep(Duration::from_millis(200));
        sink.lock().push(count);
    });

    backend.emit("notification:count", "1");
    tokio::time::timeout(Duration::from_secs(5), entered_rx.recv())
        .await
        .expect("Frame never dispatched");
    client.disconnect("logout");
    assert_eq!(*delivered.lock(), vec![1]);

    backend.emit("notification:count", "2");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(*delivered.lock(), vec![1]);
}

#[tokio::test]
async fn listener_may_disconnect_from_callback() {
    let backend = MockBackend::spawn().await;
    let (client, mut events) = connected(&backend).await;
    let handle = client.clone();
    client.on_notification_read(move |_| handle.disconnect("read elsewhere"));

    backend.emit("notification:read", "n-1");
    assert_eq!(
        next(&mut events).await,
        RealtimeEvent::NotificationRead("n-1".to_string())
    );
    assert_eq!(
        next(&mut events).await,
        RealtimeEvent::Disconnect("read elsewhere".to_string())
    );
    assert_eq!(client.state(), ConnectionState::Disconnected);

    backend.emit("notification:read", "n-2");
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn server_close_is_a_disconnect_without_error() {
    let backend = MockBackend::spawn().await;
    let (client, mut events) = connected(&backend).await;

    backend.close_stream();
    assert_eq!(
        next(&mut events).await,
        RealtimeEvent::Disconnect("server closed stream".to_string())
    );
    assert_quiet(&mut events).await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn rejected_subscription_reports_error_only() {
    let backend = MockBackend::spawn().await;
    *backend.state.sse_status.lock() = Some(StatusCode::UNAUTHORIZED);
    let client = client_for(&backend, Some("expired"));
    let mut events = record_all(&client);

    client.connect();
    let RealtimeEvent::Error(message) = next(&mut events).await else {
        panic!("expected an error event");
    };
    assert!(message.contains("401"), "{message}");
    assert_quiet(&mut events).await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn reconnect_after_disconnect_opens_a_new_stream() {
    let backend = MockBackend::spawn().await;
    let (client, mut events) = connected(&backend).await;

    client.disconnect("logout");
    next(&mut events).await;

    client.connect();
    assert_eq!(next(&mut events).await, RealtimeEvent::Connect);
    assert_eq!(backend.state.sse_tokens.lock().len(), 2);
}
