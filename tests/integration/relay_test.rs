//! Integration tests for the presence relay over real WebSockets.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

use crate::helpers::TestApp;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn ws_client(addr: SocketAddr) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("Failed to connect test WebSocket");
    ws
}

async fn send_event(ws: &mut WsClient, event: Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("Failed to send frame");
}

/// Receive the next text frame within the timeout, parsed as JSON.
async fn recv_event(ws: &mut WsClient, timeout: Duration) -> Option<Value> {
    loop {
        let frame = tokio::time::timeout(timeout, ws.next()).await.ok()??;
        match frame.ok()? {
            Message::Text(text) => return serde_json::from_str(text.as_str()).ok(),
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

/// Wait until a group's room has the expected number of subscribers.
async fn wait_for_subscribers(app: &TestApp, group_id: Uuid, expected: usize) {
    for _ in 0..100 {
        if app.engine.relay.group_subscriber_count(group_id) == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "Room for {group_id} never reached {expected} subscribers (has {})",
        app.engine.relay.group_subscriber_count(group_id)
    );
}

fn start_event(user_id: Uuid, group_id: Uuid, subject: &str) -> Value {
    json!({
        "event": "start_study_session",
        "data": {
            "userId": user_id,
            "groupId": group_id,
            "username": "ana",
            "displayName": "Ana",
            "startTime": "2025-06-01T12:00:00Z",
            "elapsedTime": 0,
            "subject": subject,
        },
    })
}

#[tokio::test]
async fn test_relay_rebroadcasts_to_room_peers_excluding_sender() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let group_id = Uuid::new_v4();

    let mut sender = ws_client(addr).await;
    let mut peer = ws_client(addr).await;

    send_event(&mut sender, json!({"event": "join_group", "data": group_id})).await;
    send_event(&mut peer, json!({"event": "join_group", "data": group_id})).await;
    wait_for_subscribers(&app, group_id, 2).await;

    let user_id = Uuid::new_v4();
    send_event(&mut sender, start_event(user_id, group_id, "biology")).await;

    let received = recv_event(&mut peer, Duration::from_secs(2))
        .await
        .expect("peer should receive the broadcast");
    assert_eq!(received["event"], "user_started_studying");
    assert_eq!(received["data"]["userId"], user_id.to_string());
    assert_eq!(received["data"]["subject"], "biology");

    // The sender must not receive its own event back.
    assert!(
        recv_event(&mut sender, Duration::from_millis(200))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_relay_scopes_events_to_their_group() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let group_a = Uuid::new_v4();
    let group_b = Uuid::new_v4();

    let mut sender = ws_client(addr).await;
    let mut outsider = ws_client(addr).await;

    send_event(&mut sender, json!({"event": "join_group", "data": group_a})).await;
    send_event(&mut outsider, json!({"event": "join_group", "data": group_b})).await;
    wait_for_subscribers(&app, group_a, 1).await;
    wait_for_subscribers(&app, group_b, 1).await;

    send_event(&mut sender, start_event(Uuid::new_v4(), group_a, "latin")).await;

    // A client that only joined group B sees nothing from group A.
    assert!(
        recv_event(&mut outsider, Duration::from_millis(300))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_timer_update_and_stop_reach_room_peers() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let group_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let mut sender = ws_client(addr).await;
    let mut peer = ws_client(addr).await;

    send_event(&mut sender, json!({"event": "join_group", "data": group_id})).await;
    send_event(&mut peer, json!({"event": "join_group", "data": group_id})).await;
    wait_for_subscribers(&app, group_id, 2).await;

    send_event(
        &mut sender,
        json!({
            "event": "study_timer_update",
            "data": {"userId": user_id, "groupId": group_id, "elapsedTime": 12},
        }),
    )
    .await;

    let tick = recv_event(&mut peer, Duration::from_secs(2)).await.unwrap();
    assert_eq!(tick["event"], "study_timer_update");
    assert_eq!(tick["data"]["elapsedTime"], 12);

    send_event(
        &mut sender,
        json!({
            "event": "end_study_session",
            "data": {
                "userId": user_id,
                "groupId": group_id,
                "totalTime": 30,
                "subject": "biology",
            },
        }),
    )
    .await;

    let stopped = recv_event(&mut peer, Duration::from_secs(2)).await.unwrap();
    assert_eq!(stopped["event"], "user_stopped_studying");
    assert_eq!(stopped["data"]["totalTime"], 30);
}

#[tokio::test]
async fn test_disconnect_cleans_room_without_offline_broadcast() {
    let app = TestApp::new();
    let addr = app.serve().await;
    let group_id = Uuid::new_v4();

    let mut leaver = ws_client(addr).await;
    let mut peer = ws_client(addr).await;

    send_event(&mut leaver, json!({"event": "join_group", "data": group_id})).await;
    send_event(&mut peer, json!({"event": "join_group", "data": group_id})).await;
    wait_for_subscribers(&app, group_id, 2).await;

    leaver.close(None).await.unwrap();
    wait_for_subscribers(&app, group_id, 1).await;

    // No "user went offline" event exists; the peer hears nothing.
    assert!(
        recv_event(&mut peer, Duration::from_millis(300))
            .await
            .is_none()
    );
}
