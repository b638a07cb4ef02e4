//! Gateway Integration Tests
//!
//! Each test starts its own gateway on an ephemeral port; no external
//! services are needed.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use chat_core::UserId;
use integration_tests::{
    assert_json, assert_status, auth_frame, join_frame, leave_frame, typing_frame, unique_room,
    unique_user, MessageNotification, TestServer,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

const QUIET: Duration = Duration::from_millis(200);

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_internal_routes_can_be_disabled() {
    let mut config = chat_common::AppConfig::local(0);
    config.realtime.internal_ingress = false;
    let server = TestServer::start_with_config(config).await.unwrap();

    let response = server.get("/internal/stats").await.unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}

// ============================================================================
// Presence Tests
// ============================================================================

#[tokio::test]
async fn test_presence_two_devices_one_edge_each_way() {
    let server = TestServer::start().await.unwrap();
    let user = unique_user();

    let mut observer = server.connect().await.unwrap();
    let mut c1 = server.connect().await.unwrap();
    let mut c2 = server.connect().await.unwrap();
    server.wait_for_stats(|s| s["connections"] == 3).await.unwrap();

    c1.auth(&user).await.unwrap();
    let data = observer.expect_event("presence:update").await.unwrap();
    assert_eq!(data, json!({"userId": user, "isOnline": true}));

    c2.send(&auth_frame(&user)).await.unwrap();
    server
        .wait_for_stats(|s| s["boundConnections"] == 2)
        .await
        .unwrap();
    observer.expect_no_event("presence:update", QUIET).await.unwrap();

    c1.close().await.unwrap();
    server
        .wait_for_stats(|s| s["boundConnections"] == 1)
        .await
        .unwrap();
    observer.expect_no_event("presence:update", QUIET).await.unwrap();

    c2.close().await.unwrap();
    let data = observer.expect_event("presence:update").await.unwrap();
    assert_eq!(data, json!({"userId": user, "isOnline": false}));

    let stats = server.stats().await.unwrap();
    assert_eq!(stats["diagnostics"]["onlineEdges"], 1);
    assert_eq!(stats["diagnostics"]["offlineEdges"], 1);
    assert_eq!(stats["onlineUsers"], 0);
}

#[tokio::test]
async fn test_presence_updates_user_directory() {
    let server = TestServer::start().await.unwrap();
    let user = unique_user();
    let user_id = UserId::new(user.clone());

    let mut c1 = server.connect().await.unwrap();
    c1.auth(&user).await.unwrap();

    let mut online = false;
    for _ in 0..100 {
        if server.directory.get(&user_id).is_some_and(|r| r.is_online) {
            online = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(online, "directory never saw the online edge");

    c1.close().await.unwrap();
    server
        .wait_for_stats(|s| s["diagnostics"]["offlineEdges"] == 1)
        .await
        .unwrap();

    let mut offline = false;
    for _ in 0..100 {
        if server.directory.get(&user_id).is_some_and(|r| !r.is_online) {
            offline = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(offline, "directory never saw the offline edge");
}

#[tokio::test]
async fn test_directory_outage_does_not_block_presence() {
    let server = TestServer::start().await.unwrap();
    server.directory.set_unavailable(true);
    let user = unique_user();

    let mut observer = server.connect().await.unwrap();
    let mut c1 = server.connect().await.unwrap();
    server.wait_for_stats(|s| s["connections"] == 2).await.unwrap();

    c1.auth(&user).await.unwrap();
    let data = observer.expect_event("presence:update").await.unwrap();
    assert_eq!(data, json!({"userId": user, "isOnline": true}));

    server
        .wait_for_stats(|s| s["diagnostics"]["directoryFailures"] == 1)
        .await
        .unwrap();
    assert!(server.directory.get(&UserId::new(user.clone())).is_none());
}

#[tokio::test]
async fn test_presence_endpoint() {
    let server = TestServer::start().await.unwrap();
    let user = unique_user();

    let mut c1 = server.connect().await.unwrap();
    c1.auth(&user).await.unwrap();

    let response = server.get(&format!("/internal/presence/{user}")).await.unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["isOnline"], true);
    assert_eq!(body["connections"], 1);
    assert!(body["lastSeenAt"].is_string());

    let response = server.get("/internal/presence/nobody").await.unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["isOnline"], false);
    assert_eq!(body["connections"], 0);
}

// ============================================================================
// Room Fan-out Tests
// ============================================================================

#[tokio::test]
async fn test_join_then_message_reaches_only_subscribed_rooms() {
    let server = TestServer::start().await.unwrap();
    let (r1, r2, r3) = (unique_room(), unique_room(), unique_room());

    let mut c1 = server.connect().await.unwrap();
    c1.send(&join_frame(&[&r1, &r2])).await.unwrap();
    server.wait_for_stats(|s| s["subscriptions"] == 2).await.unwrap();

    let notification = MessageNotification::new(&r1, "hello");
    let response = server.post("/internal/messages/created", &notification).await.unwrap();
    let body: Value = assert_json(response, StatusCode::ACCEPTED).await.unwrap();
    assert_eq!(body["delivered"], 1);

    let data = c1.expect_event("message:new").await.unwrap();
    assert_eq!(data["message"], notification.message);

    let response = server
        .post("/internal/messages/created", &MessageNotification::new(&r3, "elsewhere"))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::ACCEPTED).await.unwrap();
    assert_eq!(body["delivered"], 0);
    c1.expect_no_event("message:new", QUIET).await.unwrap();
}

#[tokio::test]
async fn test_each_subscriber_receives_exactly_one_copy() {
    let server = TestServer::start().await.unwrap();
    let room = unique_room();

    let mut c1 = server.connect().await.unwrap();
    let mut c2 = server.connect().await.unwrap();
    let mut outsider = server.connect().await.unwrap();
    c1.send(&join_frame(&[&room])).await.unwrap();
    c2.send(&join_frame(&[&room, &room])).await.unwrap();
    server.wait_for_stats(|s| s["subscriptions"] == 2).await.unwrap();

    let response = server
        .post("/internal/messages/created", &MessageNotification::new(&room, "once"))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::ACCEPTED).await.unwrap();
    assert_eq!(body["delivered"], 2);

    for client in [&mut c1, &mut c2] {
        client.expect_event("message:new").await.unwrap();
        client.expect_no_event("message:new", QUIET).await.unwrap();
    }
    outsider.expect_no_event("message:new", QUIET).await.unwrap();
}

#[tokio::test]
async fn test_message_update_relay() {
    let server = TestServer::start().await.unwrap();
    let room = unique_room();

    let mut c1 = server.connect().await.unwrap();
    c1.send(&join_frame(&[&room])).await.unwrap();
    server.wait_for_stats(|s| s["subscriptions"] == 1).await.unwrap();

    let mut notification = MessageNotification::new(&room, "read me");
    notification.message["readBy"] = json!(["someone"]);
    let response = server.post("/internal/messages/updated", &notification).await.unwrap();
    assert_status(response, StatusCode::ACCEPTED).await.unwrap();

    let data = c1.expect_event("message:update").await.unwrap();
    assert_eq!(data["message"]["readBy"], json!(["someone"]));
}

#[tokio::test]
async fn test_leave_rooms_stops_delivery() {
    let server = TestServer::start().await.unwrap();
    let room = unique_room();

    let mut c1 = server.connect().await.unwrap();
    c1.send(&join_frame(&[&room])).await.unwrap();
    server.wait_for_stats(|s| s["activeRooms"] == 1).await.unwrap();

    c1.send(&leave_frame(&[&room])).await.unwrap();
    server.wait_for_stats(|s| s["activeRooms"] == 0).await.unwrap();

    let response = server
        .post("/internal/messages/created", &MessageNotification::new(&room, "gone"))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::ACCEPTED).await.unwrap();
    assert_eq!(body["delivered"], 0);
    c1.expect_no_event("message:new", QUIET).await.unwrap();
}

#[tokio::test]
async fn test_disconnect_removes_subscriptions() {
    let server = TestServer::start().await.unwrap();
    let room = unique_room();

    let mut c1 = server.connect().await.unwrap();
    c1.send(&join_frame(&[&room])).await.unwrap();
    server.wait_for_stats(|s| s["activeRooms"] == 1).await.unwrap();

    c1.close().await.unwrap();
    server
        .wait_for_stats(|s| s["connections"] == 0 && s["activeRooms"] == 0)
        .await
        .unwrap();

    let response = server
        .post("/internal/messages/created", &MessageNotification::new(&room, "late"))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::ACCEPTED).await.unwrap();
    assert_eq!(body["delivered"], 0);
}

// ============================================================================
// Typing Tests
// ============================================================================

#[tokio::test]
async fn test_typing_reaches_peers_but_not_sender() {
    let server = TestServer::start().await.unwrap();
    let room = unique_room();
    let user = unique_user();

    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    let mut c = server.connect().await.unwrap();
    for client in [&mut a, &mut b, &mut c] {
        client.send(&join_frame(&[&room])).await.unwrap();
    }
    server.wait_for_stats(|s| s["subscriptions"] == 3).await.unwrap();

    a.send(&typing_frame(&room, &user, true)).await.unwrap();

    for peer in [&mut b, &mut c] {
        let data = peer.expect_event("typing:update").await.unwrap();
        assert_eq!(data, json!({"roomId": room, "userId": user, "typing": true}));
    }
    a.expect_no_event("typing:update", QUIET).await.unwrap();

    a.send(&typing_frame(&room, &user, false)).await.unwrap();
    let data = b.expect_event("typing:update").await.unwrap();
    assert_eq!(data["typing"], false);
}

// ============================================================================
// Protocol Error Tests
// ============================================================================

#[tokio::test]
async fn test_malformed_frames_keep_connection_open() {
    let server = TestServer::start().await.unwrap();
    let room = unique_room();

    let mut c1 = server.connect().await.unwrap();
    c1.send_raw(Message::Text("not json".to_string())).await.unwrap();
    c1.send_raw(Message::Binary(vec![1, 2, 3])).await.unwrap();
    c1.send(&json!({"event": "message:send", "data": {}})).await.unwrap();
    c1.send(&json!({"event": "auth", "data": {}})).await.unwrap();

    c1.send(&join_frame(&[&room])).await.unwrap();
    let stats = server.wait_for_stats(|s| s["subscriptions"] == 1).await.unwrap();
    assert_eq!(stats["diagnostics"]["protocolErrors"], 4);
    assert_eq!(stats["boundConnections"], 0);

    server
        .post("/internal/messages/created", &MessageNotification::new(&room, "still here"))
        .await
        .unwrap();
    c1.expect_event("message:new").await.unwrap();
}

#[tokio::test]
async fn test_ingress_rejects_bad_bodies() {
    let server = TestServer::start().await.unwrap();

    let response = server
        .post("/internal/messages/created", &json!({"message": {}}))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(body["code"], "INVALID_INPUT");

    let response = server
        .post("/internal/messages/updated", &json!({"roomId": "", "message": {}}))
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

// ============================================================================
// Churn Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_connection_churn_settles_offline() {
    let server = TestServer::start().await.unwrap();
    let user = unique_user();

    let mut observer = server.connect().await.unwrap();
    server.wait_for_stats(|s| s["connections"] == 1).await.unwrap();

    let mut clients = Vec::new();
    for _ in 0..10 {
        let mut client = server.connect().await.unwrap();
        client.send(&auth_frame(&user)).await.unwrap();
        clients.push(client);
    }
    server
        .wait_for_stats(|s| s["boundConnections"] == 10)
        .await
        .unwrap();

    for client in clients {
        client.close().await.unwrap();
    }
    let stats = server
        .wait_for_stats(|s| s["boundConnections"] == 0 && s["onlineUsers"] == 0)
        .await
        .unwrap();
    assert_eq!(stats["diagnostics"]["onlineEdges"], 1);
    assert_eq!(stats["diagnostics"]["offlineEdges"], 1);
    assert_eq!(stats["diagnostics"]["invariantViolations"], 0);

    let first = observer.expect_event("presence:update").await.unwrap();
    let second = observer.expect_event("presence:update").await.unwrap();
    assert_eq!(first["isOnline"], true);
    assert_eq!(second["isOnline"], false);
    observer.expect_no_event("presence:update", QUIET).await.unwrap();
}
