//! WebSocket integration tests.

#![allow(clippy::panic)]

mod common;

use std::time::Duration;

use common::{ALICE, BOB, initialize, spawn_server};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(url: &str) -> Ws {
    let Ok((ws, _)) = connect_async(url).await else {
        panic!("ws connect failed");
    };
    ws
}

async fn send(ws: &mut Ws, id: &str, payload: serde_json::Value) {
    let envelope = json!({
        "id": id,
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": payload,
    });
    let Ok(()) = ws.send(Message::text(envelope.to_string())).await else {
        panic!("ws send failed");
    };
}

/// Next text frame as JSON, failing after five seconds.
async fn next_json(ws: &mut Ws) -> serde_json::Value {
    loop {
        let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_secs(5), ws.next()).await
        else {
            panic!("no ws message");
        };
        if let Message::Text(text) = msg {
            let Ok(value) = serde_json::from_str(text.as_str()) else {
                panic!("ws frame is not JSON: {}", text.as_str());
            };
            return value;
        }
    }
}

#[tokio::test]
async fn wildcard_subscriber_sees_domain_event_then_sync() {
    let server = spawn_server().await;
    let mut ws = connect(&server.ws_url()).await;

    send(&mut ws, "sub-1", json!({ "command": "subscribe", "addresses": ["*"] })).await;
    let ack = next_json(&mut ws).await;
    assert_eq!(ack["id"], "sub-1");
    assert_eq!(ack["type"], "response");
    assert_eq!(ack["payload"]["wildcard"], true);

    let client = reqwest::Client::new();
    initialize(&server, &client).await;

    let first = next_json(&mut ws).await;
    assert_eq!(first["type"], "event");
    assert_eq!(first["payload"]["event_type"], "pool_initialized");
    assert_eq!(first["payload"]["caller"], ALICE);
    assert_eq!(first["payload"]["shares_minted"], "100000000000000000000");

    let second = next_json(&mut ws).await;
    assert_eq!(second["payload"]["event_type"], "reserves_synced");
    assert_eq!(second["payload"]["reserve_base"], "10000000000000000000");
    assert_eq!(second["payload"]["total_shares"], "100000000000000000000");
}

#[tokio::test]
async fn events_from_other_callers_are_filtered() {
    let server = spawn_server().await;
    let mut ws = connect(&server.ws_url()).await;

    send(&mut ws, "sub", json!({ "command": "subscribe", "addresses": [BOB, "garbage"] })).await;
    let ack = next_json(&mut ws).await;
    assert_eq!(ack["payload"]["count"], 1);
    assert_eq!(ack["payload"]["rejected"], json!(["garbage"]));

    let client = reqwest::Client::new();
    initialize(&server, &client).await;

    // ALICE's events are dropped, so the state response arrives first
    send(&mut ws, "state", json!({ "command": "get_state" })).await;
    let state = next_json(&mut ws).await;
    assert_eq!(state["id"], "state");
    assert_eq!(state["type"], "response");
    assert_eq!(state["payload"]["initialized"], true);
    assert_eq!(state["payload"]["reserve_token"], "1000000000000000000000");
}

#[tokio::test]
async fn malformed_and_unknown_commands_get_errors() {
    let server = spawn_server().await;
    let mut ws = connect(&server.ws_url()).await;

    let Ok(()) = ws.send(Message::text("{not json".to_string())).await else {
        panic!("ws send failed");
    };
    let err = next_json(&mut ws).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["payload"]["code"], 400);

    send(&mut ws, "x", json!({ "command": "teleport" })).await;
    let err = next_json(&mut ws).await;
    assert_eq!(err["id"], "x");
    assert_eq!(err["payload"]["code"], 404);
}
