//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::app_state::SharedDex;
use crate::domain::{Address, DexEvent};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<DexEvent>,
    dex: SharedDex,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &dex).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(dex_event) => {
                        if subs.matches(dex_event.caller()) {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&dex_event).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Splits raw address strings into parsed addresses, a wildcard flag and
/// the entries that failed to parse.
fn parse_addresses(raw: &[String]) -> (Vec<Address>, bool, Vec<String>) {
    let mut addresses = Vec::with_capacity(raw.len());
    let mut wildcard = false;
    let mut rejected = Vec::new();
    for s in raw {
        if s == "*" {
            wildcard = true;
        } else if let Ok(address) = s.parse::<Address>() {
            addresses.push(address);
        } else {
            rejected.push(s.clone());
        }
    }
    (addresses, wildcard, rejected)
}

/// Handles a text message from the client, returning an optional JSON response.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    dex: &SharedDex,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        let err = WsMessage::error(String::new(), 400, "malformed JSON");
        return serde_json::to_string(&err).ok();
    };

    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        let err = WsMessage::error(msg.id, 404, "unknown command");
        return serde_json::to_string(&err).ok();
    };

    let response = match command {
        WsCommand::Subscribe { addresses } => {
            let (parsed, wildcard, rejected) = parse_addresses(&addresses);
            subs.subscribe(&parsed, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": parsed.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "rejected": rejected,
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { addresses } => {
            let (parsed, wildcard, rejected) = parse_addresses(&addresses);
            subs.unsubscribe(&parsed, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": parsed.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "rejected": rejected,
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::GetState => match dex.pool_info().await {
            Ok(info) => WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::to_value(&info).unwrap_or_default(),
            ),
            Err(err) => WsMessage::error(msg.id, err.error_code(), &err.to_string()),
        },
    };
    serde_json::to_string(&response).ok()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parse_addresses_splits_wildcard_and_rejects() {
        let raw = vec![
            "*".to_string(),
            "0x0101010101010101010101010101010101010101".to_string(),
            "not-an-address".to_string(),
        ];
        let (parsed, wildcard, rejected) = parse_addresses(&raw);
        assert!(wildcard);
        assert_eq!(parsed, vec![Address::from_bytes([1u8; 20])]);
        assert_eq!(rejected, vec!["not-an-address".to_string()]);
    }
}
