//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{EventBus, Subscription};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the bus [`Subscription`] to the client.
///
/// The subscription is returned to the bus when the loop ends.
pub async fn run_connection(socket: WebSocket, mut subscription: Subscription, event_bus: EventBus) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();
    tracing::debug!(subscriber = subscription.id(), "ws connection opened");

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs);
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = subscription.recv() => {
                match event {
                    Ok(bus_event) => {
                        if subs.matches(bus_event.collection()) {
                            let json = serde_json::to_string(&WsMessage::event(&bus_event))
                                .unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            subscriber = subscription.id(),
                            lagged = n,
                            "ws client lagged behind event bus"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    let id = subscription.id();
    event_bus.unsubscribe(subscription);
    tracing::debug!(subscriber = id, "ws connection closed");
}

/// Handles a text message from the client, returning an optional JSON response.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return error_response(String::new(), 400, "malformed JSON");
    };

    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return error_response(msg.id, 404, "unknown command");
    };

    let payload = match command {
        WsCommand::Subscribe { collections } => {
            subs.subscribe(&collections);
            json!({
                "subscribed": collections,
                "selected": subs.selected(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::Unsubscribe { collections } => {
            subs.unsubscribe(&collections);
            json!({
                "unsubscribed": collections,
                "selected": subs.selected(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
    };
    serde_json::to_string(&WsMessage::server(msg.id, WsMessageType::Response, payload)).ok()
}

fn error_response(id: String, code: u16, message: &str) -> Option<String> {
    let err = WsMessage::server(
        id,
        WsMessageType::Error,
        json!({
            "code": code,
            "message": message,
        }),
    );
    serde_json::to_string(&err).ok()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn parse(response: Option<String>) -> WsMessage {
        let Some(text) = response else {
            panic!("expected a response");
        };
        let Ok(msg) = serde_json::from_str::<WsMessage>(&text) else {
            panic!("response is not an envelope");
        };
        msg
    }

    fn command(id: &str, payload: serde_json::Value) -> String {
        json!({
            "id": id,
            "type": "command",
            "timestamp": "2024-03-01T00:00:00Z",
            "payload": payload,
        })
        .to_string()
    }

    #[test]
    fn malformed_json_gets_error() {
        let mut subs = SubscriptionManager::new();
        let msg = parse(handle_text_message("{not json", &mut subs));
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload.get("code"), Some(&json!(400)));
    }

    #[test]
    fn subscribe_narrows_and_echoes_id() {
        let mut subs = SubscriptionManager::new();
        let text = command("c1", json!({"command": "subscribe", "collections": ["orders"]}));
        let msg = parse(handle_text_message(&text, &mut subs));
        assert_eq!(msg.id, "c1");
        assert_eq!(msg.msg_type, WsMessageType::Response);
        assert_eq!(msg.payload.get("wildcard"), Some(&json!(false)));
        assert!(subs.matches("orders"));
        assert!(!subs.matches("users"));
    }

    #[test]
    fn unknown_command_is_rejected() {
        let mut subs = SubscriptionManager::new();
        let text = command("c2", json!({"command": "rename"}));
        let msg = parse(handle_text_message(&text, &mut subs));
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload.get("code"), Some(&json!(404)));
        assert!(subs.is_subscribed_all());
    }
}
