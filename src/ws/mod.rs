//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` forwards every `realTimeData` and
//! `alert` event from the bus to the client. Clients may narrow the
//! stream to selected collections with `subscribe` / `unsubscribe`
//! commands.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
