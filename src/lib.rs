//! # collection-gateway
//!
//! REST and WebSocket gateway over a schema-less document store.
//!
//! The service exposes named collections of JSON documents over HTTP,
//! keeps per-collection view state (snapshots, filters, a display
//! setting) in local files, records every document operation in an
//! append-only audit log, and republishes a sample of every collection to
//! connected WebSocket clients on a fixed interval.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── CollectionGateway, BroadcastPoller (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── BlobStore, AuditLog (persistence/)  → local files
//!     └── DocumentStore (store/)              → memory | PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod store;
pub mod ws;
