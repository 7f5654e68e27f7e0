//! Domain layer: documents, collection rules, audit records, and the
//! event bus.
//!
//! This module contains the server-side domain model: document identity
//! and payloads, the fixed per-collection field rules, audit entries, and
//! the broadcast bus carrying live updates to subscribers.

pub mod audit_entry;
pub mod bus_event;
pub mod collection_rules;
pub mod document;
pub mod document_id;
pub mod event_bus;

pub use audit_entry::{AuditAction, AuditEntry};
pub use bus_event::BusEvent;
pub use collection_rules::{DateRange, GroupTotal};
pub use document::Document;
pub use document_id::DocumentId;
pub use event_bus::{EventBus, SubscriberId, Subscription};
