//! Local persistence: per-collection blobs and the audit log.
//!
//! Everything here lives on the local filesystem under the directories
//! configured in [`crate::config::GatewayConfig`]:
//!
//! - [`BlobStore`]: one JSON file per (kind, collection) pair, replaced
//!   atomically on every save.
//! - [`AuditLog`]: append-only JSON-lines record of gateway operations.

pub mod audit_log;
pub mod blob_store;
pub mod models;

pub use audit_log::AuditLog;
pub use blob_store::{BlobKind, BlobStore};
pub use models::{DisplaySetting, FilterData};
