//! Immutable audit records of collection operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::DocumentId;

/// Kind of operation an [`AuditEntry`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum AuditAction {
    /// Full collection fetch.
    Fetch,
    /// Date-filtered fetch.
    FetchLogs,
    /// Document insert.
    Insert,
    /// Partial document update.
    Update,
    /// Document delete.
    Delete,
}

impl AuditAction {
    /// Returns the wire name of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::FetchLogs => "fetchLogs",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// One line of the audit log.
///
/// Serialized with camelCase keys:
/// `{timestamp, collectionName, action, documentId, details}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Time the entry was created.
    pub timestamp: DateTime<Utc>,
    /// Collection the operation targeted.
    pub collection_name: String,
    /// Operation kind.
    pub action: AuditAction,
    /// Affected document, if the operation targeted one.
    #[schema(value_type = Option<String>)]
    pub document_id: Option<DocumentId>,
    /// Operation-specific payload.
    #[schema(value_type = Object)]
    pub details: Value,
}

impl AuditEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        collection_name: &str,
        action: AuditAction,
        document_id: Option<DocumentId>,
        details: Value,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            collection_name: collection_name.to_string(),
            action,
            document_id,
            details,
        }
    }
}
