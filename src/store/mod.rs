//! Document store abstraction and its backends.
//!
//! [`DocumentStore`] is the seam between the gateway and whatever holds the
//! documents. It supports CRUD by id, date-filtered finds, a group-and-sum
//! aggregation, and enumeration of all collection names. Two backends are
//! provided:
//!
//! - [`MemoryStore`]: in-process, per-collection locking. Used by tests and
//!   by `DOCUMENT_STORE=memory`.
//! - [`PostgresStore`]: one JSONB row per document via `sqlx::PgPool`.
//!
//! Only single-document atomicity is assumed; no method spans a
//! transaction across calls.

pub mod memory;
pub mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::collection_rules::top_groups;
use crate::domain::{DateRange, Document, DocumentId, GroupTotal};
use crate::error::GatewayError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Optional restriction applied by [`DocumentStore::find`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FindFilter<'a> {
    /// Keep only documents whose `field` timestamp lies in `range`.
    pub date: Option<(&'a str, DateRange)>,
    /// Return at most this many documents.
    pub limit: Option<usize>,
}

impl<'a> FindFilter<'a> {
    /// Matches every document.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            date: None,
            limit: None,
        }
    }

    /// First `limit` documents in store order.
    #[must_use]
    pub const fn first(limit: usize) -> Self {
        Self {
            date: None,
            limit: Some(limit),
        }
    }

    /// Documents whose `field` timestamp falls in `range`.
    #[must_use]
    pub const fn dated(field: &'a str, range: DateRange) -> Self {
        Self {
            date: Some((field, range)),
            limit: None,
        }
    }
}

/// Backend holding named collections of schema-less documents.
///
/// Every returned document carries its id under `_id`. Enumeration order
/// is the store's natural order and is stable between calls as long as
/// the collection is not modified.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Returns the names of every collection currently in the store.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store cannot be
    /// reached.
    async fn list_collection_names(&self) -> Result<Vec<String>, GatewayError>;

    /// Returns the documents of `collection` matching `filter`.
    ///
    /// An unknown collection yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on backend failure.
    async fn find(
        &self,
        collection: &str,
        filter: FindFilter<'_>,
    ) -> Result<Vec<Document>, GatewayError>;

    /// Stores `body` under a freshly assigned id, creating the collection
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on backend failure.
    async fn insert(&self, collection: &str, body: Document) -> Result<DocumentId, GatewayError>;

    /// Writes the fields of `partial` into the document `id`.
    ///
    /// Returns `false` when no document matched.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on backend failure.
    async fn update(
        &self,
        collection: &str,
        id: DocumentId,
        partial: &Document,
    ) -> Result<bool, GatewayError>;

    /// Removes the document `id`. Returns `false` when no document matched.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on backend failure.
    async fn delete(&self, collection: &str, id: DocumentId) -> Result<bool, GatewayError>;

    /// Counts the documents in `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on backend failure.
    async fn count(&self, collection: &str) -> Result<u64, GatewayError>;

    /// Groups `collection` by `group_field`, sums `sum_field` (missing or
    /// non-numeric counts as zero), and returns the `limit` largest groups
    /// in descending order. Ties keep first-appearance order.
    ///
    /// The default implementation aggregates in process over [`Self::find`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on backend failure.
    async fn top_groups(
        &self,
        collection: &str,
        group_field: &str,
        sum_field: &str,
        limit: usize,
    ) -> Result<Vec<GroupTotal>, GatewayError> {
        let docs = self.find(collection, FindFilter::all()).await?;
        Ok(top_groups(&docs, group_field, sum_field, limit))
    }
}
