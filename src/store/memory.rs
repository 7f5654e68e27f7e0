//! In-process document store with per-collection fine-grained locking.
//!
//! [`MemoryStore`] keeps every collection in a `HashMap` where each
//! collection is individually protected by a [`tokio::sync::RwLock`]. This
//! allows concurrent reads of the same collection and concurrent writes to
//! different collections.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DocumentStore, FindFilter};
use crate::domain::collection_rules::document_in_range;
use crate::domain::document::{merge_fields, strip_id, with_id};
use crate::domain::{Document, DocumentId};
use crate::error::GatewayError;

/// One stored document. The body never contains `_id`.
#[derive(Debug, Clone)]
struct StoredDocument {
    id: DocumentId,
    body: Document,
}

/// Documents of one collection in insertion order.
type Collection = Vec<StoredDocument>;

/// Document store held entirely in memory.
///
/// Uses a `RwLock<HashMap<...>>` for the outer map and per-collection
/// `Arc<RwLock<Collection>>` for fine-grained locking.
///
/// # Concurrency
///
/// - Multiple tasks may read the same collection concurrently.
/// - Writes to different collections are concurrent.
/// - Writes to the same collection are serialized.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Arc<RwLock<Collection>>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a whole collection. Returns `false` if it did not exist.
    pub async fn drop_collection(&self, name: &str) -> bool {
        self.collections.write().await.remove(name).is_some()
    }

    async fn get(&self, name: &str) -> Option<Arc<RwLock<Collection>>> {
        self.collections.read().await.get(name).map(Arc::clone)
    }

    async fn get_or_create(&self, name: &str) -> Arc<RwLock<Collection>> {
        if let Some(existing) = self.get(name).await {
            return existing;
        }
        let mut map = self.collections.write().await;
        Arc::clone(map.entry(name.to_string()).or_default())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_collection_names(&self) -> Result<Vec<String>, GatewayError> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn find(
        &self,
        collection: &str,
        filter: FindFilter<'_>,
    ) -> Result<Vec<Document>, GatewayError> {
        let Some(lock) = self.get(collection).await else {
            return Ok(Vec::new());
        };
        let docs = lock.read().await;
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(docs
            .iter()
            .filter(|d| match &filter.date {
                Some((field, range)) => document_in_range(&d.body, field, range),
                None => true,
            })
            .take(limit)
            .map(|d| with_id(d.id, &d.body))
            .collect())
    }

    async fn insert(&self, collection: &str, body: Document) -> Result<DocumentId, GatewayError> {
        let id = DocumentId::new();
        let lock = self.get_or_create(collection).await;
        lock.write().await.push(StoredDocument {
            id,
            body: strip_id(body),
        });
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: DocumentId,
        partial: &Document,
    ) -> Result<bool, GatewayError> {
        let Some(lock) = self.get(collection).await else {
            return Ok(false);
        };
        let mut docs = lock.write().await;
        match docs.iter_mut().find(|d| d.id == id) {
            Some(doc) => {
                merge_fields(&mut doc.body, partial);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: &str, id: DocumentId) -> Result<bool, GatewayError> {
        let Some(lock) = self.get(collection).await else {
            return Ok(false);
        };
        let mut docs = lock.write().await;
        match docs.iter().position(|d| d.id == id) {
            Some(pos) => {
                docs.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self, collection: &str) -> Result<u64, GatewayError> {
        let Some(lock) = self.get(collection).await else {
            return Ok(0);
        };
        Ok(lock.read().await.len() as u64)
    }
}
