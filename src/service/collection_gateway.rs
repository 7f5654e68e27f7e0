//! Collection gateway: mediates document operations and records audits.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Value, json};

use crate::domain::collection_rules::{
    GROUP_FIELD, SUM_FIELD, TOP_GROUP_LIMIT, timestamp_field,
};
use crate::domain::document::strip_id;
use crate::domain::{AuditAction, AuditEntry, DateRange, Document, DocumentId, GroupTotal};
use crate::error::GatewayError;
use crate::persistence::{AuditLog, BlobKind, BlobStore};
use crate::store::{DocumentStore, FindFilter};

/// Result of [`CollectionGateway::top_aggregates`].
#[derive(Debug, Clone, PartialEq)]
pub struct TopAggregates {
    /// Number of documents in the collection, regardless of grouping.
    pub total_records: u64,
    /// Largest groups by summed value, descending.
    pub top_groups: Vec<GroupTotal>,
}

/// Orchestration layer for all document operations.
///
/// Owns the [`DocumentStore`] for data and the [`AuditLog`] for the
/// operation record. Every fetching or mutating method follows the
/// pattern: call the store → on success append one audit entry → return
/// the store's result.
///
/// Audit writes are best-effort. A failed append is logged at `error` on
/// the `audit` target and counted in [`Self::audit_failures`]; it never
/// changes the result of the operation that triggered it.
#[derive(Debug)]
pub struct CollectionGateway {
    store: Arc<dyn DocumentStore>,
    audit_log: Arc<AuditLog>,
    audit_failures: AtomicU64,
}

impl CollectionGateway {
    /// Creates a new `CollectionGateway`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, audit_log: Arc<AuditLog>) -> Self {
        Self {
            store,
            audit_log,
            audit_failures: AtomicU64::new(0),
        }
    }

    /// Returns a reference to the inner [`AuditLog`].
    #[must_use]
    pub fn audit_log(&self) -> &Arc<AuditLog> {
        &self.audit_log
    }

    /// Number of audit appends that failed since startup.
    #[must_use]
    pub fn audit_failures(&self) -> u64 {
        self.audit_failures.load(Ordering::Relaxed)
    }

    /// Returns the names of all collections currently in the store.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on store failure.
    pub async fn list_collections(&self) -> Result<Vec<String>, GatewayError> {
        self.store.list_collection_names().await
    }

    /// Returns the first `limit` documents of `name` in store order.
    /// Not audited.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on store failure.
    pub async fn sample(&self, name: &str, limit: usize) -> Result<Vec<Document>, GatewayError> {
        self.store.find(name, FindFilter::first(limit)).await
    }

    /// Returns every document in `name`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on store failure.
    pub async fn fetch_all(&self, name: &str) -> Result<Vec<Document>, GatewayError> {
        let docs = self.read_all(name).await?;
        self.record_fetch(name, docs.len()).await;
        Ok(docs)
    }

    /// Returns every document in `name` and replaces the collection's local
    /// snapshot in `blobs` with them.
    ///
    /// The fetch is audited only after the snapshot is written.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on store failure,
    /// [`GatewayError::InvalidRequest`] for an unusable name, or
    /// [`GatewayError::PersistenceError`] if the snapshot cannot be written.
    pub async fn fetch_and_snapshot(
        &self,
        name: &str,
        blobs: &BlobStore,
    ) -> Result<Vec<Document>, GatewayError> {
        let docs = self.read_all(name).await?;
        blobs.save(BlobKind::Snapshot, name, &docs).await?;
        self.record_fetch(name, docs.len()).await;
        Ok(docs)
    }

    async fn read_all(&self, name: &str) -> Result<Vec<Document>, GatewayError> {
        let docs = self.store.find(name, FindFilter::all()).await?;
        tracing::info!(collection = name, count = docs.len(), "collection fetched");
        Ok(docs)
    }

    async fn record_fetch(&self, name: &str, count: usize) {
        self.record(AuditEntry::new(
            name,
            AuditAction::Fetch,
            None,
            json!({ "fetchedCount": count }),
        ))
        .await;
    }

    /// Returns the documents of `name` whose collection-specific timestamp
    /// field falls in `range`, or every document when `range` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on store failure.
    pub async fn fetch_filtered(
        &self,
        name: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<Document>, GatewayError> {
        let filter = match range {
            Some(range) => FindFilter::dated(timestamp_field(name), range),
            None => FindFilter::all(),
        };
        let docs = self.store.find(name, filter).await?;
        tracing::info!(collection = name, count = docs.len(), "logs fetched");
        self.record(AuditEntry::new(
            name,
            AuditAction::FetchLogs,
            None,
            json!({ "fetchedLogsCount": docs.len() }),
        ))
        .await;
        Ok(docs)
    }

    /// Inserts `document` and returns its newly assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on store failure.
    pub async fn insert(&self, name: &str, document: Document) -> Result<DocumentId, GatewayError> {
        let document = strip_id(document);
        let details = Value::Object(document.clone());
        let id = self.store.insert(name, document).await?;
        tracing::info!(collection = name, document_id = %id, "document inserted");
        self.record(AuditEntry::new(name, AuditAction::Insert, Some(id), details))
            .await;
        Ok(id)
    }

    /// Merges the fields of `partial` into document `id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DocumentNotFound`] if no document matched
    /// (nothing is audited then), or [`GatewayError::StoreUnavailable`] on
    /// store failure.
    pub async fn update(
        &self,
        name: &str,
        id: DocumentId,
        partial: Document,
    ) -> Result<(), GatewayError> {
        if !self.store.update(name, id, &partial).await? {
            return Err(GatewayError::DocumentNotFound {
                collection: name.to_string(),
                id: id.to_string(),
            });
        }
        tracing::info!(collection = name, document_id = %id, "document updated");
        self.record(AuditEntry::new(
            name,
            AuditAction::Update,
            Some(id),
            Value::Object(partial),
        ))
        .await;
        Ok(())
    }

    /// Removes document `id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DocumentNotFound`] if no document matched
    /// (nothing is audited then), or [`GatewayError::StoreUnavailable`] on
    /// store failure.
    pub async fn delete(&self, name: &str, id: DocumentId) -> Result<(), GatewayError> {
        if !self.store.delete(name, id).await? {
            return Err(GatewayError::DocumentNotFound {
                collection: name.to_string(),
                id: id.to_string(),
            });
        }
        tracing::info!(collection = name, document_id = %id, "document deleted");
        self.record(AuditEntry::new(name, AuditAction::Delete, Some(id), json!({})))
            .await;
        Ok(())
    }

    /// Groups `name` by `createdBy`, sums `sales`, and returns the five
    /// largest groups plus the total document count.
    ///
    /// Equal sums keep the order in which each group first appears in the
    /// store's enumeration; that order is stable but otherwise unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on store failure.
    pub async fn top_aggregates(&self, name: &str) -> Result<TopAggregates, GatewayError> {
        let top_groups = self
            .store
            .top_groups(name, GROUP_FIELD, SUM_FIELD, TOP_GROUP_LIMIT)
            .await?;
        let total_records = self.store.count(name).await?;
        Ok(TopAggregates {
            total_records,
            top_groups,
        })
    }

    /// Appends an audit entry without letting a failure escape.
    async fn record(&self, entry: AuditEntry) {
        if let Err(err) = self.audit_log.append(&entry).await {
            self.audit_failures.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                target: "audit",
                collection = %entry.collection_name,
                action = entry.action.as_str(),
                error = %err,
                "audit entry lost"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::document::ID_FIELD;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        map
    }

    fn make_gateway() -> (tempfile::TempDir, CollectionGateway) {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let audit_log = Arc::new(AuditLog::in_folder(dir.path()));
        let gateway = CollectionGateway::new(Arc::new(MemoryStore::new()), audit_log);
        (dir, gateway)
    }

    async fn actions(gateway: &CollectionGateway, name: &str) -> Vec<AuditEntry> {
        gateway.audit_log().query(name, None).await.unwrap_or_default()
    }

    #[tokio::test]
    async fn insert_is_fetched_once_and_audited_once() {
        let (_dir, gateway) = make_gateway();
        let Ok(id) = gateway.insert("orders", doc(json!({"name": "A"}))).await else {
            panic!("insert failed");
        };

        let Ok(docs) = gateway.fetch_all("orders").await else {
            panic!("fetch failed");
        };
        let matching = docs
            .iter()
            .filter(|d| d.get(ID_FIELD) == Some(&json!(id.to_string())))
            .count();
        assert_eq!(matching, 1);

        let inserts: Vec<AuditEntry> = actions(&gateway, "orders")
            .await
            .into_iter()
            .filter(|e| e.action == AuditAction::Insert)
            .collect();
        assert_eq!(inserts.len(), 1);
        assert_eq!(inserts.first().and_then(|e| e.document_id), Some(id));
        assert_eq!(inserts.first().map(|e| e.details.clone()), Some(json!({"name": "A"})));
    }

    #[tokio::test]
    async fn client_supplied_id_is_not_audited() {
        let (_dir, gateway) = make_gateway();
        let Ok(id) = gateway
            .insert("orders", doc(json!({"_id": "forged", "name": "A"})))
            .await
        else {
            panic!("insert failed");
        };

        let entries = actions(&gateway, "orders").await;
        let Some(insert) = entries.first() else {
            panic!("no audit entry");
        };
        assert_eq!(insert.document_id, Some(id));
        assert_eq!(insert.details, json!({"name": "A"}));
    }

    #[tokio::test]
    async fn snapshot_is_written_before_fetch_is_audited() {
        let (dir, gateway) = make_gateway();
        let blobs = BlobStore::new(
            dir.path().join("local"),
            dir.path().join("changes"),
            dir.path().join("saved"),
        );
        if blobs.ensure_dirs().await.is_err() {
            panic!("cannot create data dirs");
        }
        let _ = gateway.insert("orders", doc(json!({"name": "A"}))).await;

        let Ok(docs) = gateway.fetch_and_snapshot("orders", &blobs).await else {
            panic!("fetch failed");
        };
        let saved: Vec<Document> = blobs
            .load(BlobKind::Snapshot, "orders")
            .await
            .unwrap_or_default();
        assert_eq!(saved, docs);

        let recorded: Vec<AuditAction> =
            actions(&gateway, "orders").await.iter().map(|e| e.action).collect();
        assert_eq!(recorded, vec![AuditAction::Insert, AuditAction::Fetch]);
    }

    #[tokio::test]
    async fn failed_snapshot_leaves_no_fetch_entry() {
        let (dir, gateway) = make_gateway();
        // the snapshot folder is a regular file, so every save fails
        let local = dir.path().join("local");
        if tokio::fs::write(&local, b"").await.is_err() {
            panic!("cannot create file");
        }
        let blobs = BlobStore::new(local, dir.path().join("changes"), dir.path().join("saved"));
        let _ = gateway.insert("orders", doc(json!({"name": "A"}))).await;

        let fetched = gateway.fetch_and_snapshot("orders", &blobs).await;
        assert!(matches!(fetched, Err(GatewayError::PersistenceError(_))));

        let recorded: Vec<AuditAction> =
            actions(&gateway, "orders").await.iter().map(|e| e.action).collect();
        assert_eq!(recorded, vec![AuditAction::Insert]);
        assert_eq!(gateway.audit_failures(), 0);
    }

    #[tokio::test]
    async fn crud_scenario() {
        let (_dir, gateway) = make_gateway();
        let Ok(id) = gateway.insert("orders", doc(json!({"name": "A"}))).await else {
            panic!("insert failed");
        };
        let id_value = json!(id.to_string());

        let docs = gateway.fetch_all("orders").await.unwrap_or_default();
        assert_eq!(docs, vec![doc(json!({"_id": id_value, "name": "A"}))]);

        assert!(gateway.update("orders", id, doc(json!({"name": "B"}))).await.is_ok());
        let docs = gateway.fetch_all("orders").await.unwrap_or_default();
        assert_eq!(docs, vec![doc(json!({"_id": id_value, "name": "B"}))]);

        assert!(gateway.delete("orders", id).await.is_ok());
        let docs = gateway.fetch_all("orders").await;
        assert!(matches!(docs, Ok(ref d) if d.is_empty()));

        let again = gateway.delete("orders", id).await;
        assert!(matches!(again, Err(GatewayError::DocumentNotFound { .. })));
    }

    #[tokio::test]
    async fn missing_ids_are_not_found_and_not_audited() {
        let (_dir, gateway) = make_gateway();
        let _ = gateway.insert("orders", doc(json!({"name": "A"}))).await;
        let before = actions(&gateway, "orders").await.len();

        let missing = DocumentId::new();
        let update = gateway.update("orders", missing, doc(json!({"x": 1}))).await;
        let delete = gateway.delete("orders", missing).await;
        assert!(matches!(update, Err(GatewayError::DocumentNotFound { .. })));
        assert!(matches!(delete, Err(GatewayError::DocumentNotFound { .. })));

        assert_eq!(actions(&gateway, "orders").await.len(), before);
    }

    #[tokio::test]
    async fn every_successful_operation_writes_one_entry() {
        let (_dir, gateway) = make_gateway();
        let Ok(id) = gateway.insert("orders", doc(json!({"created": "2024-03-01T10:00:00Z"}))).await
        else {
            panic!("insert failed");
        };
        let _ = gateway.fetch_all("orders").await;
        let _ = gateway.fetch_filtered("orders", None).await;
        let _ = gateway.update("orders", id, doc(json!({"n": 1}))).await;
        let _ = gateway.delete("orders", id).await;

        let recorded: Vec<AuditAction> =
            actions(&gateway, "orders").await.iter().map(|e| e.action).collect();
        assert_eq!(
            recorded,
            vec![
                AuditAction::Insert,
                AuditAction::Fetch,
                AuditAction::FetchLogs,
                AuditAction::Update,
                AuditAction::Delete,
            ]
        );
    }

    #[tokio::test]
    async fn fetch_details_carry_counts() {
        let (_dir, gateway) = make_gateway();
        let _ = gateway.insert("orders", Document::new()).await;
        let _ = gateway.insert("orders", Document::new()).await;
        let _ = gateway.fetch_all("orders").await;
        let _ = gateway.fetch_filtered("orders", None).await;

        let entries = actions(&gateway, "orders").await;
        let fetch = entries.iter().find(|e| e.action == AuditAction::Fetch);
        let logs = entries.iter().find(|e| e.action == AuditAction::FetchLogs);
        assert_eq!(fetch.map(|e| e.details.clone()), Some(json!({"fetchedCount": 2})));
        assert_eq!(logs.map(|e| e.details.clone()), Some(json!({"fetchedLogsCount": 2})));
    }

    #[tokio::test]
    async fn fetch_filtered_uses_collection_timestamp_field() {
        let (_dir, gateway) = make_gateway();
        let _ = gateway
            .insert("purchaseorders", doc(json!({"PODate": "2024-03-01T10:00:00Z"})))
            .await;
        let _ = gateway
            .insert("purchaseorders", doc(json!({"created": "2024-03-01T10:00:00Z"})))
            .await;
        let _ = gateway
            .insert("orders", doc(json!({"created": "2024-03-01T10:00:00Z"})))
            .await;
        let _ = gateway
            .insert("orders", doc(json!({"created": "2024-02-28T10:00:00Z"})))
            .await;

        let Ok(range) = DateRange::parse_day("2024-03-01") else {
            panic!("valid day");
        };
        let po = gateway.fetch_filtered("purchaseorders", Some(range)).await.unwrap_or_default();
        assert_eq!(po.len(), 1);
        assert!(po.first().is_some_and(|d| d.contains_key("PODate")));

        let orders = gateway.fetch_filtered("orders", Some(range)).await.unwrap_or_default();
        assert_eq!(orders.len(), 1);
    }

    #[tokio::test]
    async fn top_aggregates_returns_five_groups_and_full_count() {
        let (_dir, gateway) = make_gateway();
        for (who, sales) in [("a", 50), ("b", 30), ("c", 30), ("d", 10), ("e", 5), ("f", 1)] {
            let _ = gateway
                .insert("orders", doc(json!({"createdBy": who, "sales": sales})))
                .await;
        }
        let _ = gateway.insert("orders", doc(json!({"createdBy": "a"}))).await;

        let Ok(result) = gateway.top_aggregates("orders").await else {
            panic!("aggregate failed");
        };
        assert_eq!(result.total_records, 7);
        assert_eq!(result.top_groups.len(), 5);
        let totals: Vec<f64> = result.top_groups.iter().map(|g| g.total).collect();
        assert!(totals.windows(2).all(|w| matches!(w, [a, b] if a >= b)));
        assert_eq!(totals, vec![50.0, 30.0, 30.0, 10.0, 5.0]);
    }

    #[tokio::test]
    async fn audit_failure_does_not_fail_operation() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        // the log path is a directory, so every append fails
        let audit_log = Arc::new(AuditLog::new(dir.path()));
        let gateway = CollectionGateway::new(Arc::new(MemoryStore::new()), audit_log);

        let inserted = gateway.insert("orders", doc(json!({"name": "A"}))).await;
        assert!(inserted.is_ok());
        let fetched = gateway.fetch_all("orders").await;
        assert!(matches!(fetched, Ok(ref d) if d.len() == 1));
        assert_eq!(gateway.audit_failures(), 2);
    }

    #[tokio::test]
    async fn sample_is_not_audited() {
        let (_dir, gateway) = make_gateway();
        for i in 0..12 {
            let _ = gateway.insert("orders", doc(json!({"n": i}))).await;
        }
        let before = actions(&gateway, "orders").await.len();
        let sample = gateway.sample("orders", 10).await.unwrap_or_default();
        assert_eq!(sample.len(), 10);
        assert_eq!(actions(&gateway, "orders").await.len(), before);
    }
}
