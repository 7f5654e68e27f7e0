//! Document DTOs for fetch, insert and dashboard operations.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Document, DocumentId, GroupTotal};
use crate::service::TopAggregates;

/// Response body for `GET /fetch-collection/{collection}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct FetchCollectionResponse {
    /// Summary such as `"Fetched 3 documents."`.
    pub message: String,
    /// Every document in the collection.
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Document>,
}

impl FetchCollectionResponse {
    /// Builds the response with a count message.
    #[must_use]
    pub fn new(data: Vec<Document>) -> Self {
        Self {
            message: format!("Fetched {} documents.", data.len()),
            data,
        }
    }
}

/// Response body for `POST /insert-document/{collection}` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertDocumentResponse {
    /// Always `"Document inserted."`.
    pub message: String,
    /// Id assigned by the store.
    #[schema(value_type = String, format = Uuid)]
    pub document_id: DocumentId,
}

/// Response body for `GET /dashboard-metrics/{collection}`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetricsResponse {
    /// Number of documents in the collection.
    pub total_records: u64,
    /// Five largest `createdBy` groups by summed `sales`.
    pub top_users: Vec<GroupTotal>,
}

impl From<TopAggregates> for DashboardMetricsResponse {
    fn from(aggregates: TopAggregates) -> Self {
        Self {
            total_records: aggregates.total_records,
            top_users: aggregates.top_groups,
        }
    }
}
