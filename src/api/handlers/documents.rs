//! Document handlers: fetch, filter, aggregate, insert, update, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    DashboardMetricsResponse, DateQuery, FetchCollectionResponse, InsertDocumentResponse,
    MessageResponse,
};
use crate::app_state::AppState;
use crate::domain::collection_rules::validate_collection_name;
use crate::domain::{Document, DocumentId};
use crate::error::{ErrorResponse, GatewayError};

/// `GET /fetch-logs/{collection}`: Documents of one day, or all of them.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed date and
/// [`GatewayError::StoreUnavailable`] on store failure.
#[utoipa::path(
    get,
    path = "/fetch-logs/{collection}",
    tag = "Documents",
    summary = "Fetch documents by day",
    description = "Returns the documents whose timestamp field (`PODate` for `purchaseorders`, `created` otherwise) falls on `selectedDate` (UTC). Without a date every document is returned.",
    params(
        ("collection" = String, Path, description = "Collection name"),
        DateQuery,
    ),
    responses(
        (status = 200, description = "Matching documents", body = Vec<serde_json::Value>),
        (status = 400, description = "Malformed date", body = ErrorResponse),
        (status = 503, description = "Document store unavailable", body = ErrorResponse),
    )
)]
pub async fn fetch_logs(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let range = query.range()?;
    let docs = state.gateway.fetch_filtered(&collection, range).await?;
    Ok(Json(docs))
}

/// `GET /dashboard-metrics/{collection}`: Record count and top users.
///
/// # Errors
///
/// Returns [`GatewayError::StoreUnavailable`] on store failure.
#[utoipa::path(
    get,
    path = "/dashboard-metrics/{collection}",
    tag = "Documents",
    summary = "Dashboard metrics",
    description = "Groups the collection by `createdBy`, sums `sales`, and returns the five largest groups with the total document count.",
    params(
        ("collection" = String, Path, description = "Collection name"),
    ),
    responses(
        (status = 200, description = "Metrics", body = DashboardMetricsResponse),
        (status = 503, description = "Document store unavailable", body = ErrorResponse),
    )
)]
pub async fn dashboard_metrics(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let aggregates = state.gateway.top_aggregates(&collection).await?;
    Ok(Json(DashboardMetricsResponse::from(aggregates)))
}

/// `GET /fetch-collection/{collection}`: All documents, also saved as
/// the local snapshot.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for an unusable name,
/// [`GatewayError::StoreUnavailable`] on store failure and
/// [`GatewayError::PersistenceError`] if the snapshot cannot be written.
#[utoipa::path(
    get,
    path = "/fetch-collection/{collection}",
    tag = "Documents",
    summary = "Fetch a collection",
    description = "Returns every document and replaces the collection's local snapshot with them.",
    params(
        ("collection" = String, Path, description = "Collection name"),
    ),
    responses(
        (status = 200, description = "All documents", body = FetchCollectionResponse),
        (status = 400, description = "Invalid collection name", body = ErrorResponse),
        (status = 500, description = "Snapshot write failed", body = ErrorResponse),
        (status = 503, description = "Document store unavailable", body = ErrorResponse),
    )
)]
pub async fn fetch_collection(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    validate_collection_name(&collection)?;
    let docs = state
        .gateway
        .fetch_and_snapshot(&collection, &state.blobs)
        .await?;
    Ok(Json(FetchCollectionResponse::new(docs)))
}

/// `POST /insert-document/{collection}`: Insert one document.
///
/// # Errors
///
/// Returns [`GatewayError::StoreUnavailable`] on store failure.
#[utoipa::path(
    post,
    path = "/insert-document/{collection}",
    tag = "Documents",
    summary = "Insert a document",
    description = "Stores the JSON object body under a new id. Any `_id` in the body is ignored.",
    params(
        ("collection" = String, Path, description = "Collection name"),
    ),
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Document inserted", body = InsertDocumentResponse),
        (status = 503, description = "Document store unavailable", body = ErrorResponse),
    )
)]
pub async fn insert_document(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Document>,
) -> Result<impl IntoResponse, GatewayError> {
    let document_id = state.gateway.insert(&collection, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(InsertDocumentResponse {
            message: "Document inserted.".to_string(),
            document_id,
        }),
    ))
}

/// `PUT /update-document/{collection}/{id}`: Merge fields into a document.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed id,
/// [`GatewayError::DocumentNotFound`] if the id is absent and
/// [`GatewayError::StoreUnavailable`] on store failure.
#[utoipa::path(
    put,
    path = "/update-document/{collection}/{id}",
    tag = "Documents",
    summary = "Update a document",
    description = "Sets every field of the body on the document. Fields not in the body are kept.",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = uuid::Uuid, Path, description = "Document id"),
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Document updated", body = MessageResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 503, description = "Document store unavailable", body = ErrorResponse),
    )
)]
pub async fn update_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(partial): Json<Document>,
) -> Result<impl IntoResponse, GatewayError> {
    let id: DocumentId = id.parse()?;
    state.gateway.update(&collection, id, partial).await?;
    Ok(Json(MessageResponse::new("Document updated successfully.")))
}

/// `DELETE /delete-document/{collection}/{id}`: Remove a document.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed id,
/// [`GatewayError::DocumentNotFound`] if the id is absent and
/// [`GatewayError::StoreUnavailable`] on store failure.
#[utoipa::path(
    delete,
    path = "/delete-document/{collection}/{id}",
    tag = "Documents",
    summary = "Delete a document",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = uuid::Uuid, Path, description = "Document id"),
    ),
    responses(
        (status = 200, description = "Document deleted", body = MessageResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 503, description = "Document store unavailable", body = ErrorResponse),
    )
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    let id: DocumentId = id.parse()?;
    state.gateway.delete(&collection, id).await?;
    Ok(Json(MessageResponse::new("Document deleted successfully.")))
}

/// Document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fetch-logs/{collection}", get(fetch_logs))
        .route("/dashboard-metrics/{collection}", get(dashboard_metrics))
        .route("/fetch-collection/{collection}", get(fetch_collection))
        .route("/insert-document/{collection}", post(insert_document))
        .route("/update-document/{collection}/{id}", put(update_document))
        .route("/delete-document/{collection}/{id}", delete(delete_document))
}
