//! Audit log query handler.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::DateQuery;
use crate::app_state::AppState;
use crate::domain::AuditEntry;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /audit-log/{collection}`: Recorded operations on a collection.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed date and
/// [`GatewayError::PersistenceError`] if the log cannot be read.
#[utoipa::path(
    get,
    path = "/audit-log/{collection}",
    tag = "Audit",
    summary = "Query the audit log",
    description = "Returns the audit entries for the collection in append order, optionally limited to one UTC day.",
    params(
        ("collection" = String, Path, description = "Collection name"),
        DateQuery,
    ),
    responses(
        (status = 200, description = "Audit entries", body = Vec<AuditEntry>),
        (status = 400, description = "Malformed date", body = ErrorResponse),
        (status = 500, description = "Log unreadable", body = ErrorResponse),
    )
)]
pub async fn audit_log(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let range = query.range()?;
    let entries = state.gateway.audit_log().query(&collection, range).await?;
    Ok(Json(entries))
}

/// Audit routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/audit-log/{collection}", get(audit_log))
}
