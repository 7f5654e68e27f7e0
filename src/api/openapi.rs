//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use crate::api::dto::{
    DashboardMetricsResponse, FetchCollectionResponse, InsertDocumentResponse, MessageResponse,
    SetAlertRequest,
};
use crate::api::handlers::{alerts, audit, documents, local_data, system};
use crate::domain::{AuditAction, AuditEntry, GroupTotal};
use crate::error::{ErrorBody, ErrorResponse};
use crate::persistence::{DisplaySetting, FilterData};

/// Generated OpenAPI specification, served by Swagger UI at
/// `/api-docs/openapi.json` when the `swagger-ui` feature is on.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "collection-gateway",
        description = "Document collection gateway with local view state, audit log and live broadcast."
    ),
    paths(
        documents::fetch_logs,
        documents::dashboard_metrics,
        documents::fetch_collection,
        documents::insert_document,
        documents::update_document,
        documents::delete_document,
        local_data::get_local_data,
        local_data::save_filter_data,
        local_data::save_filter_selections,
        local_data::load_filter_selections,
        local_data::save_dark_mode,
        local_data::load_dark_mode,
        alerts::set_alert,
        audit::audit_log,
        system::health_handler,
    ),
    components(schemas(
        AuditAction,
        AuditEntry,
        DashboardMetricsResponse,
        DisplaySetting,
        ErrorBody,
        ErrorResponse,
        FetchCollectionResponse,
        FilterData,
        GroupTotal,
        InsertDocumentResponse,
        MessageResponse,
        SetAlertRequest,
        system::HealthResponse,
    )),
    tags(
        (name = "Documents", description = "Collection reads and writes"),
        (name = "Local data", description = "Snapshots, filters and display settings"),
        (name = "Alerts", description = "Operator alerts"),
        (name = "Audit", description = "Operation history"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;
