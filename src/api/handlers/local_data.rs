//! Local view-state handlers: snapshots, filter data, filter selections
//! and the display setting.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use crate::api::dto::MessageResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::persistence::{BlobKind, DisplaySetting, FilterData};

/// `GET /get-local-data/{collection}`: Last saved snapshot.
///
/// # Errors
///
/// Returns [`GatewayError::RecordNotFound`] if no snapshot was saved and
/// [`GatewayError::PersistenceError`] if it cannot be read.
#[utoipa::path(
    get,
    path = "/get-local-data/{collection}",
    tag = "Local data",
    summary = "Load the local snapshot",
    description = "Returns the documents saved by the last `fetch-collection` call for this collection.",
    params(
        ("collection" = String, Path, description = "Collection name"),
    ),
    responses(
        (status = 200, description = "Snapshot contents", body = serde_json::Value),
        (status = 404, description = "No snapshot saved", body = ErrorResponse),
    )
)]
pub async fn get_local_data(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let snapshot: Value = state.blobs.load(BlobKind::Snapshot, &collection).await?;
    Ok(Json(snapshot))
}

/// `POST /save-filter-data/{collection}`: Replace the filtered view.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] if the write fails.
#[utoipa::path(
    post,
    path = "/save-filter-data/{collection}",
    tag = "Local data",
    summary = "Save filtered data",
    params(
        ("collection" = String, Path, description = "Collection name"),
    ),
    request_body = FilterData,
    responses(
        (status = 200, description = "Saved", body = MessageResponse),
        (status = 400, description = "Invalid collection name", body = ErrorResponse),
        (status = 500, description = "Write failed", body = ErrorResponse),
    )
)]
pub async fn save_filter_data(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(data): Json<FilterData>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .blobs
        .save(BlobKind::FilterData, &collection, &data)
        .await?;
    Ok(Json(MessageResponse::new("Filtered data saved successfully.")))
}

/// `POST /save-filter-selections/{collection}`: Replace the selections.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] if the write fails.
#[utoipa::path(
    post,
    path = "/save-filter-selections/{collection}",
    tag = "Local data",
    summary = "Save filter selections",
    description = "Stores the body verbatim. A later save replaces it entirely.",
    params(
        ("collection" = String, Path, description = "Collection name"),
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Saved", body = MessageResponse),
        (status = 400, description = "Invalid collection name", body = ErrorResponse),
        (status = 500, description = "Write failed", body = ErrorResponse),
    )
)]
pub async fn save_filter_selections(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(selections): Json<Value>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .blobs
        .save(BlobKind::FilterSelection, &collection, &selections)
        .await?;
    Ok(Json(MessageResponse::new(
        "Filter selections saved successfully.",
    )))
}

/// `GET /load-filter-selections/{collection}`: Last saved selections.
///
/// # Errors
///
/// Returns [`GatewayError::RecordNotFound`] if nothing was saved.
#[utoipa::path(
    get,
    path = "/load-filter-selections/{collection}",
    tag = "Local data",
    summary = "Load filter selections",
    params(
        ("collection" = String, Path, description = "Collection name"),
    ),
    responses(
        (status = 200, description = "Stored selections", body = serde_json::Value),
        (status = 404, description = "No selections saved", body = ErrorResponse),
    )
)]
pub async fn load_filter_selections(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let selections: Value = state
        .blobs
        .load(BlobKind::FilterSelection, &collection)
        .await?;
    Ok(Json(selections))
}

/// `POST /save-dark-mode`: Replace the display setting.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] if the write fails.
#[utoipa::path(
    post,
    path = "/save-dark-mode",
    tag = "Local data",
    summary = "Save the display setting",
    request_body = DisplaySetting,
    responses(
        (status = 200, description = "Saved", body = MessageResponse),
        (status = 500, description = "Write failed", body = ErrorResponse),
    )
)]
pub async fn save_dark_mode(
    State(state): State<AppState>,
    Json(setting): Json<DisplaySetting>,
) -> Result<impl IntoResponse, GatewayError> {
    state.blobs.save_display_setting(setting).await?;
    Ok(Json(MessageResponse::new("Dark mode setting saved.")))
}

/// `GET /load-dark-mode`: Current display setting, `false` if never saved.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] if a saved setting cannot be
/// read.
#[utoipa::path(
    get,
    path = "/load-dark-mode",
    tag = "Local data",
    summary = "Load the display setting",
    responses(
        (status = 200, description = "Current setting", body = DisplaySetting),
        (status = 500, description = "Read failed", body = ErrorResponse),
    )
)]
pub async fn load_dark_mode(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let setting = state.blobs.load_display_setting().await?;
    Ok(Json(setting))
}

/// Local data routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get-local-data/{collection}", get(get_local_data))
        .route("/save-filter-data/{collection}", post(save_filter_data))
        .route(
            "/save-filter-selections/{collection}",
            post(save_filter_selections),
        )
        .route(
            "/load-filter-selections/{collection}",
            get(load_filter_selections),
        )
        .route("/save-dark-mode", post(save_dark_mode))
        .route("/load-dark-mode", get(load_dark_mode))
}
