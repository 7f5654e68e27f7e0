//! Alert handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{MessageResponse, SetAlertRequest};
use crate::app_state::AppState;
use crate::domain::BusEvent;

/// `POST /set-alert`: Publish an alert to every live subscriber.
#[utoipa::path(
    post,
    path = "/set-alert",
    tag = "Alerts",
    summary = "Publish an alert",
    description = "Delivers the alert on the `alert` topic to subscribers connected right now. Nothing is stored.",
    request_body = SetAlertRequest,
    responses(
        (status = 200, description = "Alert published", body = MessageResponse),
    )
)]
pub async fn set_alert(
    State(state): State<AppState>,
    Json(req): Json<SetAlertRequest>,
) -> impl IntoResponse {
    let event = BusEvent::from(req);
    tracing::info!(collection = event.collection(), "alert published");
    state.event_bus.publish(event);
    Json(MessageResponse::new("Alert set successfully."))
}

/// Alert routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/set-alert", post(set_alert))
}
