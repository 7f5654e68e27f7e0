//! Alert request DTO.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::BusEvent;

/// Request body for `POST /set-alert`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetAlertRequest {
    /// Collection the alert concerns.
    pub collection: String,
    /// Condition that triggered the alert.
    #[serde(default)]
    pub condition: String,
    /// Message shown to subscribers.
    #[serde(default)]
    pub message: String,
}

impl From<SetAlertRequest> for BusEvent {
    fn from(req: SetAlertRequest) -> Self {
        Self::Alert {
            collection: req.collection,
            condition: req.condition,
            message: req.message,
        }
    }
}
