//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::DateRange;
use crate::error::GatewayError;

/// Acknowledgement body returned by mutating endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Wraps `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Optional day filter for log-style endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    /// Calendar day `YYYY-MM-DD`, interpreted as a whole UTC day.
    #[serde(default)]
    pub selected_date: Option<String>,
}

impl DateQuery {
    /// Converts the query into a half-open UTC day range, if one was given.
    /// An empty value counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if the date is malformed.
    pub fn range(&self) -> Result<Option<DateRange>, GatewayError> {
        match self.selected_date.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(day) => DateRange::parse_day(day).map(Some),
        }
    }
}
