//! Payload shapes of the locally persisted blobs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Filtered view of a collection saved from the client, stored as
/// `<name>Filtered.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterData {
    /// Rows remaining after the client applied its filter.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub filtered_data: Value,
    /// Top-level fields selected for display.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub selected_fields: Value,
    /// Nested field selections keyed by parent field.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub nested_selected_fields: Value,
}

/// Boolean display setting, stored as the singleton `dark-mode.json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySetting {
    /// Whether the dark theme is enabled. Defaults to `false`.
    #[serde(default)]
    pub is_dark_mode: bool,
}
