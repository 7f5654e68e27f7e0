//! REST endpoint handlers organized by resource.

pub mod alerts;
pub mod audit;
pub mod documents;
pub mod local_data;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(documents::routes())
        .merge(local_data::routes())
        .merge(alerts::routes())
        .merge(audit::routes())
}
