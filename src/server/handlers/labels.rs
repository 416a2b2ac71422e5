//! Label catalog.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::label::Label;

use super::super::state::AppState;
use super::ApiError;

/// Handle GET /api/labels - list label stock.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<Label>> {
    Json(state.labels().all().to_vec())
}

/// Handle GET /api/labels/:id - one label with its per-DPI pixel sizes.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Label>, ApiError> {
    state
        .labels()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Unknown label '{}'", id)))
}
