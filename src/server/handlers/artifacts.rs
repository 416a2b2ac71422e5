//! Download persisted artifacts.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::super::state::AppState;
use super::{ApiError, authenticate};

/// Handle GET /api/artifacts/:id
pub async fn download(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    authenticate(&state, &headers).await?;
    let stored = state.store.load_artifact(&id).await?;
    let headers = [
        (header::CONTENT_TYPE, stored.meta.content_type.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", stored.meta.filename),
        ),
    ];
    Ok((headers, stored.bytes.as_ref().clone()).into_response())
}
