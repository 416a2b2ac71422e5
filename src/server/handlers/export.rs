//! Single-label export and preview.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::export::Artifact;

use super::super::state::AppState;
use super::{ApiError, DesignRequest, authenticate, parse_dpi, parse_format};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(flatten)]
    pub design: DesignRequest,
    pub format: Option<String>,
    pub dpi: Option<u32>,
}

/// Number of elements drawn as placeholders.
const DEGRADED_HEADER: &str = "x-degraded-elements";

fn artifact_response(artifact: Artifact, disposition: &str) -> Response {
    let headers = [
        (header::CONTENT_TYPE.as_str(), artifact.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION.as_str(),
            format!("{}; filename=\"{}\"", disposition, artifact.filename),
        ),
        (DEGRADED_HEADER, artifact.degradations.len().to_string()),
    ];
    (headers, artifact.bytes).into_response()
}

/// Handle POST /api/export - render a design to PDF/PNG/JPEG as an attachment.
pub async fn export(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let Json(request) = body?;
    let format = parse_format(request.format.as_deref())?;
    let dpi = parse_dpi(request.dpi)?;
    let document = request.design.into_document(&state).await?;

    log::info!("export {} at {} DPI for {}", format, dpi, identity.subject);
    let artifact = state.engine.export(&document, dpi, format).await?;
    Ok(artifact_response(artifact, "attachment"))
}

/// Handle POST /api/preview - render a design as an inline PNG.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    authenticate(&state, &headers).await?;
    let Json(request) = body?;
    let dpi = parse_dpi(request.dpi)?;
    let document = request.design.into_document(&state).await?;

    let artifact = state.engine.preview(&document, dpi).await?;
    Ok(artifact_response(artifact, "inline"))
}
