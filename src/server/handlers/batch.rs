//! Batch export.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::batch::{BatchStatus, RowOutcome};
use crate::document::Bindings;
use crate::export::ExportOptions;
use crate::render::Degradation;
use crate::store::ArtifactRef;

use super::super::state::AppState;
use super::{ApiError, DesignRequest, authenticate, parse_dpi, parse_format};

#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    pub template: DesignRequest,
    #[serde(default)]
    pub rows: Vec<Bindings>,
    pub format: Option<String>,
    pub dpi: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowSummary {
    Success {
        row: usize,
        artifact: ArtifactRef,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        degradations: Vec<Degradation>,
    },
    Failed {
        row: usize,
        error: String,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub job_id: String,
    pub status: BatchStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rows: Vec<RowSummary>,
}

/// Handle POST /api/batch - one artifact per row, persisted and referenced by id.
pub async fn run(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchSummary>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let Json(request) = body?;
    if request.rows.len() > state.config.max_batch_rows {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "BatchTooLarge",
            format!(
                "{} rows exceeds the limit of {}",
                request.rows.len(),
                state.config.max_batch_rows
            ),
        ));
    }
    let options = ExportOptions::new(parse_dpi(request.dpi)?, parse_format(request.format.as_deref())?);
    let template = request.template.into_document(&state).await?;

    log::info!("batch of {} rows for {}", request.rows.len(), identity.subject);
    let result = state.batch.run_batch(&template, &request.rows, options).await;

    let mut rows = Vec::with_capacity(result.rows.len());
    for (index, outcome) in result.rows.iter().enumerate() {
        let row = index + 1;
        let summary = match outcome {
            RowOutcome::Success(artifact) => {
                let artifact_ref = state
                    .store
                    .save_artifact(&artifact.filename, artifact.content_type(), artifact.bytes.clone())
                    .await?;
                RowSummary::Success {
                    row,
                    artifact: artifact_ref,
                    degradations: artifact.degradations.clone(),
                }
            }
            RowOutcome::Failed(e) => RowSummary::Failed {
                row,
                error: e.kind().to_string(),
                message: e.to_string(),
            },
        };
        rows.push(summary);
    }

    Ok(Json(BatchSummary {
        job_id: result.job_id.to_string(),
        status: result.status,
        started_at: result.started_at,
        finished_at: result.finished_at,
        total: result.rows.len(),
        succeeded: result.succeeded(),
        failed: result.failed(),
        rows,
    }))
}
