//! HTTP handlers for the server.
//!
//! Every failure leaves as JSON `{"error": "<kind>", "message": "..."}` with
//! the kind string stable across releases.

pub mod artifacts;
pub mod batch;
pub mod export;
pub mod labels;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::document::{Bindings, Document, Element};
use crate::export::{ExportError, ExportFormat};
use crate::store::StoreError;
use crate::units::Dpi;

use super::auth::{AuthError, Identity, bearer_token};
use super::state::AppState;

/// An error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_design(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "InvalidDesignData", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NotFound", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::error!("{}: {}", self.kind, self.message);
        }
        let body = json!({ "error": self.kind, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        let status = match &e {
            ExportError::UnsupportedFormat(_) | ExportError::UnsupportedDpi(_) => StatusCode::BAD_REQUEST,
            ExportError::MissingGeometry(_) | ExportError::AssetUnresolved(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ExportError::RenderFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.kind(), e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DocumentNotFound(_) | StoreError::ArtifactNotFound(_) => {
                Self::not_found(e.to_string())
            }
            StoreError::Backend(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "StorageError", e.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::invalid_design(e.body_text())
    }
}

/// Resolve the caller or fail with 401.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Identity, ApiError> {
    Ok(state.sessions.authenticate(bearer_token(headers)).await?)
}

pub fn parse_format(format: Option<&str>) -> Result<ExportFormat, ApiError> {
    match format {
        None => Ok(ExportFormat::Pdf),
        Some(f) => Ok(f.parse::<ExportFormat>()?),
    }
}

pub fn parse_dpi(dpi: Option<u32>) -> Result<Dpi, ApiError> {
    match dpi {
        None => Ok(Dpi::default()),
        Some(d) => Ok(Dpi::try_from(d).map_err(ExportError::from)?),
    }
}

/// A design given either by stored document id or inline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DesignRequest {
    pub document_id: Option<String>,
    pub label_id: Option<String>,
    pub elements: Option<Vec<Element>>,
    pub width_px: Option<f32>,
    pub height_px: Option<f32>,
    pub width_mm: Option<f32>,
    pub height_mm: Option<f32>,
    /// Grid the inline element geometry was authored in.
    pub design_dpi: Option<u32>,
    pub name: Option<String>,
    /// Applied to `{{name}}` placeholders before rendering.
    pub bindings: Option<Bindings>,
}

impl DesignRequest {
    fn has_geometry(&self) -> bool {
        self.label_id.is_some()
            || (self.width_px.is_some() && self.height_px.is_some())
            || (self.width_mm.is_some() && self.height_mm.is_some())
    }

    /// Build the document to render. Inline fields override a stored document.
    pub async fn into_document(self, state: &AppState) -> Result<Document, ApiError> {
        let mut document = match &self.document_id {
            Some(id) => state.store.load_document(id).await?,
            None => {
                if self.elements.is_none() || !self.has_geometry() {
                    return Err(ApiError::invalid_design(
                        "request needs elements and width_px/height_px (or label_id), or a document_id",
                    ));
                }
                Document::new()
            }
        };

        if let Some(elements) = self.elements {
            document.elements = elements;
        }
        if let Some(label_id) = self.label_id {
            document.label_id = Some(label_id);
            document.label = None;
        }
        if self.width_px.is_some() && self.height_px.is_some() {
            document.width_px = self.width_px;
            document.height_px = self.height_px;
        }
        if self.width_mm.is_some() && self.height_mm.is_some() {
            document.width_mm = self.width_mm;
            document.height_mm = self.height_mm;
        }
        if let Some(dpi) = self.design_dpi {
            document.dpi = parse_dpi(Some(dpi))?;
        }
        if self.name.is_some() {
            document.name = self.name;
        }
        if let Some(bindings) = self.bindings {
            document = document.bind(&bindings);
        }
        Ok(document)
    }
}
