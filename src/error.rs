//! # Error Types
//!
//! This module defines the crate-level error type. Each pipeline layer has its
//! own error enum next to its code ([`UnitError`], [`ExportError`],
//! [`StoreError`], ...); `LabelError` wraps them for callers such as the CLI
//! that only need to report a failure.

use thiserror::Error;

use crate::export::ExportError;
use crate::store::StoreError;
use crate::units::UnitError;

/// Main error type for labelpress operations
#[derive(Debug, Error)]
pub enum LabelError {
    /// Export pipeline failure (configuration or render)
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Unit conversion / DPI configuration error
    #[error(transparent)]
    Unit(#[from] UnitError),

    /// Storage collaborator failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Malformed design document or bindings
    #[error("Invalid design data: {0}")]
    InvalidDesign(String),

    /// HTTP server errors (bind, serve)
    #[error("Server error: {0}")]
    Server(String),

    /// JSON (de)serialization error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
