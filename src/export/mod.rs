//! # Export Engine
//!
//! Turns a [`Document`] into a finished print artifact at a chosen DPI:
//!
//! 1. resolve the page geometry (label pixel size at the DPI, plus the
//!    physical size in millimeters),
//! 2. allocate an offscreen [`RasterSurface`] of exactly that pixel size,
//! 3. drive a [`RenderOrchestrator`] until every image has loaded or failed,
//! 4. serialize the surface as PDF, PNG or JPEG.
//!
//! Unlike a live preview, an export never samples a surface that is still
//! waiting on assets. Individual element failures degrade to placeholders
//! and are listed on the [`Artifact`]; with `strict_assets` an image that
//! could not be loaded fails the whole export instead.

mod pdf;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::assets::AssetContext;
use crate::document::{Document, DocumentError, PageGeometry};
use crate::label::LabelCatalog;
use crate::orchestrator::RenderOrchestrator;
use crate::render::{Degradation, DegradationKind};
use crate::surface::{DEFAULT_MAX_PIXELS, RasterSurface, SurfaceError};
use crate::units::{Dpi, UnitError};

pub use pdf::write_pdf;

const JPEG_QUALITY: u8 = 92;

/// Output file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Export failures. Each has a stable kind string (see [`ExportError::kind`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error("Unsupported export format '{0}'")]
    UnsupportedFormat(String),

    #[error("Unsupported DPI {0}; expected 203 or 300")]
    UnsupportedDpi(u32),

    #[error("Missing geometry: {0}")]
    MissingGeometry(String),

    #[error("Render failure: {0}")]
    RenderFailure(String),

    #[error("Unresolved assets: {}", .0.join(", "))]
    AssetUnresolved(Vec<String>),
}

impl ExportError {
    pub fn kind(&self) -> &'static str {
        match self {
            ExportError::UnsupportedFormat(_) => "UnsupportedFormat",
            ExportError::UnsupportedDpi(_) => "UnsupportedDpi",
            ExportError::MissingGeometry(_) => "MissingGeometry",
            ExportError::RenderFailure(_) => "RenderFailure",
            ExportError::AssetUnresolved(_) => "AssetUnresolved",
        }
    }
}

impl From<UnitError> for ExportError {
    fn from(e: UnitError) -> Self {
        match e {
            UnitError::UnsupportedDpi(dpi) => ExportError::UnsupportedDpi(dpi),
        }
    }
}

impl From<DocumentError> for ExportError {
    fn from(e: DocumentError) -> Self {
        ExportError::MissingGeometry(e.to_string())
    }
}

impl From<SurfaceError> for ExportError {
    fn from(e: SurfaceError) -> Self {
        ExportError::RenderFailure(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default)]
    pub dpi: Dpi,
    #[serde(default)]
    pub format: ExportFormat,
    /// Fail instead of printing an image placeholder.
    #[serde(default)]
    pub strict_assets: bool,
}

impl ExportOptions {
    pub fn new(dpi: Dpi, format: ExportFormat) -> Self {
        Self {
            dpi,
            format,
            strict_assets: false,
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict_assets = true;
        self
    }
}

/// A finished export.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub format: ExportFormat,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub filename: String,
    pub width_px: u32,
    pub height_px: u32,
    pub dpi: Dpi,
    pub width_mm: f32,
    pub height_mm: f32,
    pub degradations: Vec<Degradation>,
}

impl Artifact {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// File-name-safe form of a document name.
pub fn filename_stem(name: Option<&str>) -> String {
    let slug: String = name
        .unwrap_or_default()
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "label".to_string()
    } else {
        slug.to_string()
    }
}

/// Renders documents offscreen and serializes them.
#[derive(Debug, Clone)]
pub struct ExportEngine {
    assets: AssetContext,
    labels: LabelCatalog,
    max_surface_pixels: u64,
}

impl ExportEngine {
    pub fn new(assets: AssetContext) -> Self {
        Self {
            assets,
            labels: LabelCatalog::built_in(),
            max_surface_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    pub fn with_labels(mut self, labels: LabelCatalog) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_max_surface_pixels(mut self, max: u64) -> Self {
        self.max_surface_pixels = max;
        self
    }

    pub fn assets(&self) -> &AssetContext {
        &self.assets
    }

    pub fn labels(&self) -> &LabelCatalog {
        &self.labels
    }

    pub async fn export(
        &self,
        document: &Document,
        dpi: Dpi,
        format: ExportFormat,
    ) -> Result<Artifact, ExportError> {
        self.export_with(document, ExportOptions::new(dpi, format)).await
    }

    /// PNG at `dpi`, placeholders allowed.
    pub async fn preview(&self, document: &Document, dpi: Dpi) -> Result<Artifact, ExportError> {
        self.export(document, dpi, ExportFormat::Png).await
    }

    pub async fn export_with(
        &self,
        document: &Document,
        options: ExportOptions,
    ) -> Result<Artifact, ExportError> {
        let mut document = document.clone();
        document.resolve_label(&self.labels)?;
        let geometry = document.geometry(options.dpi)?;
        log::debug!(
            "exporting {} at {} DPI: {}x{} px, {}x{} mm",
            options.format,
            options.dpi,
            geometry.width_px,
            geometry.height_px,
            geometry.width_mm,
            geometry.height_mm
        );

        let surface = RasterSurface::try_new(geometry.width_px, geometry.height_px, self.max_surface_pixels)?;
        let mut orchestrator = RenderOrchestrator::new(surface, self.assets.clone());
        orchestrator
            .render_to_completion(&document, document.scale_to(options.dpi))
            .await;

        let degradations = orchestrator.degradations().to_vec();
        for d in &degradations {
            log::warn!("element {} rendered as placeholder: {}", d.element_index, d.detail);
        }
        if options.strict_assets {
            let unresolved: Vec<String> = degradations
                .iter()
                .filter(|d| d.kind == DegradationKind::Image)
                .map(|d| d.detail.clone())
                .collect();
            if !unresolved.is_empty() {
                return Err(ExportError::AssetUnresolved(unresolved));
            }
        }

        let surface = orchestrator.into_surface();
        let bytes = self.serialize(&surface, &geometry, &document, options.format)?;
        Ok(Artifact {
            format: options.format,
            filename: format!(
                "{}.{}",
                filename_stem(document.name.as_deref()),
                options.format.extension()
            ),
            bytes,
            width_px: geometry.width_px,
            height_px: geometry.height_px,
            dpi: options.dpi,
            width_mm: geometry.width_mm,
            height_mm: geometry.height_mm,
            degradations,
        })
    }

    fn serialize(
        &self,
        surface: &RasterSurface,
        geometry: &PageGeometry,
        document: &Document,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ExportError> {
        let bytes = match format {
            ExportFormat::Pdf => write_pdf(surface, geometry, document.name.as_deref())?,
            ExportFormat::Png => surface.to_png()?,
            ExportFormat::Jpeg => surface.to_jpeg(JPEG_QUALITY)?,
        };
        Ok(bytes)
    }
}
