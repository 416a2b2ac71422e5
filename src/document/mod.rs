//! # Design Document Model
//!
//! A [`Document`] is everything needed to render one label: the ordered
//! element list (sequence order is paint order), the label stock it prints
//! on, and the DPI grid its element geometry was authored in.
//!
//! ## Geometry
//!
//! The output surface size comes from, in order of preference:
//!
//! 1. the resolved [`Label`]'s stored pixel size at the target DPI,
//! 2. raw `width_px`/`height_px` in the design grid, rescaled to the target DPI,
//! 3. raw `width_mm`/`height_mm`.
//!
//! If none is present (or the result has zero area) the document has no
//! geometry and cannot be exported.
//!
//! ## Example
//!
//! ```
//! use labelpress::document::{Document, Element};
//! use labelpress::label::LabelCatalog;
//! use labelpress::units::Dpi;
//!
//! let catalog = LabelCatalog::built_in();
//! let doc = Document::for_label(catalog.get("2x1").unwrap().clone())
//!     .with_element(Element::text(10.0, 10.0, 180.0, 30.0, "Hello"));
//!
//! let geometry = doc.geometry(Dpi::Dpi300).unwrap();
//! assert_eq!((geometry.width_px, geometry.height_px), (600, 300));
//! ```

mod bind;
mod element;

pub use bind::Bindings;
pub use element::{
    BarcodeProps, DEFAULT_CAPTION_FONT_SIZE, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE,
    DEFAULT_FONT_WEIGHT, DEFAULT_LINE_HEIGHT, Element, ElementKind, ImageProps, ShapeProps,
    ShapeType, TextAlign, TextProps,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::label::{Label, LabelCatalog};
use crate::units::{self, Dpi, EditorSpace};

/// Document-level errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("Document has no resolvable geometry at {0} DPI")]
    MissingGeometry(Dpi),

    #[error("Unknown label '{0}'")]
    UnknownLabel(String),
}

/// A label design.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Catalog reference; resolved into `label` by [`Document::resolve_label`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    /// Grid the element geometry is authored in.
    #[serde(default)]
    pub dpi: Dpi,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_px: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_px: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_mm: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_mm: Option<f32>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// Resolved output geometry at one DPI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub dpi: Dpi,
    pub width_px: u32,
    pub height_px: u32,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document printing on `label`, authored at the label's 203 DPI grid.
    pub fn for_label(label: Label) -> Self {
        Self {
            label_id: Some(label.id.clone()),
            label: Some(label),
            ..Default::default()
        }
    }

    /// A document with raw pixel geometry in the `dpi` grid.
    pub fn with_pixel_size(width_px: f32, height_px: f32, dpi: Dpi) -> Self {
        Self {
            dpi,
            width_px: Some(width_px),
            height_px: Some(height_px),
            ..Default::default()
        }
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_dpi(mut self, dpi: Dpi) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Fill `label` from `label_id` when it is not already resolved.
    pub fn resolve_label(&mut self, catalog: &LabelCatalog) -> Result<(), DocumentError> {
        if self.label.is_some() {
            return Ok(());
        }
        if let Some(id) = &self.label_id {
            let label = catalog
                .get(id)
                .ok_or_else(|| DocumentError::UnknownLabel(id.clone()))?;
            self.label = Some(label.clone());
        }
        Ok(())
    }

    /// Multiplier from the authoring grid to the `target` grid.
    pub fn scale_to(&self, target: Dpi) -> f32 {
        EditorSpace::new(self.dpi).scale_to(target)
    }

    /// Output surface size and physical page size at `dpi`.
    pub fn geometry(&self, dpi: Dpi) -> Result<PageGeometry, DocumentError> {
        let geometry = if let Some(label) = &self.label {
            let px = label.pixels(dpi);
            PageGeometry {
                dpi,
                width_px: px.width,
                height_px: px.height,
                width_mm: label.width_mm,
                height_mm: label.height_mm,
            }
        } else if let (Some(w), Some(h)) = (self.width_px, self.height_px) {
            let space = EditorSpace::new(self.dpi);
            PageGeometry {
                dpi,
                width_px: space.to_target(w, dpi).round().max(0.0) as u32,
                height_px: space.to_target(h, dpi).round().max(0.0) as u32,
                width_mm: self.width_mm.unwrap_or_else(|| space.to_mm(w)),
                height_mm: self.height_mm.unwrap_or_else(|| space.to_mm(h)),
            }
        } else if let (Some(w), Some(h)) = (self.width_mm, self.height_mm) {
            PageGeometry {
                dpi,
                width_px: units::mm_to_surface_pixels(w, dpi),
                height_px: units::mm_to_surface_pixels(h, dpi),
                width_mm: w,
                height_mm: h,
            }
        } else {
            return Err(DocumentError::MissingGeometry(dpi));
        };

        let has_area = geometry.width_px > 0
            && geometry.height_px > 0
            && geometry.width_mm > 0.0
            && geometry.height_mm > 0.0;
        if !has_area {
            return Err(DocumentError::MissingGeometry(dpi));
        }
        Ok(geometry)
    }

    /// A copy with every `{{name}}` placeholder replaced from `bindings`.
    pub fn bind(&self, bindings: &Bindings) -> Document {
        let mut doc = self.clone();
        doc.name = doc.name.as_deref().map(|name| bindings.apply(name));
        for el in &mut doc.elements {
            match &mut el.kind {
                ElementKind::Text(t) => t.content = bindings.apply(&t.content),
                ElementKind::Image(i) => i.src = bindings.apply(&i.src),
                ElementKind::Barcode(b) => b.value = bindings.apply(&b.value),
                ElementKind::Shape(_) => {}
            }
        }
        doc
    }
}
