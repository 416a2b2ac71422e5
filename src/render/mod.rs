//! # Element Renderers
//!
//! One renderer per element kind, all with the same contract: take an
//! element and a [`Surface`], paint, never fail. A condition that would
//! otherwise be an error (a rejected image, an unencodable barcode value)
//! has a fixed visual fallback and is reported as a [`Degradation`] on the
//! [`RenderContext`] instead.
//!
//! Renderers hold no state between calls. Everything that varies per pass
//! (image availability, the symbol backend, what went wrong) lives on the
//! context the caller passes in.

pub mod barcode;
pub mod font;
pub mod image;
mod placeholder;
pub mod shape;
pub mod text;

use ::image::RgbaImage;
use serde::Serialize;
use std::sync::Arc;

use crate::assets::SymbolGenerator;
use crate::document::{Element, ElementKind};
use crate::surface::Surface;

/// What a render pass knows about one image source.
#[derive(Debug, Clone)]
pub enum ImageState {
    Ready(Arc<RgbaImage>),
    /// Not loaded yet; a load should be requested.
    Missing,
    Failed(String),
}

/// Answers "is this image available?" for the image renderer.
pub trait ImageLookup {
    fn lookup(&self, src: &str) -> ImageState;
}

/// Lookup that knows no images. Every image is `Missing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageLookup for NoImages {
    fn lookup(&self, _src: &str) -> ImageState {
        ImageState::Missing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationKind {
    Image,
    Barcode,
}

/// An element drawn with its fallback visual instead of its real content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub element_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    pub kind: DegradationKind,
    pub detail: String,
}

/// Per-pass inputs and findings shared by every renderer.
pub struct RenderContext<'a> {
    pub images: &'a dyn ImageLookup,
    pub symbols: &'a dyn SymbolGenerator,
    /// Image sources painted with the loading placeholder, in paint order.
    pub unresolved: Vec<String>,
    pub degradations: Vec<Degradation>,
    current: Option<(usize, Option<String>)>,
}

impl<'a> RenderContext<'a> {
    pub fn new(images: &'a dyn ImageLookup, symbols: &'a dyn SymbolGenerator) -> Self {
        Self {
            images,
            symbols,
            unresolved: Vec::new(),
            degradations: Vec::new(),
            current: None,
        }
    }

    pub(crate) fn degrade(&mut self, kind: DegradationKind, detail: impl Into<String>) {
        let (element_index, element_id) = self.current.clone().unwrap_or((0, None));
        self.degradations.push(Degradation {
            element_index,
            element_id,
            kind,
            detail: detail.into(),
        });
    }

    pub(crate) fn request_image(&mut self, src: &str) {
        if !self.unresolved.iter().any(|s| s == src) {
            self.unresolved.push(src.to_string());
        }
    }
}

/// Paint one element.
pub fn render_element<S: Surface + ?Sized>(
    surface: &mut S,
    element: &Element,
    ctx: &mut RenderContext<'_>,
) {
    let bounds = element.bounds();
    match &element.kind {
        ElementKind::Text(props) => text::draw(surface, bounds, props),
        ElementKind::Shape(props) => shape::draw(surface, bounds, props),
        ElementKind::Image(props) => image::draw(surface, bounds, props, ctx),
        ElementKind::Barcode(props) => barcode::draw(surface, bounds, props, ctx),
    }
}

/// Paint `elements` in sequence order; later elements land on top.
pub fn render_elements<S: Surface + ?Sized>(
    surface: &mut S,
    elements: &[Element],
    ctx: &mut RenderContext<'_>,
) {
    for (index, element) in elements.iter().enumerate() {
        ctx.current = Some((index, element.id.clone()));
        render_element(surface, element, ctx);
    }
    ctx.current = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::BarcodeSymbols;
    use crate::document::{ShapeProps, ShapeType};
    use crate::surface::{Color, RasterSurface};

    fn solid_square(x: f32, color: &str) -> Element {
        Element::shape(
            x,
            10.0,
            40.0,
            40.0,
            ShapeProps {
                shape: ShapeType::Rectangle,
                fill_color: Color::parse(color).unwrap(),
                fill_opacity: 100.0,
                border_width: 0.0,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_later_element_occludes_earlier() {
        let elements = vec![solid_square(10.0, "#ff0000"), solid_square(30.0, "#0000ff")];
        let mut surface = RasterSurface::new(100, 60);
        let mut ctx = RenderContext::new(&NoImages, &BarcodeSymbols);
        render_elements(&mut surface, &elements, &mut ctx);

        // overlap region shows the second square
        assert_eq!(surface.pixel(40, 30), Some(Color::rgb(0, 0, 255)));
        // non-overlapping part of the first is still red
        assert_eq!(surface.pixel(15, 30), Some(Color::rgb(255, 0, 0)));

        let mut reversed = RasterSurface::new(100, 60);
        let elements: Vec<_> = elements.into_iter().rev().collect();
        render_elements(&mut reversed, &elements, &mut ctx);
        assert_eq!(reversed.pixel(40, 30), Some(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn test_missing_images_are_collected_once() {
        let elements = vec![
            Element::image(0.0, 0.0, 10.0, 10.0, "https://a/x.png"),
            Element::image(20.0, 0.0, 10.0, 10.0, "https://a/x.png"),
        ];
        let mut surface = RasterSurface::new(40, 20);
        let mut ctx = RenderContext::new(&NoImages, &BarcodeSymbols);
        render_elements(&mut surface, &elements, &mut ctx);
        assert_eq!(ctx.unresolved, vec!["https://a/x.png".to_string()]);
        assert!(ctx.degradations.is_empty());
    }
}
