//! # Pipeline Tests
//!
//! End-to-end checks of the render and export pipeline through the public API:
//! unit geometry, paint order, placeholders, PDF page size, batch isolation and
//! stale image loads.
//!
//! Images come from an in-memory source, so these tests run offline.

use std::sync::Arc;

use image::{DynamicImage, Rgba, RgbaImage};
use labelpress::assets::{AssetContext, BarcodeSymbols, MemoryImageSource};
use labelpress::batch::{BatchDriver, BatchStatus};
use labelpress::document::{Bindings, Document, Element, ElementKind, ShapeProps, ShapeType};
use labelpress::export::{ExportEngine, ExportError, ExportFormat, ExportOptions};
use labelpress::label::LabelCatalog;
use labelpress::orchestrator::{AssetCompletion, CompletionOutcome, PassState, RenderOrchestrator};
use labelpress::render::DegradationKind;
use labelpress::surface::{Color, DrawCall, RasterSurface, RecordingSurface};
use labelpress::units::{self, Dpi};
use lopdf::Document as PdfDocument;
use pretty_assertions::assert_eq;

const LOGO: &str = "https://cdn.example/logo.png";

fn logo() -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 128, 0, 255])))
}

fn assets() -> AssetContext {
    AssetContext::new(
        Arc::new(MemoryImageSource::new().with_image(LOGO, logo())),
        Arc::new(BarcodeSymbols),
    )
}

fn label(id: &str) -> labelpress::label::Label {
    LabelCatalog::built_in().get(id).cloned().unwrap()
}

fn filled(x: f32, y: f32, w: f32, h: f32, color: Color) -> Element {
    Element::shape(
        x,
        y,
        w,
        h,
        ShapeProps {
            fill_color: color,
            fill_opacity: 100.0,
            border_width: 0.0,
            ..Default::default()
        },
    )
}

// ============================================================================
// Units
// ============================================================================

#[test]
fn test_catalog_pixels_match_physical_size() {
    for label in LabelCatalog::built_in().all() {
        assert!(label.is_consistent(), "label {} pixel sizes drift from mm", label.id);
        for dpi in Dpi::ALL {
            let px = label.pixels(dpi);
            let back = units::pixels_to_mm(px.width as f32, dpi);
            assert!(
                (back - label.width_mm).abs() <= units::pixels_to_mm(1.0, dpi),
                "{} at {}: {} mm vs {} mm",
                label.id,
                dpi,
                back,
                label.width_mm
            );
        }
    }
}

#[test]
fn test_one_inch_at_each_dpi() {
    assert!((units::mm_to_pixels(25.4, Dpi::Dpi203) - 203.0).abs() < 1e-3);
    assert!((units::mm_to_pixels(25.4, Dpi::Dpi300) - 300.0).abs() < 1e-3);
    assert!((units::pixels_at_dpi_to_pixels_at_dpi(203.0, Dpi::Dpi203, Dpi::Dpi300) - 300.0).abs() < 1e-3);
}

// ============================================================================
// Rendering
// ============================================================================

#[tokio::test]
async fn test_rerender_is_deterministic() {
    let engine = ExportEngine::new(assets());
    let doc = Document::for_label(label("2x1"))
        .with_element(Element::text(10.0, 10.0, 300.0, 30.0, "Lot 42"))
        .with_element(Element::barcode(10.0, 60.0, 300.0, 100.0, "ABC-123"))
        .with_element(Element::image(320.0, 10.0, 60.0, 60.0, LOGO));

    let first = engine.export(&doc, Dpi::Dpi300, ExportFormat::Png).await.unwrap();
    let second = engine.export(&doc, Dpi::Dpi300, ExportFormat::Png).await.unwrap();
    assert_eq!(first.bytes, second.bytes);
    assert!(first.degradations.is_empty());
}

#[test]
fn test_later_elements_paint_over_earlier() {
    let red = Color::rgb(255, 0, 0);
    let blue = Color::rgb(0, 0, 255);
    let doc = Document::with_pixel_size(40.0, 40.0, Dpi::Dpi203)
        .with_element(filled(0.0, 0.0, 20.0, 20.0, red))
        .with_element(filled(10.0, 10.0, 20.0, 20.0, blue));

    let mut orch = RenderOrchestrator::new(RasterSurface::new(40, 40), assets());
    orch.render(&doc, 1.0);
    let surface = orch.surface();
    assert_eq!(surface.pixel(5, 5), Some(red));
    assert_eq!(surface.pixel(15, 15), Some(blue));
    assert_eq!(surface.pixel(35, 5), Some(Color::WHITE));
}

#[test]
fn test_zero_fill_opacity_skips_fill() {
    let outline = ShapeProps {
        shape: ShapeType::Rectangle,
        fill_color: Color::rgb(255, 0, 0),
        fill_opacity: 0.0,
        border_width: 2.0,
        ..Default::default()
    };
    let doc = Document::with_pixel_size(40.0, 40.0, Dpi::Dpi203)
        .with_element(Element::shape(5.0, 5.0, 30.0, 30.0, outline));

    let mut orch = RenderOrchestrator::new(RecordingSurface::new(40, 40), assets());
    orch.render(&doc, 1.0);
    assert_eq!(orch.surface().fill_count(), 0);
    assert_eq!(orch.surface().stroke_count(), 1);
}

#[tokio::test]
async fn test_rejected_image_draws_error_placeholder() {
    let doc = Document::with_pixel_size(100.0, 100.0, Dpi::Dpi203)
        .with_element(Element::image(10.0, 10.0, 50.0, 50.0, "https://cdn.example/gone.png"));

    let mut orch = RenderOrchestrator::new(RecordingSurface::new(100, 100), assets());
    orch.render_to_completion(&doc, 1.0).await;

    assert_eq!(orch.state(), PassState::Complete);
    assert_eq!(orch.degradations().len(), 1);
    assert_eq!(orch.degradations()[0].kind, DegradationKind::Image);
    let calls = orch.surface().calls_since_clear();
    assert!(calls.iter().any(|c| matches!(c, DrawCall::StrokeRect { .. })));
    assert!(!calls.iter().any(|c| matches!(c, DrawCall::Image { .. })));
}

// ============================================================================
// Export
// ============================================================================

fn pdf_media_box(doc: &PdfDocument) -> Vec<f32> {
    let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    page.get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o.as_float().unwrap())
        .collect()
}

fn pdf_image_width(doc: &PdfDocument) -> i64 {
    doc.objects
        .values()
        .filter_map(|o| o.as_stream().ok())
        .find(|s| {
            s.dict
                .get(b"Subtype")
                .and_then(|v| v.as_name())
                .map(|n| n == b"Image")
                .unwrap_or(false)
        })
        .and_then(|s| s.dict.get(b"Width").ok())
        .and_then(|w| w.as_i64().ok())
        .unwrap()
}

#[tokio::test]
async fn test_pdf_page_is_physical_label_size() {
    let engine = ExportEngine::new(assets());
    let doc = Document::for_label(label("2x1"))
        .with_element(Element::text(10.0, 10.0, 300.0, 30.0, "2 x 1"));

    let artifact = engine.export(&doc, Dpi::Dpi300, ExportFormat::Pdf).await.unwrap();
    assert_eq!(artifact.content_type(), "application/pdf");
    assert_eq!((artifact.width_px, artifact.height_px), (600, 300));

    let pdf = PdfDocument::load_mem(&artifact.bytes).unwrap();
    let mb = pdf_media_box(&pdf);
    assert!((mb[2] - 144.0).abs() < 0.01, "width {} pt", mb[2]);
    assert!((mb[3] - 72.0).abs() < 0.01, "height {} pt", mb[3]);
    assert_eq!(pdf_image_width(&pdf), 600);

    // same physical page at the lower resolution
    let low = engine.export(&doc, Dpi::Dpi203, ExportFormat::Pdf).await.unwrap();
    let low = PdfDocument::load_mem(&low.bytes).unwrap();
    assert_eq!(pdf_media_box(&low), mb);
    assert_eq!(pdf_image_width(&low), 406);
}

#[tokio::test]
async fn test_oversized_elements_render_clipped() {
    let engine = ExportEngine::new(assets());
    let mut huge_text = Element::text(10.0, 10.0, 300.0, 30.0, "AAAAAAAAAA");
    if let ElementKind::Text(t) = &mut huge_text.kind {
        t.font_size = 200_000.0;
    }
    let doc = Document::for_label(label("2x1"))
        .with_element(huge_text)
        .with_element(Element::image(-5_000.0, -5_000.0, 1.0e9, 1.0e9, LOGO));

    let artifact = engine.export(&doc, Dpi::Dpi203, ExportFormat::Png).await.unwrap();
    assert!(artifact.degradations.is_empty());
    let png = image::load_from_memory(&artifact.bytes).unwrap().to_rgba8();
    assert_eq!(png.dimensions(), (406, 203));
    // the stretched logo covers the whole label
    assert_eq!(png.get_pixel(400, 200), &Rgba([0, 128, 0, 255]));
}

#[tokio::test]
async fn test_export_without_geometry_fails() {
    let engine = ExportEngine::new(assets());
    let doc = Document::new().with_element(Element::text(0.0, 0.0, 10.0, 10.0, "x"));
    let err = engine.export(&doc, Dpi::Dpi203, ExportFormat::Png).await.unwrap_err();
    assert!(matches!(err, ExportError::MissingGeometry(_)));
}

// ============================================================================
// Batch
// ============================================================================

#[tokio::test]
async fn test_batch_row_failure_is_isolated() {
    let template = Document::for_label(label("2x1"))
        .with_name("tag {{sku}}")
        .with_element(Element::text(10.0, 10.0, 300.0, 30.0, "{{sku}}"))
        .with_element(Element::image(320.0, 10.0, 60.0, 60.0, "{{img}}"));
    let rows = vec![
        Bindings::from_pairs([("sku", "A-1"), ("img", LOGO)]),
        Bindings::from_pairs([("sku", "A-2"), ("img", "https://cdn.example/missing.png")]),
        Bindings::from_pairs([("sku", "A-3"), ("img", LOGO)]),
    ];

    let driver = BatchDriver::new(ExportEngine::new(assets()));
    let result = driver
        .run_batch(&template, &rows, ExportOptions::new(Dpi::Dpi203, ExportFormat::Png))
        .await;

    assert_eq!(result.status, BatchStatus::Partial);
    assert_eq!(result.rows.len(), 3);
    assert_eq!((result.succeeded(), result.failed()), (2, 1));
    assert!(result.rows[0].is_success());
    assert!(matches!(
        result.rows[1].error(),
        Some(ExportError::AssetUnresolved(_))
    ));
    assert!(result.rows[2].is_success());
    assert_eq!(result.rows[2].artifact().unwrap().filename, "tag-A-3.png");
}

// ============================================================================
// Orchestrator
// ============================================================================

#[test]
fn test_superseded_load_does_not_repaint() {
    let doc = Document::with_pixel_size(100.0, 100.0, Dpi::Dpi203)
        .with_element(Element::image(0.0, 0.0, 50.0, 50.0, LOGO));
    let mut orch = RenderOrchestrator::new(RecordingSurface::new(100, 100), assets());

    let stale = orch.render(&doc, 1.0);
    orch.render(&doc, 1.0);
    let redraws = orch.redraw_count();
    let calls = orch.surface().calls().len();

    let outcome = orch.complete(AssetCompletion {
        url: stale[0].url.clone(),
        generation: stale[0].generation,
        result: Ok(Arc::new(logo().to_rgba8())),
    });

    assert_eq!(outcome, CompletionOutcome::Superseded);
    assert_eq!(orch.redraw_count(), redraws);
    assert_eq!(orch.surface().calls().len(), calls);
    assert_eq!(orch.state(), PassState::AwaitingAssets);
}
