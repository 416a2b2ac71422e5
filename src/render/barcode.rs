//! Barcode element renderer.
//!
//! Linear symbols are stretched to the element width with a fractional
//! module width, and the human-readable value goes underneath when
//! `display_value` is set. QR symbols are drawn as a square of side
//! `min(width, height)` centered in the box.
//!
//! When the symbol backend is unavailable or rejects the value, the element
//! becomes a bordered box showing the attempted value so the print area is
//! never silently empty.

use crate::assets::Symbol;
use crate::document::{BarcodeProps, TextAlign, TextProps};
use crate::surface::{Color, Paint, Rect, Surface};

use super::{DegradationKind, RenderContext, placeholder, text};

/// Space between the bars and the caption.
const CAPTION_GAP: f32 = 2.0;

pub fn draw<S: Surface + ?Sized>(
    surface: &mut S,
    bounds: Rect,
    props: &BarcodeProps,
    ctx: &mut RenderContext<'_>,
) {
    match ctx.symbols.generate(&props.value, props.format) {
        Ok(Symbol::Linear { modules }) => draw_linear(surface, bounds, props, &modules),
        Ok(Symbol::Matrix { size, modules }) => draw_matrix(surface, bounds, size, &modules),
        Err(e) => {
            log::debug!("barcode fallback for {:?}: {}", props.value, e);
            placeholder::failed(surface, bounds, &props.value, props.font_size);
            ctx.degrade(DegradationKind::Barcode, e.to_string());
        }
    }
}

/// Consecutive dark modules as `(start, len)` pairs.
fn dark_runs(modules: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, &dark) in modules.iter().enumerate() {
        match (dark, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i - s));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, modules.len() - s));
    }
    runs
}

fn draw_linear<S: Surface + ?Sized>(surface: &mut S, bounds: Rect, props: &BarcodeProps, modules: &[bool]) {
    if modules.is_empty() || bounds.is_empty() {
        return;
    }
    let caption_height = props.font_size + CAPTION_GAP;
    let show_caption = props.display_value && bounds.height > caption_height;
    let bar_height = if show_caption {
        bounds.height - caption_height
    } else {
        bounds.height
    };

    let module_width = bounds.width / modules.len() as f32;
    let paint = Paint::solid(Color::BLACK);
    for (start, len) in dark_runs(modules) {
        surface.fill_rect(
            Rect::new(
                bounds.x + start as f32 * module_width,
                bounds.y,
                len as f32 * module_width,
                bar_height,
            ),
            paint,
        );
    }

    if show_caption {
        let caption = TextProps {
            content: props.value.clone(),
            font_size: props.font_size,
            align: TextAlign::Center,
            line_height: 1.0,
            ..Default::default()
        };
        let caption_box = Rect::new(
            bounds.x,
            bounds.y + bar_height + CAPTION_GAP,
            bounds.width,
            props.font_size,
        );
        text::draw(surface, caption_box, &caption);
    }
}

fn draw_matrix<S: Surface + ?Sized>(surface: &mut S, bounds: Rect, size: usize, modules: &[bool]) {
    if size == 0 || bounds.is_empty() {
        return;
    }
    let side = bounds.width.min(bounds.height);
    let module = side / size as f32;
    let x0 = bounds.x + (bounds.width - side) / 2.0;
    let y0 = bounds.y + (bounds.height - side) / 2.0;
    let paint = Paint::solid(Color::BLACK);
    for (row, line) in modules.chunks(size).enumerate() {
        for (start, len) in dark_runs(line) {
            surface.fill_rect(
                Rect::new(
                    x0 + start as f32 * module,
                    y0 + row as f32 * module,
                    len as f32 * module,
                    module,
                ),
                paint,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{BarcodeSymbols, Symbology, UnavailableSymbols};
    use crate::render::NoImages;
    use crate::surface::{DrawCall, RasterSurface, RecordingSurface};

    fn props(value: &str, format: Symbology) -> BarcodeProps {
        BarcodeProps {
            value: value.into(),
            format,
            ..Default::default()
        }
    }

    #[test]
    fn test_dark_runs() {
        assert_eq!(
            dark_runs(&[true, true, false, true, false, false, true]),
            vec![(0, 2), (3, 1), (6, 1)]
        );
        assert!(dark_runs(&[false, false]).is_empty());
    }

    #[test]
    fn test_linear_bars_span_element_width() {
        let mut ctx = RenderContext::new(&NoImages, &BarcodeSymbols);
        let mut surface = RecordingSurface::new(300, 100);
        let bounds = Rect::new(10.0, 10.0, 200.0, 60.0);
        draw(&mut surface, bounds, &props("ABC-123", Symbology::Code128), &mut ctx);

        let bars: Vec<Rect> = surface
            .calls()
            .iter()
            .filter_map(|c| match c {
                DrawCall::FillRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert!(bars.len() > 10);
        // first module is a bar starting at the left edge
        assert_eq!(bars[0].x, 10.0);
        let last = bars[bars.len() - 1];
        assert!((last.right() - 210.0).abs() < 0.01);
        // caption takes the bottom
        assert_eq!(bars[0].height, 60.0 - 12.0 - CAPTION_GAP);
        assert!(surface.calls().iter().any(|c| matches!(c, DrawCall::Mask { .. })));
        assert!(ctx.degradations.is_empty());
    }

    #[test]
    fn test_caption_hidden() {
        let mut ctx = RenderContext::new(&NoImages, &BarcodeSymbols);
        let mut surface = RecordingSurface::new(300, 100);
        let p = BarcodeProps {
            display_value: false,
            ..props("12345", Symbology::Code39)
        };
        draw(&mut surface, Rect::new(0.0, 0.0, 200.0, 60.0), &p, &mut ctx);
        assert!(!surface.calls().iter().any(|c| matches!(c, DrawCall::Mask { .. })));
    }

    #[test]
    fn test_qr_is_square_in_box() {
        let mut ctx = RenderContext::new(&NoImages, &BarcodeSymbols);
        let mut surface = RasterSurface::new(200, 100);
        draw(
            &mut surface,
            Rect::new(0.0, 0.0, 200.0, 100.0),
            &props("https://example.com", Symbology::Qr),
            &mut ctx,
        );
        // centered horizontally: columns left of x=50 stay white
        for y in 0..100 {
            assert_eq!(surface.pixel(20, y), Some(Color::WHITE));
        }
        // finder pattern corner is dark
        assert_eq!(surface.pixel(51, 1), Some(Color::BLACK));
    }

    #[test]
    fn test_unavailable_backend_draws_placeholder_with_value() {
        let mut ctx = RenderContext::new(&NoImages, &UnavailableSymbols);
        let mut surface = RecordingSurface::new(300, 100);
        draw(
            &mut surface,
            Rect::new(0.0, 0.0, 200.0, 60.0),
            &props("SKU-1", Symbology::Code128),
            &mut ctx,
        );
        assert_eq!(surface.stroke_count(), 1);
        assert!(surface.calls().iter().any(|c| matches!(c, DrawCall::Mask { .. })));
        assert_eq!(ctx.degradations.len(), 1);
        assert_eq!(ctx.degradations[0].kind, DegradationKind::Barcode);
    }

    #[test]
    fn test_invalid_value_degrades() {
        let mut ctx = RenderContext::new(&NoImages, &BarcodeSymbols);
        let mut surface = RecordingSurface::new(300, 100);
        draw(
            &mut surface,
            Rect::new(0.0, 0.0, 200.0, 60.0),
            &props("not-digits", Symbology::Ean13),
            &mut ctx,
        );
        assert_eq!(ctx.degradations.len(), 1);
        assert_eq!(surface.stroke_count(), 1);
    }
}
