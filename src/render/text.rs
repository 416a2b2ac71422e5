//! Text element renderer.
//!
//! Content is split on `\n`; line `i` has its top at
//! `y + i * font_size * line_height`. Lines are aligned inside the element
//! width but never wrapped. Only the part of a line that lands on the
//! surface is rasterized.

use crate::document::{TextAlign, TextProps};
use crate::surface::{Paint, Point, Rect, Surface};

use super::font;

/// Left edge of a line of `line_width` pixels aligned inside `bounds`.
pub fn line_x(bounds: Rect, line_width: f32, align: TextAlign) -> f32 {
    match align {
        TextAlign::Left => bounds.x,
        TextAlign::Center => bounds.x + (bounds.width - line_width) / 2.0,
        TextAlign::Right => bounds.right() - line_width,
    }
}

/// Top of line `index`.
pub fn line_y(bounds: Rect, props: &TextProps, index: usize) -> f32 {
    bounds.y + index as f32 * props.line_advance()
}

pub fn draw<S: Surface + ?Sized>(surface: &mut S, bounds: Rect, props: &TextProps) {
    if props.content.is_empty() || !(props.font_size > 0.0 && props.font_size.is_finite()) {
        return;
    }
    let paint = Paint::solid(props.color);
    let bold = props.is_bold();
    for (index, line) in props.content.split('\n').enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let width = font::measure(line, props.font_size);
        let origin = Point::new(line_x(bounds, width, props.align), line_y(bounds, props, index));
        let Some(window) = visible_window(surface, origin, font::line_extent(line, props.font_size, bold))
        else {
            continue;
        };
        let mask = font::rasterize_window(line, props.font_size, bold, window);
        if mask.is_blank() {
            continue;
        }
        let origin = Point::new(origin.x + window.x0 as f32, origin.y + window.y0 as f32);
        surface.fill_mask(origin, &mask, paint);
    }
}

/// The part of a line of `extent` pixels placed at `origin` that lands on
/// the surface, in line-local pixels.
fn visible_window<S: Surface + ?Sized>(
    surface: &S,
    origin: Point,
    extent: (usize, usize),
) -> Option<font::Window> {
    let clip = |start: f32, len: usize, limit: u32| {
        let start = start.round() as i64;
        let from = (-start).clamp(0, len as i64);
        let to = (limit as i64 - start).clamp(0, len as i64);
        (from as usize, to as usize)
    };
    let (x0, x1) = clip(origin.x, extent.0, surface.width());
    let (y0, y1) = clip(origin.y, extent.1, surface.height());
    let window = font::Window { x0, y0, x1, y1 };
    (!window.is_empty()).then_some(window)
}
