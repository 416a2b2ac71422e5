//! Fallback visuals for elements whose real content is unavailable.

use crate::document::{TextAlign, TextProps};
use crate::surface::{Color, Paint, Rect, Stroke, Surface};

use super::text;

/// Fill of an image that is still loading.
pub const LOADING_FILL: Color = Color::rgb(0xE5, 0xE5, 0xE5);
/// Fill of an element that failed.
pub const ERROR_FILL: Color = Color::rgb(0xF5, 0xF5, 0xF5);
pub const ERROR_BORDER: Color = Color::rgb(0x99, 0x1B, 0x1B);

const MIN_CAPTION_SIZE: f32 = 8.0;

/// Plain light-grey box.
pub fn loading<S: Surface + ?Sized>(surface: &mut S, bounds: Rect) {
    surface.fill_rect(bounds, Paint::solid(LOADING_FILL));
}

/// Bordered box with `caption` centered inside.
pub fn failed<S: Surface + ?Sized>(surface: &mut S, bounds: Rect, caption: &str, caption_size: f32) {
    surface.fill_rect(bounds, Paint::solid(ERROR_FILL));
    // inset so the border stays inside the element box
    surface.stroke_rect(bounds.inflate(-0.5), Stroke::new(ERROR_BORDER, 1.0));

    let size = caption_size.min(bounds.height).max(MIN_CAPTION_SIZE);
    let props = TextProps {
        content: caption.to_string(),
        font_size: size,
        color: ERROR_BORDER,
        align: TextAlign::Center,
        line_height: 1.0,
        ..Default::default()
    };
    let caption_box = Rect::new(
        bounds.x,
        bounds.y + (bounds.height - size) / 2.0,
        bounds.width,
        size,
    );
    text::draw(surface, caption_box, &props);
}
