//! Image element renderer.
//!
//! Three outcomes depending on what the pass knows about the source:
//! ready images are stretched to the box at the element's opacity, unknown
//! ones get the loading placeholder and a load request, failed ones get the
//! error placeholder. Opacity is an argument to the draw call and never
//! outlives it.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::document::ImageProps;
use crate::surface::{Rect, Surface};

use super::{DegradationKind, ImageState, RenderContext, placeholder};

pub const ERROR_CAPTION: &str = "Image Error";
const CAPTION_SIZE: f32 = 12.0;

pub fn draw<S: Surface + ?Sized>(
    surface: &mut S,
    bounds: Rect,
    props: &ImageProps,
    ctx: &mut RenderContext<'_>,
) {
    let src = props.src.trim();
    if src.is_empty() {
        placeholder::failed(surface, bounds, ERROR_CAPTION, CAPTION_SIZE);
        ctx.degrade(DegradationKind::Image, "image has no source");
        return;
    }

    match ctx.images.lookup(src) {
        ImageState::Ready(image) => draw_ready(surface, bounds, image.as_ref(), props.alpha()),
        ImageState::Missing => {
            placeholder::loading(surface, bounds);
            ctx.request_image(src);
        }
        ImageState::Failed(reason) => {
            placeholder::failed(surface, bounds, ERROR_CAPTION, CAPTION_SIZE);
            ctx.degrade(DegradationKind::Image, format!("{}: {}", src, reason));
        }
    }
}

/// Stretch `image` over `bounds`, scaling only the part that lands on the surface.
fn draw_ready<S: Surface + ?Sized>(surface: &mut S, bounds: Rect, image: &RgbaImage, alpha: f32) {
    let width = bounds.width.round() as u32;
    let height = bounds.height.round() as u32;
    if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
        return;
    }
    let (vx0, vx1) = visible(bounds.x, width, surface.width());
    let (vy0, vy1) = visible(bounds.y, height, surface.height());
    if vx0 >= vx1 || vy0 >= vy1 {
        return;
    }

    if (vx0, vy0, vx1, vy1) == (0, 0, width, height) {
        if image.dimensions() == (width, height) {
            surface.draw_image(bounds, image, alpha);
        } else {
            let scaled = imageops::resize(image, width, height, FilterType::Triangle);
            surface.draw_image(bounds, &scaled, alpha);
        }
        return;
    }

    // Source pixels behind the visible part of the box.
    let sx = image.width() as f64 / width as f64;
    let sy = image.height() as f64 / height as f64;
    let cx0 = (vx0 as f64 * sx).floor() as u32;
    let cy0 = (vy0 as f64 * sy).floor() as u32;
    let cx1 = ((vx1 as f64 * sx).ceil() as u32).clamp(cx0 + 1, image.width());
    let cy1 = ((vy1 as f64 * sy).ceil() as u32).clamp(cy0 + 1, image.height());
    let cropped = imageops::crop_imm(image, cx0, cy0, cx1 - cx0, cy1 - cy0).to_image();
    let scaled = imageops::resize(&cropped, vx1 - vx0, vy1 - vy0, FilterType::Triangle);
    let rect = Rect::new(
        bounds.x + vx0 as f32,
        bounds.y + vy0 as f32,
        (vx1 - vx0) as f32,
        (vy1 - vy0) as f32,
    );
    surface.draw_image(rect, &scaled, alpha);
}

/// Box-local pixel range `[from, to)` of a `len`-pixel run starting at
/// `start` that falls on `[0, limit)`.
fn visible(start: f32, len: u32, limit: u32) -> (u32, u32) {
    let start = start.round() as i64;
    let from = (-start).clamp(0, len as i64);
    let to = (limit as i64 - start).clamp(0, len as i64);
    (from as u32, to as u32)
}
