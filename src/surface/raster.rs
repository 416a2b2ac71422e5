//! RGBA raster surface.
//!
//! Pixels start as white label stock and every primitive composites
//! source-over onto it. Fractional geometry snaps by pixel center: a pixel is
//! covered when its center `(px + 0.5, py + 0.5)` lies inside the shape.
//! There is no anti-aliasing, so identical draw calls always produce
//! identical pixels.

use image::{ImageEncoder, Rgba, RgbaImage};
use thiserror::Error;

use super::{Color, Mask, Paint, Point, Rect, Stroke, Surface};

/// Largest surface we agree to allocate (a 4"×6" label at 300 DPI is 2.16 MP).
pub const DEFAULT_MAX_PIXELS: u64 = 64 * 1024 * 1024;

/// Surface allocation / encoding errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Surface has zero area ({0}x{1})")]
    Empty(u32, u32),

    #[error("Surface {width}x{height} exceeds the {max} pixel limit")]
    TooLarge { width: u32, height: u32, max: u64 },

    #[error("Image encoding error: {0}")]
    Encode(String),
}

/// An RGBA pixel buffer.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
}

impl RasterSurface {
    /// Allocate a white surface, refusing empty or oversized requests.
    pub fn try_new(width: u32, height: u32, max_pixels: u64) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::Empty(width, height));
        }
        if width as u64 * height as u64 > max_pixels {
            return Err(SurfaceError::TooLarge {
                width,
                height,
                max: max_pixels,
            });
        }
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
        })
    }

    /// Allocate a white surface of any size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Pixel color, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.image.width() && y < self.image.height() {
            let p = self.image.get_pixel(x, y);
            Some(Color::rgba(p[0], p[1], p[2], p[3]))
        } else {
            None
        }
    }

    /// Encode as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, SurfaceError> {
        let mut png_bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(
                self.image.as_raw(),
                self.image.width(),
                self.image.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e: image::ImageError| SurfaceError::Encode(e.to_string()))?;
        Ok(png_bytes)
    }

    /// Encode as baseline JPEG (alpha dropped; the surface is opaque anyway).
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, SurfaceError> {
        let rgb = image::DynamicImage::ImageRgba8(self.image.clone()).to_rgb8();
        let mut jpeg_bytes = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, quality);
        encoder
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e: image::ImageError| SurfaceError::Encode(e.to_string()))?;
        Ok(jpeg_bytes)
    }

    /// Packed RGB bytes, row-major (for PDF image streams).
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity((self.image.width() * self.image.height() * 3) as usize);
        for p in self.image.pixels() {
            out.extend_from_slice(&[p[0], p[1], p[2]]);
        }
        out
    }

    /// Source-over blend of `color` at `alpha` into one pixel.
    fn blend(&mut self, x: i64, y: i64, color: Color, alpha: f32) {
        if alpha <= 0.0 || x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.image.width() || y >= self.image.height() {
            return;
        }
        let alpha = alpha.min(1.0);
        let dst = self.image.get_pixel_mut(x, y);
        let mix = |s: u8, d: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;
        dst[0] = mix(color.r, dst[0]);
        dst[1] = mix(color.g, dst[1]);
        dst[2] = mix(color.b, dst[2]);
        dst[3] = (alpha * 255.0 + dst[3] as f32 * (1.0 - alpha)).round() as u8;
    }

    /// Pixel index range `[start, end)` whose centers fall inside `[from, to)`.
    fn span(from: f32, to: f32) -> (i64, i64) {
        ((from - 0.5).ceil() as i64, (to - 0.5).ceil() as i64)
    }

    /// Clamp a pixel range to `[0, limit)`.
    fn clip(range: (i64, i64), limit: u32) -> (i64, i64) {
        (range.0.max(0), range.1.min(limit as i64))
    }

    /// Visit every pixel of the bounding box whose center passes `inside`.
    fn fill_where(
        &mut self,
        bounds: Rect,
        color: Color,
        alpha: f32,
        inside: impl Fn(f32, f32) -> bool,
    ) {
        let (x0, x1) = Self::clip(Self::span(bounds.x, bounds.right()), self.image.width());
        let (y0, y1) = Self::clip(Self::span(bounds.y, bounds.bottom()), self.image.height());
        for py in y0..y1 {
            for px in x0..x1 {
                if inside(px as f32 + 0.5, py as f32 + 0.5) {
                    self.blend(px, py, color, alpha);
                }
            }
        }
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn clear(&mut self, color: Color) {
        for p in self.image.pixels_mut() {
            *p = Rgba([color.r, color.g, color.b, color.a]);
        }
    }

    fn fill_rect(&mut self, rect: Rect, paint: Paint) {
        if rect.is_empty() {
            return;
        }
        self.fill_where(rect, paint.color, paint.alpha(), |_, _| true);
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke) {
        if stroke.width <= 0.0 {
            return;
        }
        let w = stroke.width;
        let outer = rect.inflate(w / 2.0);
        let paint = stroke.paint();
        if outer.height <= w * 2.0 || outer.width <= w * 2.0 {
            self.fill_rect(outer, paint);
            return;
        }
        // Four non-overlapping bands so translucent strokes don't double up at corners.
        self.fill_rect(Rect::new(outer.x, outer.y, outer.width, w), paint);
        self.fill_rect(Rect::new(outer.x, outer.bottom() - w, outer.width, w), paint);
        let side_h = outer.height - w * 2.0;
        self.fill_rect(Rect::new(outer.x, outer.y + w, w, side_h), paint);
        self.fill_rect(Rect::new(outer.right() - w, outer.y + w, w, side_h), paint);
    }

    fn fill_circle(&mut self, center: Point, radius: f32, paint: Paint) {
        if radius <= 0.0 {
            return;
        }
        let bounds = Rect::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0);
        let r2 = radius * radius;
        self.fill_where(bounds, paint.color, paint.alpha(), |x, y| {
            let (dx, dy) = (x - center.x, y - center.y);
            dx * dx + dy * dy <= r2
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: Stroke) {
        if stroke.width <= 0.0 || radius <= 0.0 {
            return;
        }
        let half = stroke.width / 2.0;
        let outer = radius + half;
        let bounds = Rect::new(center.x - outer, center.y - outer, outer * 2.0, outer * 2.0);
        let paint = stroke.paint();
        self.fill_where(bounds, paint.color, paint.alpha(), |x, y| {
            let (dx, dy) = (x - center.x, y - center.y);
            ((dx * dx + dy * dy).sqrt() - radius).abs() <= half
        });
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        if stroke.width <= 0.0 {
            return;
        }
        let half = stroke.width / 2.0;
        let bounds = Rect::new(
            from.x.min(to.x) - half,
            from.y.min(to.y) - half,
            (from.x - to.x).abs() + stroke.width,
            (from.y - to.y).abs() + stroke.width,
        );
        let (vx, vy) = (to.x - from.x, to.y - from.y);
        let len2 = vx * vx + vy * vy;
        let paint = stroke.paint();
        self.fill_where(bounds, paint.color, paint.alpha(), |x, y| {
            // Distance from the pixel center to the segment.
            let t = if len2 > 0.0 {
                (((x - from.x) * vx + (y - from.y) * vy) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (cx, cy) = (from.x + t * vx, from.y + t * vy);
            let (dx, dy) = (x - cx, y - cy);
            dx * dx + dy * dy <= half * half
        });
    }

    fn fill_mask(&mut self, origin: Point, mask: &Mask, paint: Paint) {
        let ox = origin.x.round() as i64;
        let oy = origin.y.round() as i64;
        let alpha = paint.alpha();
        for my in 0..mask.height {
            for mx in 0..mask.width {
                let coverage = mask.data[my * mask.width + mx];
                if coverage > 0.0 {
                    self.blend(ox + mx as i64, oy + my as i64, paint.color, coverage * alpha);
                }
            }
        }
    }

    fn draw_image(&mut self, rect: Rect, image: &RgbaImage, opacity: f32) {
        let ox = rect.x.round() as i64;
        let oy = rect.y.round() as i64;
        let opacity = opacity.clamp(0.0, 1.0);
        for (ix, iy, p) in image.enumerate_pixels() {
            let alpha = p[3] as f32 / 255.0 * opacity;
            self.blend(
                ox + ix as i64,
                oy + iy as i64,
                Color::rgb(p[0], p[1], p[2]),
                alpha,
            );
        }
    }
}
