//! # Drawing Surfaces
//!
//! A [`Surface`] is the render target element renderers paint onto. It
//! exposes a handful of primitives; every primitive receives its style
//! ([`Paint`] or [`Stroke`]) as an argument, so there is no ambient
//! fill/stroke/alpha state that one element could leave behind for the next.
//!
//! Geometry is fractional. Each implementation decides how to snap it to its
//! own pixel grid.
//!
//! ## Implementations
//!
//! - [`RasterSurface`]: RGBA pixel buffer on white label stock, used for
//!   previews and exports
//! - [`RecordingSurface`]: records draw calls without rasterizing, used to
//!   observe what a renderer asked for

mod color;
mod raster;
mod recording;

pub use color::Color;
pub use raster::{DEFAULT_MAX_PIXELS, RasterSurface, SurfaceError};
pub use recording::{DrawCall, RecordingSurface};

use image::RgbaImage;

/// A point in surface pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in surface pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Grow (or shrink, with a negative amount) on every side.
    pub fn inflate(&self, amount: f32) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }
}

/// Fill style for one primitive call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    /// Multiplier on the color's own alpha, 0.0..=1.0.
    pub opacity: f32,
}

impl Paint {
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
        }
    }

    /// Same color at an opacity given in percent (clamped to 0..=100).
    pub fn with_opacity_percent(self, percent: f32) -> Self {
        Self {
            opacity: percent.clamp(0.0, 100.0) / 100.0,
            ..self
        }
    }

    /// Effective alpha after combining color alpha and opacity.
    pub fn alpha(&self) -> f32 {
        (self.color.a as f32 / 255.0) * self.opacity.clamp(0.0, 1.0)
    }
}

/// Outline style for one primitive call. Strokes are centered on the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

impl Stroke {
    pub fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }

    pub fn paint(&self) -> Paint {
        Paint::solid(self.color)
    }
}

/// A coverage mask (0.0 = transparent, 1.0 = opaque), e.g. rasterized text.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn set(&mut self, x: usize, y: usize, coverage: f32) {
        if x < self.width && y < self.height {
            let idx = y * self.width + x;
            self.data[idx] = self.data[idx].max(coverage.clamp(0.0, 1.0));
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        if x < self.width && y < self.height {
            self.data[y * self.width + x]
        } else {
            0.0
        }
    }

    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&c| c <= 0.0)
    }
}

/// An abstract 2D drawing surface.
pub trait Surface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Reset every pixel to `color`.
    fn clear(&mut self, color: Color);

    fn fill_rect(&mut self, rect: Rect, paint: Paint);

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke);

    fn fill_circle(&mut self, center: Point, radius: f32, paint: Paint);

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: Stroke);

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke);

    /// Paint `paint` through a coverage mask whose top-left is at `origin`.
    fn fill_mask(&mut self, origin: Point, mask: &Mask, paint: Paint);

    /// Composite an image already scaled to `rect`'s size, at `opacity` (0.0..=1.0).
    fn draw_image(&mut self, rect: Rect, image: &RgbaImage, opacity: f32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_helpers() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.center(), Point::new(25.0, 40.0));
        assert_eq!(r.inflate(2.0), Rect::new(8.0, 18.0, 34.0, 44.0));
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_empty());
    }

    #[test]
    fn test_paint_opacity_clamped() {
        let p = Paint::solid(Color::BLACK).with_opacity_percent(150.0);
        assert_eq!(p.opacity, 1.0);
        let p = Paint::solid(Color::BLACK).with_opacity_percent(-5.0);
        assert_eq!(p.alpha(), 0.0);
        let p = Paint::solid(Color::rgba(0, 0, 0, 128)).with_opacity_percent(50.0);
        assert!((p.alpha() - 0.251).abs() < 0.01);
    }

    #[test]
    fn test_mask_set_keeps_max_coverage() {
        let mut mask = Mask::new(2, 2);
        mask.set(1, 1, 0.5);
        mask.set(1, 1, 0.25);
        assert_eq!(mask.get(1, 1), 0.5);
        mask.set(5, 5, 1.0); // out of bounds ignored
        assert_eq!(mask.get(5, 5), 0.0);
        assert!(!mask.is_blank());
    }
}
