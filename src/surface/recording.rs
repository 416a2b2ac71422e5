//! A surface that records draw calls instead of rasterizing them.

use image::RgbaImage;

use super::{Color, Mask, Paint, Point, Rect, Stroke, Surface};

/// One recorded primitive call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(Color),
    FillRect { rect: Rect, paint: Paint },
    StrokeRect { rect: Rect, stroke: Stroke },
    FillCircle { center: Point, radius: f32, paint: Paint },
    StrokeCircle { center: Point, radius: f32, stroke: Stroke },
    Line { from: Point, to: Point, stroke: Stroke },
    Mask { origin: Point, width: usize, height: usize, paint: Paint },
    Image { rect: Rect, width: u32, height: u32, opacity: f32 },
}

impl DrawCall {
    /// Whether this call paints an area fill (as opposed to an outline).
    pub fn is_fill(&self) -> bool {
        matches!(self, DrawCall::FillRect { .. } | DrawCall::FillCircle { .. })
    }

    pub fn is_stroke(&self) -> bool {
        matches!(
            self,
            DrawCall::StrokeRect { .. } | DrawCall::StrokeCircle { .. } | DrawCall::Line { .. }
        )
    }
}

/// Records every call made against it, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Calls recorded since the last `clear`.
    pub fn calls_since_clear(&self) -> &[DrawCall] {
        let start = self
            .calls
            .iter()
            .rposition(|c| matches!(c, DrawCall::Clear(_)))
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.calls[start..]
    }

    pub fn fill_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_fill()).count()
    }

    pub fn stroke_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_stroke()).count()
    }

    pub fn clear_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Clear(_)))
            .count()
    }

    pub fn reset(&mut self) {
        self.calls.clear();
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, color: Color) {
        self.calls.push(DrawCall::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect, paint: Paint) {
        self.calls.push(DrawCall::FillRect { rect, paint });
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke) {
        self.calls.push(DrawCall::StrokeRect { rect, stroke });
    }

    fn fill_circle(&mut self, center: Point, radius: f32, paint: Paint) {
        self.calls.push(DrawCall::FillCircle {
            center,
            radius,
            paint,
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: Stroke) {
        self.calls.push(DrawCall::StrokeCircle {
            center,
            radius,
            stroke,
        });
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.calls.push(DrawCall::Line { from, to, stroke });
    }

    fn fill_mask(&mut self, origin: Point, mask: &Mask, paint: Paint) {
        self.calls.push(DrawCall::Mask {
            origin,
            width: mask.width,
            height: mask.height,
            paint,
        });
    }

    fn draw_image(&mut self, rect: Rect, image: &RgbaImage, opacity: f32) {
        self.calls.push(DrawCall::Image {
            rect,
            width: image.width(),
            height: image.height(),
            opacity,
        });
    }
}
