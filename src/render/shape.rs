//! Shape element renderer.

use crate::document::{ShapeProps, ShapeType};
use crate::surface::{Paint, Point, Rect, Stroke, Surface};

/// Fill (when fill opacity is above zero), then stroke, so the outline stays
/// crisp over a translucent fill.
pub fn draw<S: Surface + ?Sized>(surface: &mut S, bounds: Rect, props: &ShapeProps) {
    let fill = (props.fill_percent() > 0.0)
        .then(|| Paint::solid(props.fill_color).with_opacity_percent(props.fill_percent()));
    let stroke = (props.border_width > 0.0).then(|| Stroke::new(props.border_color, props.border_width));

    match props.shape {
        ShapeType::Rectangle => {
            if let Some(paint) = fill {
                surface.fill_rect(bounds, paint);
            }
            if let Some(stroke) = stroke {
                surface.stroke_rect(bounds, stroke);
            }
        }
        ShapeType::Circle => {
            let center = bounds.center();
            let radius = bounds.width.min(bounds.height) / 2.0;
            if let Some(paint) = fill {
                surface.fill_circle(center, radius, paint);
            }
            if let Some(stroke) = stroke {
                surface.stroke_circle(center, radius, stroke);
            }
        }
        // A line has no interior to fill.
        ShapeType::Line => {
            if let Some(stroke) = stroke {
                surface.stroke_line(
                    Point::new(bounds.x, bounds.y),
                    Point::new(bounds.right(), bounds.bottom()),
                    stroke,
                );
            }
        }
    }
}
