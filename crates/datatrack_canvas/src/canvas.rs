//! The drawing-surface abstraction.

use crate::{Color, Overlay, OverlayItem, OverlayShape};

/// An immediate-mode 2D surface, shaped after the browser's 2D context.
///
/// All coordinates are in the surface's intrinsic pixel space.
pub trait Canvas {
    /// Intrinsic width in pixels.
    fn width(&self) -> u32;

    /// Intrinsic height in pixels.
    fn height(&self) -> u32;

    /// Erase the whole surface.
    fn clear(&mut self);

    /// Fill a closed polygon.
    fn fill_polygon(&mut self, vertices: &[(f32, f32)], color: Color);

    /// Stroke a polyline, optionally closing it.
    fn stroke_polyline(&mut self, vertices: &[(f32, f32)], closed: bool, color: Color, width: f32);

    /// Fill a circle.
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color);

    /// Draw text with its baseline starting at `(x, y)`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color, font_px: f32);
}

/// Clear the surface and draw every overlay item, committed items first.
///
/// Always starts from a full clear, so calling it repeatedly never leaves
/// stale pixels behind.
pub fn draw_overlay<C: Canvas + ?Sized>(canvas: &mut C, overlay: &Overlay) {
    canvas.clear();
    for item in overlay.items.iter().chain(overlay.preview.iter()) {
        draw_item(canvas, item);
    }
}

fn draw_item<C: Canvas + ?Sized>(canvas: &mut C, item: &OverlayItem) {
    match &item.shape {
        OverlayShape::Polygon { vertices, closed } => {
            if vertices.is_empty() {
                return;
            }
            if *closed && vertices.len() >= 3 {
                if let Some(fill) = item.fill {
                    canvas.fill_polygon(vertices, fill);
                }
            }
            if vertices.len() >= 2 {
                canvas.stroke_polyline(vertices, *closed, item.stroke, item.line_width);
            }
            if let Some(radius) = item.vertex_radius {
                for &(x, y) in vertices {
                    canvas.fill_circle(x, y, radius, item.stroke);
                }
            }
        }
        OverlayShape::Line { x1, y1, x2, y2 } => {
            canvas.stroke_polyline(&[(*x1, *y1), (*x2, *y2)], false, item.stroke, item.line_width);
        }
    }

    if let Some(label) = &item.label {
        canvas.fill_text(&label.text, label.x, label.y, label.color, label.font_px);
    }
}
