//! A canvas that records draw calls instead of rasterizing them.

use crate::{Canvas, Color};

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    FillPolygon {
        vertices: Vec<(f32, f32)>,
        color: Color,
    },
    StrokePolyline {
        vertices: Vec<(f32, f32)>,
        closed: bool,
        color: Color,
        width: f32,
    },
    FillCircle {
        x: f32,
        y: f32,
        radius: f32,
        color: Color,
    },
    FillText {
        text: String,
        x: f32,
        y: f32,
        color: Color,
        font_px: f32,
    },
}

/// Records every call; handy for asserting what a renderer produced.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Every command recorded so far.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Commands issued since the most recent clear, i.e. what is visible now.
    pub fn frame(&self) -> &[DrawCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|c| *c == DrawCommand::Clear)
            .map_or(0, |i| i + 1);
        &self.commands[start..]
    }

    /// Number of clears issued.
    pub fn clear_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| **c == DrawCommand::Clear)
            .count()
    }

    /// Text of every label in the visible frame.
    pub fn texts(&self) -> Vec<&str> {
        self.frame()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_polygon(&mut self, vertices: &[(f32, f32)], color: Color) {
        self.commands.push(DrawCommand::FillPolygon {
            vertices: vertices.to_vec(),
            color,
        });
    }

    fn stroke_polyline(&mut self, vertices: &[(f32, f32)], closed: bool, color: Color, width: f32) {
        self.commands.push(DrawCommand::StrokePolyline {
            vertices: vertices.to_vec(),
            closed,
            color,
            width,
        });
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color) {
        self.commands.push(DrawCommand::FillCircle {
            x,
            y,
            radius,
            color,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color, font_px: f32) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            color,
            font_px,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{draw_overlay, Overlay, OverlayItem, OverlayLabel, OverlayShape};

    fn triangle() -> OverlayItem {
        OverlayItem::new(
            OverlayShape::Polygon {
                vertices: vec![(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)],
                closed: true,
            },
            Color::WHITE,
        )
        .fill(Color::WHITE.with_alpha(0.25))
        .vertices(4.0)
        .label(OverlayLabel {
            text: "A".into(),
            x: 0.0,
            y: -10.0,
            color: Color::WHITE,
            font_px: 12.0,
        })
    }

    #[test]
    fn test_draw_overlay_starts_with_clear() {
        let mut canvas = RecordingCanvas::new(20, 20);
        let mut overlay = Overlay::new();
        overlay.push(triangle());

        draw_overlay(&mut canvas, &overlay);
        draw_overlay(&mut canvas, &overlay);

        assert_eq!(canvas.clear_count(), 2);
        // fill + stroke + 3 vertex markers + label
        assert_eq!(canvas.frame().len(), 6);
        assert_eq!(canvas.texts(), vec!["A"]);
    }

    #[test]
    fn test_open_polyline_is_not_filled() {
        let mut canvas = RecordingCanvas::new(20, 20);
        let mut overlay = Overlay::new();
        overlay.push_preview(
            OverlayItem::new(
                OverlayShape::Polygon {
                    vertices: vec![(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)],
                    closed: false,
                },
                Color::BLACK,
            )
            .fill(Color::BLACK),
        );

        draw_overlay(&mut canvas, &overlay);

        assert!(!canvas
            .frame()
            .iter()
            .any(|c| matches!(c, DrawCommand::FillPolygon { .. })));
    }
}
