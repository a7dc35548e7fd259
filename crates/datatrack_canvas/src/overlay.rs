//! Overlay shapes for drawing on top of a video frame.
//!
//! These are plain scene descriptions in surface (intrinsic) coordinates,
//! decoupled from application-specific region types.

use crate::Color;

/// A shape that can be drawn as an overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayShape {
    /// A polygon or open polyline defined by vertices.
    Polygon {
        /// Vertices in surface space
        vertices: Vec<(f32, f32)>,
        /// Whether the last vertex connects back to the first
        closed: bool,
    },
    /// A line segment.
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
}

/// Text anchored at a surface position.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLabel {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub color: Color,
    pub font_px: f32,
}

/// An overlay item with shape and styling.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayItem {
    /// The shape to draw
    pub shape: OverlayShape,
    /// Stroke color for the outline
    pub stroke: Color,
    /// Interior fill, only used for closed polygons
    pub fill: Option<Color>,
    /// Outline width in surface pixels
    pub line_width: f32,
    /// Radius of the vertex markers, if any
    pub vertex_radius: Option<f32>,
    /// Optional text label
    pub label: Option<OverlayLabel>,
}

impl OverlayItem {
    /// Create a new overlay item with a plain outline.
    pub fn new(shape: OverlayShape, stroke: Color) -> Self {
        Self {
            shape,
            stroke,
            fill: None,
            line_width: 2.0,
            vertex_radius: None,
            label: None,
        }
    }

    pub fn fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn line_width(mut self, width: f32) -> Self {
        self.line_width = width;
        self
    }

    pub fn vertices(mut self, radius: f32) -> Self {
        self.vertex_radius = Some(radius);
        self
    }

    pub fn label(mut self, label: OverlayLabel) -> Self {
        self.label = Some(label);
        self
    }
}

/// A collection of overlay items to render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    /// Committed items, drawn in order
    pub items: Vec<OverlayItem>,
    /// In-progress items, drawn last
    pub preview: Vec<OverlayItem>,
}

impl Overlay {
    /// Create a new empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item to the overlay.
    pub fn push(&mut self, item: OverlayItem) {
        self.items.push(item);
    }

    /// Add a preview item.
    pub fn push_preview(&mut self, item: OverlayItem) {
        self.preview.push(item);
    }

    /// Check if the overlay is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.preview.is_empty()
    }
}
