//! Region renderer: projects the store onto a drawing surface.
//!
//! Rendering is a pure function of the store. Every call clears the surface
//! and redraws committed regions first, then the draft on top.

use datatrack_canvas::{Canvas, Color, Overlay, OverlayItem, OverlayLabel, OverlayShape, draw_overlay};

use crate::constants::{editor::DRAFT_COLOR, render};
use crate::model::{BoundingBox, Point, Region};
use crate::store::{Draft, RegionStore};

/// Visual parameters for the overlay, in intrinsic pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub draft_color: Color,
    pub fill_alpha: f32,
    pub line_width: f32,
    pub vertex_radius: f32,
    pub draft_vertex_radius: f32,
    pub label_font_px: f32,
    pub label_offset: f32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            draft_color: Color::from_hex(DRAFT_COLOR).unwrap_or(Color::WHITE),
            fill_alpha: render::FILL_ALPHA,
            line_width: render::LINE_WIDTH,
            vertex_radius: render::VERTEX_RADIUS,
            draft_vertex_radius: render::DRAFT_VERTEX_RADIUS,
            label_font_px: render::LABEL_FONT_PX,
            label_offset: render::LABEL_OFFSET,
        }
    }
}

fn tuples(points: &[Point]) -> Vec<(f32, f32)> {
    points.iter().map(|&p| p.into()).collect()
}

fn region_item(region: &Region, style: &RenderStyle) -> OverlayItem {
    let shape = OverlayShape::Polygon {
        vertices: tuples(&region.vertices),
        closed: true,
    };
    let mut item = OverlayItem::new(shape, region.color)
        .fill(region.color.with_alpha(style.fill_alpha))
        .line_width(style.line_width)
        .vertices(style.vertex_radius);

    if let Some(anchor) = region.anchor() {
        item = item.label(OverlayLabel {
            text: region.label.clone(),
            x: anchor.x,
            y: anchor.y - style.label_offset,
            color: region.color,
            font_px: style.label_font_px,
        });
    }
    item
}

fn draft_items(draft: &Draft, style: &RenderStyle) -> Vec<OverlayItem> {
    let color = style.draft_color;
    match draft {
        Draft::Polygon { vertices, cursor } => {
            if vertices.is_empty() {
                return Vec::new();
            }
            let mut items = vec![
                OverlayItem::new(
                    OverlayShape::Polygon {
                        vertices: tuples(vertices),
                        closed: false,
                    },
                    color,
                )
                .line_width(style.line_width)
                .vertices(style.draft_vertex_radius),
            ];
            // Rubber band from the last vertex to the pointer
            if let (Some(last), Some(cursor)) = (vertices.last(), cursor) {
                if last != cursor {
                    items.push(
                        OverlayItem::new(
                            OverlayShape::Line {
                                x1: last.x,
                                y1: last.y,
                                x2: cursor.x,
                                y2: cursor.y,
                            },
                            color.with_alpha(0.6),
                        )
                        .line_width(style.line_width),
                    );
                }
            }
            items
        }
        Draft::Rectangle {
            anchor: Some(anchor),
            current: Some(current),
        } => vec![closed_draft(
            BoundingBox::from_corners(*anchor, *current).corners().to_vec(),
            style,
        )],
        Draft::Rectangle { .. } => Vec::new(),
        Draft::PendingLabel { bounds } => vec![closed_draft(bounds.corners().to_vec(), style)],
    }
}

fn closed_draft(vertices: Vec<Point>, style: &RenderStyle) -> OverlayItem {
    OverlayItem::new(
        OverlayShape::Polygon {
            vertices: tuples(&vertices),
            closed: true,
        },
        style.draft_color,
    )
    .fill(style.draft_color.with_alpha(style.fill_alpha))
    .line_width(style.line_width)
}

/// Build the overlay scene for the current store.
pub fn build_overlay(store: &RegionStore, style: &RenderStyle) -> Overlay {
    let mut overlay = Overlay::new();
    for region in store.committed() {
        overlay.push(region_item(region, style));
    }
    if let Some(draft) = store.draft() {
        for item in draft_items(draft, style) {
            overlay.push_preview(item);
        }
    }
    overlay
}

/// Clear the surface and draw the store onto it.
pub fn render<C: Canvas + ?Sized>(canvas: &mut C, store: &RegionStore, style: &RenderStyle) {
    let overlay = build_overlay(store, style);
    draw_overlay(canvas, &overlay);
    log::trace!(
        "Rendered {} regions ({} preview items)",
        overlay.items.len(),
        overlay.preview.len()
    );
}
