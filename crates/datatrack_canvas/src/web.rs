//! Browser 2D context as a `Canvas`.

use web_sys::CanvasRenderingContext2d;

use crate::{Canvas, Color};

impl Canvas for CanvasRenderingContext2d {
    fn width(&self) -> u32 {
        self.canvas().map_or(0, |c| c.width())
    }

    fn height(&self) -> u32 {
        self.canvas().map_or(0, |c| c.height())
    }

    fn clear(&mut self) {
        let (w, h) = (self.width(), self.height());
        self.clear_rect(0.0, 0.0, f64::from(w), f64::from(h));
    }

    fn fill_polygon(&mut self, vertices: &[(f32, f32)], color: Color) {
        if !trace_path(self, vertices, true) {
            return;
        }
        self.set_fill_style_str(&color.to_css());
        self.fill();
    }

    fn stroke_polyline(&mut self, vertices: &[(f32, f32)], closed: bool, color: Color, width: f32) {
        if !trace_path(self, vertices, closed) {
            return;
        }
        self.set_stroke_style_str(&color.to_css());
        self.set_line_width(f64::from(width));
        self.stroke();
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color) {
        self.begin_path();
        if let Err(e) = self.arc(
            f64::from(x),
            f64::from(y),
            f64::from(radius),
            0.0,
            std::f64::consts::TAU,
        ) {
            log::warn!("Canvas arc failed: {:?}", e);
            return;
        }
        self.set_fill_style_str(&color.to_css());
        self.fill();
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color, font_px: f32) {
        self.set_font(&format!("bold {}px Arial", font_px));
        self.set_fill_style_str(&color.to_css());
        if let Err(e) = CanvasRenderingContext2d::fill_text(self, text, f64::from(x), f64::from(y))
        {
            log::warn!("Canvas fill_text failed: {:?}", e);
        }
    }
}

fn trace_path(ctx: &CanvasRenderingContext2d, vertices: &[(f32, f32)], closed: bool) -> bool {
    let Some((first, rest)) = vertices.split_first() else {
        return false;
    };
    ctx.begin_path();
    ctx.move_to(f64::from(first.0), f64::from(first.1));
    for &(x, y) in rest {
        ctx.line_to(f64::from(x), f64::from(y));
    }
    if closed {
        ctx.close_path();
    }
    true
}
