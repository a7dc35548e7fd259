//! Raster canvas backed by a tiny-skia pixmap.
//!
//! Used for headless previews and PNG snapshots. There is no font stack here,
//! so text is drawn as a solid plate sized to the label.

use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform};

use crate::{Canvas, CanvasError, Color};

/// Approximate advance of one glyph relative to the font size.
const GLYPH_ADVANCE: f32 = 0.6;

pub struct PixmapCanvas {
    pixmap: Pixmap,
    /// Frame drawn underneath the overlay after every clear.
    background: Option<Pixmap>,
}

impl PixmapCanvas {
    /// Create a transparent surface.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        let pixmap = Pixmap::new(width, height).ok_or(CanvasError::InvalidSize { width, height })?;
        Ok(Self {
            pixmap,
            background: None,
        })
    }

    /// Create a surface that shows a video frame underneath the overlay.
    ///
    /// `rgba` is straight (non-premultiplied) RGBA8, as image decoders produce.
    pub fn with_background(width: u32, height: u32, rgba: &[u8]) -> Result<Self, CanvasError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(CanvasError::BackgroundSize {
                expected,
                actual: rgba.len(),
            });
        }

        let mut background =
            Pixmap::new(width, height).ok_or(CanvasError::InvalidSize { width, height })?;
        for (dst, src) in background.data_mut().chunks_exact_mut(4).zip(rgba.chunks_exact(4)) {
            let a = u16::from(src[3]);
            dst[0] = ((u16::from(src[0]) * a) / 255) as u8;
            dst[1] = ((u16::from(src[1]) * a) / 255) as u8;
            dst[2] = ((u16::from(src[2]) * a) / 255) as u8;
            dst[3] = src[3];
        }

        let mut canvas = Self::new(width, height)?;
        canvas.background = Some(background);
        canvas.clear();
        Ok(canvas)
    }

    /// Premultiplied RGBA8 pixel data.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Premultiplied RGBA of one pixel, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let p = self.pixmap.pixel(x, y)?;
        Some([p.red(), p.green(), p.blue(), p.alpha()])
    }

    /// Encode the current surface as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, CanvasError> {
        self.pixmap
            .encode_png()
            .map_err(|e| CanvasError::Encode(e.to_string()))
    }

    fn paint(color: Color) -> Paint<'static> {
        let [r, g, b, a] = color.to_rgba8();
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        paint
    }

    fn build_path(vertices: &[(f32, f32)], closed: bool) -> Option<tiny_skia::Path> {
        let (first, rest) = vertices.split_first()?;
        let mut pb = PathBuilder::new();
        pb.move_to(first.0, first.1);
        for &(x, y) in rest {
            pb.line_to(x, y);
        }
        if closed {
            pb.close();
        }
        pb.finish()
    }
}

impl Canvas for PixmapCanvas {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
        if let Some(background) = &self.background {
            self.pixmap.draw_pixmap(
                0,
                0,
                background.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }

    fn fill_polygon(&mut self, vertices: &[(f32, f32)], color: Color) {
        let Some(path) = Self::build_path(vertices, true) else {
            log::trace!("Skipping degenerate polygon fill ({} vertices)", vertices.len());
            return;
        };
        self.pixmap.fill_path(
            &path,
            &Self::paint(color),
            FillRule::EvenOdd,
            Transform::identity(),
            None,
        );
    }

    fn stroke_polyline(&mut self, vertices: &[(f32, f32)], closed: bool, color: Color, width: f32) {
        let Some(path) = Self::build_path(vertices, closed) else {
            return;
        };
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            &path,
            &Self::paint(color),
            &stroke,
            Transform::identity(),
            None,
        );
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color) {
        let Some(path) = PathBuilder::from_circle(x, y, radius) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &Self::paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color, font_px: f32) {
        let width = text.chars().count() as f32 * font_px * GLYPH_ADVANCE;
        // Baseline anchoring: the plate sits above (x, y).
        if let Some(rect) = Rect::from_xywh(x, y - font_px, width, font_px) {
            self.pixmap
                .fill_rect(rect, &Self::paint(color), Transform::identity(), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_is_rejected() {
        assert!(matches!(
            PixmapCanvas::new(0, 10),
            Err(CanvasError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_fill_polygon_covers_interior() {
        let mut canvas = PixmapCanvas::new(100, 100).unwrap();
        canvas.fill_polygon(
            &[(10.0, 10.0), (90.0, 10.0), (90.0, 90.0), (10.0, 90.0)],
            Color::from_hex("#FF0000").unwrap(),
        );
        assert_eq!(canvas.pixel(50, 50), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(5, 5), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_clear_restores_background() {
        let rgba = vec![0u8, 0, 255, 255].repeat(4 * 4);
        let mut canvas = PixmapCanvas::with_background(4, 4, &rgba).unwrap();
        canvas.fill_circle(2.0, 2.0, 2.0, Color::WHITE);
        canvas.clear();
        assert_eq!(canvas.pixel(2, 2), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_background_size_mismatch() {
        let err = PixmapCanvas::with_background(4, 4, &[0u8; 10]);
        assert!(matches!(err, Err(CanvasError::BackgroundSize { expected: 64, actual: 10 })));
    }

    #[test]
    fn test_encode_png_signature() {
        let canvas = PixmapCanvas::new(8, 8).unwrap();
        let png = canvas.encode_png().unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }
}
