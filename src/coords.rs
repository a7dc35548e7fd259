//! Display-to-intrinsic coordinate mapping.
//!
//! The video surface is usually scaled by layout, so pointer positions arrive
//! in client (CSS) pixels while regions live in intrinsic video pixels. The
//! displayed bounding rectangle is passed in on every event; nothing is cached
//! across layout changes.

use crate::model::Point;

/// The displayed bounding rectangle of the surface, in client pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A rectangle at the origin that shows the surface at 1:1.
    pub fn identity(size: IntrinsicSize) -> Self {
        Self::new(0.0, 0.0, size.width as f32, size.height as f32)
    }

    /// Layout has settled into a usable, non-empty box.
    pub fn is_usable(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// The native resolution of the loaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IntrinsicSize {
    pub width: u32,
    pub height: u32,
}

impl IntrinsicSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Map a client-space pointer position into intrinsic pixels.
///
/// Returns `None` when the displayed rectangle has no usable area or the
/// surface has no intrinsic size; callers must ignore such events rather
/// than record a bogus vertex.
pub fn map_pointer(
    client_x: f32,
    client_y: f32,
    rect: DisplayRect,
    intrinsic: IntrinsicSize,
) -> Option<Point> {
    if !rect.is_usable() || intrinsic.is_empty() {
        return None;
    }

    let scale_x = intrinsic.width as f32 / rect.width;
    let scale_y = intrinsic.height as f32 / rect.height;
    let point = Point::new(
        (client_x - rect.left) * scale_x,
        (client_y - rect.top) * scale_y,
    );
    point.is_finite().then_some(point)
}

/// Inverse of [`map_pointer`].
pub fn to_client(point: Point, rect: DisplayRect, intrinsic: IntrinsicSize) -> Option<(f32, f32)> {
    if !rect.is_usable() || intrinsic.is_empty() {
        return None;
    }

    let x = rect.left + point.x * rect.width / intrinsic.width as f32;
    let y = rect.top + point.y * rect.height / intrinsic.height as f32;
    Some((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_center_maps_to_intrinsic_center() {
        let rect = DisplayRect::new(10.0, 20.0, 640.0, 360.0);
        let size = IntrinsicSize::new(1920, 1080);
        let p = map_pointer(330.0, 200.0, rect, size).unwrap();
        assert!(approx_eq(p.x, 960.0));
        assert!(approx_eq(p.y, 540.0));
    }

    #[test]
    fn test_round_trip() {
        let rect = DisplayRect::new(37.5, 12.25, 800.0, 450.0);
        let size = IntrinsicSize::new(1280, 720);
        for &(cx, cy) in &[(37.5, 12.25), (437.5, 237.25), (800.0, 400.0)] {
            let p = map_pointer(cx, cy, rect, size).unwrap();
            let (bx, by) = to_client(p, rect, size).unwrap();
            assert!(approx_eq(bx, cx), "x: {} vs {}", bx, cx);
            assert!(approx_eq(by, cy), "y: {} vs {}", by, cy);
        }
    }

    #[test]
    fn test_non_uniform_scale() {
        // Stretched layout: each axis scales independently.
        let rect = DisplayRect::new(0.0, 0.0, 100.0, 400.0);
        let p = map_pointer(50.0, 100.0, rect, IntrinsicSize::new(1000, 1000)).unwrap();
        assert!(approx_eq(p.x, 500.0));
        assert!(approx_eq(p.y, 250.0));
    }

    #[test]
    fn test_zero_sized_layout_is_unavailable() {
        let size = IntrinsicSize::new(1920, 1080);
        assert_eq!(map_pointer(5.0, 5.0, DisplayRect::new(0.0, 0.0, 0.0, 360.0), size), None);
        assert_eq!(map_pointer(5.0, 5.0, DisplayRect::new(0.0, 0.0, 640.0, -1.0), size), None);
        assert_eq!(
            map_pointer(5.0, 5.0, DisplayRect::new(0.0, 0.0, f32::NAN, 360.0), size),
            None
        );
    }

    #[test]
    fn test_empty_surface_is_unavailable() {
        let rect = DisplayRect::new(0.0, 0.0, 640.0, 360.0);
        assert_eq!(map_pointer(5.0, 5.0, rect, IntrinsicSize::new(0, 1080)), None);
    }

    #[test]
    fn test_outside_points_are_not_clamped() {
        let rect = DisplayRect::new(100.0, 100.0, 200.0, 200.0);
        let p = map_pointer(50.0, 350.0, rect, IntrinsicSize::new(400, 400)).unwrap();
        assert!(approx_eq(p.x, -100.0));
        assert!(approx_eq(p.y, 500.0));
    }
}
