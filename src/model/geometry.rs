//! Geometry primitives in intrinsic video pixel space.

use serde::{Deserialize, Serialize};

/// A 2D point in intrinsic video pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Point> for (f32, f32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

impl From<Point> for [f32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Top-left corner X coordinate
    pub x: f32,
    /// Top-left corner Y coordinate
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a box from two opposite corners, in any drag direction.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let x = p1.x.min(p2.x);
        let y = p1.y.min(p2.y);
        let width = (p1.x - p2.x).abs();
        let height = (p1.y - p2.y).abs();
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Both sides are at least `min` long.
    pub fn meets_min_size(&self, min: f32) -> bool {
        self.width >= min && self.height >= min
    }

    /// Corners clockwise from the top-left.
    pub fn corners(&self) -> [Point; 4] {
        let right = self.x + self.width;
        let bottom = self.y + self.height;
        [
            Point::new(self.x, self.y),
            Point::new(right, self.y),
            Point::new(right, bottom),
            Point::new(self.x, bottom),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_any_direction() {
        let bbox = BoundingBox::from_corners(Point::new(50.0, 40.0), Point::new(10.0, 20.0));
        assert_eq!(bbox, BoundingBox::new(10.0, 20.0, 40.0, 20.0));
    }

    #[test]
    fn test_corners_clockwise_from_top_left() {
        let c = BoundingBox::new(10.0, 20.0, 30.0, 40.0).corners();
        assert_eq!(c[0], Point::new(10.0, 20.0));
        assert_eq!(c[1], Point::new(40.0, 20.0));
        assert_eq!(c[2], Point::new(40.0, 60.0));
        assert_eq!(c[3], Point::new(10.0, 60.0));
    }

    #[test]
    fn test_min_size_is_per_side() {
        assert!(!BoundingBox::new(0.0, 0.0, 15.0, 30.0).meets_min_size(20.0));
        assert!(BoundingBox::new(0.0, 0.0, 20.0, 20.0).meets_min_size(20.0));
    }

    #[test]
    fn test_enclosing_box() {
        let pts = [Point::new(5.0, 1.0), Point::new(2.0, 9.0), Point::new(7.0, 4.0)];
        assert_eq!(
            BoundingBox::enclosing(&pts),
            Some(BoundingBox::new(2.0, 1.0, 5.0, 8.0))
        );
        assert_eq!(BoundingBox::enclosing(&[]), None);
    }
}
