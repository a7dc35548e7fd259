//! Committed counting regions.

use datatrack_canvas::Color;
use serde::{Deserialize, Serialize};

use super::geometry::{BoundingBox, Point};

/// Unique, monotonically assigned region identifier. Never reused after removal.
pub type RegionId = u32;

/// How a region was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    #[default]
    Polygon,
    Rectangle,
}

/// A closed counting region in intrinsic video pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    /// Vertices in drawing order; at least three once committed.
    pub vertices: Vec<Point>,
    pub color: Color,
    pub label: String,
    #[serde(default)]
    pub kind: RegionKind,
}

impl Region {
    /// Label used when the user does not name a region.
    pub fn default_label(id: RegionId) -> String {
        format!("Region {}", id)
    }

    /// Where the label is anchored.
    pub fn anchor(&self) -> Option<Point> {
        self.vertices.first().copied()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::enclosing(&self.vertices)
    }

    /// Wire form sent to the backend.
    pub fn to_payload(&self) -> RegionPayload {
        RegionPayload {
            id: self.id,
            label: self.label.clone(),
            color: self.color,
            kind: self.kind,
            points: self.vertices.iter().map(|&p| p.into()).collect(),
        }
    }
}

/// A region as the detection backend sees it: ordered `[x, y]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPayload {
    pub id: RegionId,
    pub label: String,
    pub color: Color,
    #[serde(default)]
    pub kind: RegionKind,
    pub points: Vec<[f32; 2]>,
}

impl RegionPayload {
    pub fn vertices(&self) -> Vec<Point> {
        self.points.iter().map(|&p| p.into()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Region {
        Region {
            id: 3,
            vertices: vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(50.0, 80.0),
            ],
            color: Color::from_hex("#4ECDC4").unwrap(),
            label: Region::default_label(3),
            kind: RegionKind::Polygon,
        }
    }

    #[test]
    fn test_default_label_uses_id() {
        assert_eq!(triangle().label, "Region 3");
    }

    #[test]
    fn test_payload_preserves_vertex_order() {
        let payload = triangle().to_payload();
        let expected: Vec<[f32; 2]> = vec![[0.0, 0.0], [100.0, 0.0], [50.0, 80.0]];
        assert_eq!(payload.points, expected);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["color"], "#4ECDC4");
        assert_eq!(json["kind"], "polygon");
    }
}
