//! Data models for the region editor.

mod geometry;
mod region;

pub use geometry::{BoundingBox, Point};
pub use region::{Region, RegionId, RegionKind, RegionPayload};
