//! Detection results as reported by the backend, and their presentation.

mod presenter;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use presenter::{DisplayAnomaly, RegionRow, ResultsView, TypeRow, present};

/// Counts for one region, keyed `region_<index>` in [`ResultSet::vehicles_by_region`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionCount {
    /// Detection instances inside the region
    #[serde(default)]
    pub count: u64,
    /// Distinct tracked vehicles, when the backend reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_count: Option<u64>,
    /// Instances per vehicle type
    #[serde(default, alias = "type_breakdown")]
    pub types: BTreeMap<String, u64>,
}

/// Aggregate output of one detection job. Immutable once received.
///
/// Every map may be empty; a missing key means zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Distinct vehicles across the whole video
    #[serde(default)]
    pub total_vehicles: u64,
    /// Detection instances per type; one vehicle is counted once per frame seen
    #[serde(default)]
    pub vehicles_by_type: BTreeMap<String, u64>,
    /// Distinct vehicles per type
    #[serde(default)]
    pub vehicles_by_type_unique: BTreeMap<String, u64>,
    #[serde(default)]
    pub vehicles_by_region: BTreeMap<String, RegionCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_frames: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ResultSet {
    /// Distinct count for a type, zero when absent.
    pub fn unique(&self, vehicle_type: &str) -> u64 {
        self.vehicles_by_type_unique
            .get(vehicle_type)
            .copied()
            .unwrap_or(0)
    }

    /// Instance count for a type, if reported.
    pub fn instances(&self, vehicle_type: &str) -> Option<u64> {
        self.vehicles_by_type.get(vehicle_type).copied()
    }

    /// Region entries ordered by their numeric index, with the index parsed out.
    ///
    /// Keys that do not follow `region_<n>` sort last, in key order.
    pub fn regions_in_order(&self) -> Vec<(Option<usize>, &str, &RegionCount)> {
        let mut entries: Vec<_> = self
            .vehicles_by_region
            .iter()
            .map(|(key, count)| (region_index(key), key.as_str(), count))
            .collect();
        entries.sort_by_key(|(index, key, _)| (index.is_none(), *index, *key));
        entries
    }
}

/// Parse the index out of a `region_<n>` key.
pub fn region_index(key: &str) -> Option<usize> {
    key.strip_prefix("region_")?.parse().ok()
}
