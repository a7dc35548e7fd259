//! Turns a raw [`ResultSet`] into display-ready aggregates.
//!
//! Pure: no I/O, no clock. Inconsistent backend data is rendered best-effort
//! and flagged, never rejected.

use std::collections::BTreeSet;

use crate::constants::detection::PRIMARY_TYPES;

use super::ResultSet;

/// One row of the per-type table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRow {
    pub vehicle_type: String,
    pub unique: u64,
    /// `None` when the backend did not report instances for this type.
    pub instances: Option<u64>,
    /// `round(instances / max(unique, 1))`
    pub avg_detections_per_vehicle: u64,
}

/// One row of the per-region breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRow {
    /// Backend key, e.g. `region_0`
    pub key: String,
    /// Region label when the key correlates with a committed region
    pub label: String,
    pub count: u64,
    pub unique_count: Option<u64>,
    /// Instances per type, largest first
    pub types: Vec<(String, u64)>,
}

/// Received data that breaks a backend guarantee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayAnomaly {
    UniqueExceedsInstances {
        vehicle_type: String,
        unique: u64,
        instances: u64,
    },
}

impl std::fmt::Display for DisplayAnomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayAnomaly::UniqueExceedsInstances {
                vehicle_type,
                unique,
                instances,
            } => write!(
                f,
                "'{}' reports {} unique vehicles but only {} detections",
                vehicle_type, unique, instances
            ),
        }
    }
}

/// Everything the results panel shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub total_vehicles: u64,
    /// Unique cars
    pub cars: u64,
    /// Unique motorcycles
    pub motorcycles: u64,
    /// Unique vehicles of every non-primary type
    pub other: u64,
    pub types: Vec<TypeRow>,
    pub regions: Vec<RegionRow>,
    pub anomalies: Vec<DisplayAnomaly>,
    pub total_frames: Option<u64>,
    pub fps: Option<f64>,
}

fn avg_detections(instances: u64, unique: u64) -> u64 {
    (instances as f64 / unique.max(1) as f64).round() as u64
}

/// Build the view. `region_labels` are the committed region labels at submit
/// time, in the order their polygons were sent.
pub fn present(results: &ResultSet, region_labels: &[String]) -> ResultsView {
    let type_names: BTreeSet<&str> = results
        .vehicles_by_type_unique
        .keys()
        .chain(results.vehicles_by_type.keys())
        .map(String::as_str)
        .collect();

    let mut types = Vec::with_capacity(type_names.len());
    let mut anomalies = Vec::new();
    for name in type_names {
        let unique = results.unique(name);
        let instances = results.instances(name);

        if let Some(instances) = instances {
            if unique > instances {
                log::warn!(
                    "Inconsistent results for '{}': {} unique > {} detections",
                    name,
                    unique,
                    instances
                );
                anomalies.push(DisplayAnomaly::UniqueExceedsInstances {
                    vehicle_type: name.to_string(),
                    unique,
                    instances,
                });
            }
        }

        types.push(TypeRow {
            vehicle_type: name.to_string(),
            unique,
            instances,
            avg_detections_per_vehicle: avg_detections(instances.unwrap_or(0), unique),
        });
    }

    let other = results
        .vehicles_by_type_unique
        .iter()
        .filter(|(name, _)| !PRIMARY_TYPES.contains(&name.as_str()))
        .map(|(_, &count)| count)
        .fold(0, u64::saturating_add);

    let regions = results
        .regions_in_order()
        .into_iter()
        .map(|(index, key, count)| {
            let label = index
                .and_then(|i| region_labels.get(i))
                .cloned()
                .unwrap_or_else(|| key.to_string());
            let mut types: Vec<(String, u64)> =
                count.types.iter().map(|(t, c)| (t.clone(), *c)).collect();
            types.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            RegionRow {
                key: key.to_string(),
                label,
                count: count.count,
                unique_count: count.unique_count,
                types,
            }
        })
        .collect();

    ResultsView {
        total_vehicles: results.total_vehicles,
        cars: results.unique("car"),
        motorcycles: results.unique("motorcycle"),
        other,
        types,
        regions,
        anomalies,
        total_frames: results.total_frames,
        fps: results.fps,
    }
}
