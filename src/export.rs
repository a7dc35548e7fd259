//! Export of held results and region snapshots.

use datatrack_canvas::{CanvasError, PixmapCanvas};
use serde::{Deserialize, Serialize};

use crate::backend::JobId;
use crate::coords::IntrinsicSize;
use crate::render::{RenderStyle, render};
use crate::results::{ResultSet, present};
use crate::store::RegionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("Unknown export format '{}', expected json or csv", other)),
        }
    }
}

/// A file ready to be written or offered as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No results to export")]
    NoResults,
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("Snapshot failed: {0}")]
    Canvas(#[from] CanvasError),
}

/// `results_<job_id>.<ext>`, or `results.<ext>` without a job id.
pub fn file_name(job_id: Option<&JobId>, extension: &str) -> String {
    match job_id {
        Some(id) => format!("results_{}.{}", id, extension),
        None => format!("results.{}", extension),
    }
}

/// Serialize results held by the client.
pub fn export_results(
    results: Option<&ResultSet>,
    region_labels: &[String],
    job_id: Option<&JobId>,
    format: ExportFormat,
) -> Result<ExportArtifact, ExportError> {
    let results = results.ok_or(ExportError::NoResults)?;
    let bytes = match format {
        ExportFormat::Json => serde_json::to_vec_pretty(results)?,
        ExportFormat::Csv => results_csv(results, region_labels)?,
    };
    log::info!("📄 Exported {} bytes as {}", bytes.len(), format.extension());
    Ok(ExportArtifact {
        file_name: file_name(job_id, format.extension()),
        mime: format.mime(),
        bytes,
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn results_csv(results: &ResultSet, region_labels: &[String]) -> Result<Vec<u8>, csv::Error> {
    let view = present(results, region_labels);
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    wtr.write_record(["DataTrack - Vehicle count results"])?;

    wtr.write_record(["Summary"])?;
    wtr.write_record(["Unique vehicles".to_string(), view.total_vehicles.to_string()])?;
    if let Some(frames) = view.total_frames {
        wtr.write_record(["Frames".to_string(), frames.to_string()])?;
    }
    if let Some(fps) = view.fps {
        wtr.write_record(["FPS".to_string(), format!("{:.2}", fps)])?;
    }
    wtr.write_record(["Cars".to_string(), view.cars.to_string()])?;
    wtr.write_record(["Motorcycles".to_string(), view.motorcycles.to_string()])?;
    wtr.write_record(["Other".to_string(), view.other.to_string()])?;

    wtr.write_record(["Per type"])?;
    wtr.write_record(["Type", "Unique", "Detections", "Avg detections per vehicle"])?;
    for row in &view.types {
        wtr.write_record([
            capitalize(&row.vehicle_type),
            row.unique.to_string(),
            row.instances.map(|n| n.to_string()).unwrap_or_default(),
            row.avg_detections_per_vehicle.to_string(),
        ])?;
    }

    wtr.write_record(["Note"])?;
    wtr.write_record(["Unique = distinct tracked vehicles"])?;
    wtr.write_record(["Detections = frames a vehicle was seen in; one vehicle counts many times"])?;

    wtr.write_record(["Per region"])?;
    wtr.write_record(["Region", "Unique", "Detections", "Types"])?;
    for row in &view.regions {
        let types = row
            .types
            .iter()
            .map(|(t, c)| format!("{}: {}", t, c))
            .collect::<Vec<_>>()
            .join(", ");
        wtr.write_record([
            row.label.clone(),
            row.unique_count.map(|n| n.to_string()).unwrap_or_default(),
            row.count.to_string(),
            types,
        ])?;
    }

    wtr.into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Render the committed regions to a PNG, optionally over a video frame
/// given as straight RGBA8.
pub fn snapshot_png(
    store: &RegionStore,
    style: &RenderStyle,
    size: IntrinsicSize,
    frame: Option<&[u8]>,
) -> Result<ExportArtifact, ExportError> {
    let mut canvas = match frame {
        Some(rgba) => PixmapCanvas::with_background(size.width, size.height, rgba)?,
        None => PixmapCanvas::new(size.width, size.height)?,
    };
    render(&mut canvas, store, style);
    Ok(ExportArtifact {
        file_name: "regions.png".to_string(),
        mime: "image/png",
        bytes: canvas.encode_png()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::RegionCount;

    fn results() -> ResultSet {
        let mut r = ResultSet {
            total_vehicles: 50,
            total_frames: Some(900),
            ..Default::default()
        };
        r.vehicles_by_type_unique.insert("car".into(), 30);
        r.vehicles_by_type.insert("car".into(), 300);
        r.vehicles_by_region.insert(
            "region_0".into(),
            RegionCount {
                count: 12,
                unique_count: Some(4),
                types: [("car".to_string(), 12)].into(),
            },
        );
        r
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Some(&JobId::new("abc")), "csv"), "results_abc.csv");
        assert_eq!(file_name(None, "json"), "results.json");
    }

    #[test]
    fn test_nothing_to_export() {
        assert!(matches!(
            export_results(None, &[], None, ExportFormat::Json),
            Err(ExportError::NoResults)
        ));
    }

    #[test]
    fn test_json_export_parses_back() {
        let r = results();
        let artifact = export_results(Some(&r), &[], Some(&JobId::new("j1")), ExportFormat::Json).unwrap();
        assert_eq!(artifact.file_name, "results_j1.json");
        let back: ResultSet = serde_json::from_slice(&artifact.bytes).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_csv_export_sections() {
        let labels = vec!["Entrance".to_string()];
        let artifact = export_results(Some(&results()), &labels, None, ExportFormat::Csv).unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.contains("Unique vehicles,50"));
        assert!(text.contains("Car,30,300,10"));
        assert!(text.contains("Entrance,4,12,car: 12"));
        assert_eq!(artifact.mime, "text/csv");
    }

    #[test]
    fn test_snapshot_is_png() {
        let artifact = snapshot_png(
            &RegionStore::default(),
            &RenderStyle::default(),
            IntrinsicSize::new(16, 16),
            None,
        )
        .unwrap();
        assert_eq!(&artifact.bytes[..4], &[0x89, b'P', b'N', b'G']);
    }
}
