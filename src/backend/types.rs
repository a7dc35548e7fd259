//! Wire types for the detection backend.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::VIDEO_EXTENSIONS;
use crate::model::RegionPayload;
use crate::results::ResultSet;

use super::BackendError;

/// Opaque job identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A video file ready to upload.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSource {
    pub file_name: String,
    /// MIME type, when the picker or filesystem supplied one
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl VideoSource {
    /// Build a source, guessing the MIME type from the extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_for_extension(&file_name).map(str::to_string);
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Lowercased extension, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        (!stem.is_empty()).then(|| ext.to_ascii_lowercase())
    }

    /// Only containers the backend accepts, and only `video/*` content.
    pub fn is_supported(&self) -> bool {
        let ext_ok = self
            .extension()
            .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()));
        let type_ok = self
            .content_type
            .as_deref()
            .is_none_or(|ct| ct.starts_with("video/"));
        ext_ok && type_ok && !self.bytes.is_empty()
    }

    /// Read a video from disk.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn read(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

fn mime_for_extension(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "mp4" => Some("video/mp4"),
        "avi" => Some("video/x-msvideo"),
        "mov" => Some("video/quicktime"),
        "mkv" => Some("video/x-matroska"),
        _ => None,
    }
}

/// Metadata the backend extracts from an uploaded video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub total_frames: u64,
    #[serde(default)]
    pub fps: f64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Seconds
    #[serde(default)]
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub success: bool,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Handle to a video stored by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedVideo {
    /// Server-side filename to reference in the process request
    pub filename: String,
    pub info: Option<VideoInfo>,
}

impl UploadResponse {
    pub(crate) fn into_result(self) -> Result<UploadedVideo, BackendError> {
        rejected_unless(self.success, self.error)?;
        let filename = self
            .filename
            .filter(|f| !f.is_empty())
            .ok_or_else(|| BackendError::Malformed("upload response without filename".into()))?;
        Ok(UploadedVideo {
            filename,
            info: self.video_info,
        })
    }
}

/// Body of the process request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub filename: String,
    /// One ordered `[x, y]` list per region; list index becomes `region_<index>`.
    pub regions: Vec<Vec<[f32; 2]>>,
    pub conf_threshold: f32,
    pub frame_skip: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProcessResponse {
    pub success: bool,
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProcessResponse {
    pub(crate) fn into_result(self) -> Result<JobId, BackendError> {
        rejected_unless(self.success, self.error)?;
        self.job_id
            .ok_or_else(|| BackendError::Malformed("process response without job_id".into()))
    }
}

/// Job status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    Processing,
    Completed,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One status poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub status: RemoteStatus,
    /// Percent, 0-100; may be absent
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_true() -> bool {
    true
}

impl StatusResponse {
    pub fn processing(progress: f32) -> Self {
        Self {
            success: true,
            status: RemoteStatus::Processing,
            progress: Some(progress),
            error: None,
        }
    }

    pub fn completed() -> Self {
        Self {
            success: true,
            status: RemoteStatus::Completed,
            progress: Some(100.0),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: true,
            status: RemoteStatus::Error,
            progress: None,
            error: Some(message.into()),
        }
    }

    pub(crate) fn into_result(self) -> Result<Self, BackendError> {
        rejected_unless(self.success, self.error.clone())?;
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultsResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Option<ResultSet>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ResultsResponse {
    pub(crate) fn into_result(self) -> Result<ResultSet, BackendError> {
        rejected_unless(self.success, self.error)?;
        self.results
            .ok_or_else(|| BackendError::Malformed("results response without results".into()))
    }
}

/// Backend hardware profile; used to seed detection defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareInfo {
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub cpu_cores: u32,
    #[serde(default)]
    pub ram_gb: f64,
    #[serde(default)]
    pub vram_gb: f64,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub batch_size: u32,
    /// The backend reports `cpu_cores - 2`, which can go negative
    #[serde(default)]
    pub workers: i32,
    #[serde(default)]
    pub frame_skip: Option<u32>,
}

/// Body of the region autosave call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRegionsRequest {
    pub areas: Vec<RegionPayload>,
}

/// One entry of the backend's job listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    #[serde(default)]
    pub status: RemoteStatus,
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobsResponse {
    pub success: bool,
    #[serde(default)]
    pub jobs: BTreeMap<JobId, JobSummary>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobsResponse {
    pub(crate) fn into_result(self) -> Result<BTreeMap<JobId, JobSummary>, BackendError> {
        rejected_unless(self.success, self.error)?;
        Ok(self.jobs)
    }
}

/// Envelope shared by every backend reply with a body we ignore.
#[derive(Debug, Deserialize)]
pub(crate) struct AckResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl AckResponse {
    pub(crate) fn into_result(self) -> Result<(), BackendError> {
        rejected_unless(self.success, self.error)
    }
}

/// Error payload of a non-2xx reply.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

fn rejected_unless(success: bool, error: Option<String>) -> Result<(), BackendError> {
    if success {
        Ok(())
    } else {
        Err(BackendError::Rejected(
            error.unwrap_or_else(|| "Backend reported failure without details".to_string()),
        ))
    }
}
