//! Detection backend: the contract the job controller consumes, and its
//! HTTP implementation.

mod error;
mod http;
mod types;

#[cfg(test)]
pub(crate) mod fake;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::model::RegionPayload;
use crate::results::ResultSet;

pub use error::BackendError;
pub use http::HttpBackend;
pub use types::{
    HardwareInfo, JobId, JobSummary, ProcessRequest, RemoteStatus, SaveRegionsRequest,
    StatusResponse, UploadedVideo, VideoInfo, VideoSource,
};

/// The backend operations the client relies on. Polling is the only
/// progress channel; nothing is pushed.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Backend {
    /// Store a video; returns the server-side handle.
    async fn upload(&self, video: &VideoSource) -> Result<UploadedVideo, BackendError>;

    /// Start a detection job on an uploaded video.
    async fn process(&self, request: &ProcessRequest) -> Result<JobId, BackendError>;

    async fn status(&self, job: &JobId) -> Result<StatusResponse, BackendError>;

    /// Fetch results of a completed job.
    async fn results(&self, job: &JobId) -> Result<ResultSet, BackendError>;

    /// Server-generated CSV report.
    async fn export_csv(&self, job: &JobId) -> Result<Vec<u8>, BackendError>;

    async fn hardware_info(&self) -> Result<HardwareInfo, BackendError>;

    /// Best-effort persistence of the committed regions.
    async fn save_regions(&self, regions: &[RegionPayload]) -> Result<(), BackendError>;

    async fn jobs(&self) -> Result<BTreeMap<JobId, JobSummary>, BackendError>;

    /// Release server-side files of a job.
    async fn cleanup(&self, job: &JobId) -> Result<(), BackendError>;
}

/// A backend shared between the app and its background tasks.
#[cfg(not(target_arch = "wasm32"))]
pub type SharedBackend = std::sync::Arc<dyn Backend + Send + Sync>;

#[cfg(target_arch = "wasm32")]
pub type SharedBackend = std::rc::Rc<dyn Backend>;
