//! Scripted in-memory backend for tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::model::RegionPayload;
use crate::results::ResultSet;

use super::{
    Backend, BackendError, HardwareInfo, JobId, JobSummary, ProcessRequest, StatusResponse,
    UploadedVideo, VideoInfo, VideoSource,
};

#[derive(Default)]
struct FakeState {
    /// One status script per job, consumed in submission order
    scripts: VecDeque<Vec<StatusResponse>>,
    statuses: HashMap<JobId, VecDeque<StatusResponse>>,
    last_status: HashMap<JobId, StatusResponse>,
    next_job: u32,
    calls: Vec<String>,
    process_requests: Vec<ProcessRequest>,
    saved_regions: Vec<Vec<RegionPayload>>,
}

/// Backend that replays scripted statuses and records every call.
///
/// Job ids are `job-1`, `job-2`, ... in submission order. When a job's script
/// runs out, its last status repeats.
#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
    results: ResultSet,
    hardware: HardwareInfo,
    delay: Duration,
    upload_error: Option<String>,
    save_error: Option<String>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue the statuses the next submitted job reports.
    pub(crate) fn with_statuses(self, statuses: Vec<StatusResponse>) -> Self {
        self.state.lock().unwrap().scripts.push_back(statuses);
        self
    }

    pub(crate) fn with_results(mut self, results: ResultSet) -> Self {
        self.results = results;
        self
    }

    pub(crate) fn with_hardware(mut self, hardware: HardwareInfo) -> Self {
        self.hardware = hardware;
        self
    }

    /// Latency added to every call.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn failing_upload(mut self, message: &str) -> Self {
        self.upload_error = Some(message.to_string());
        self
    }

    pub(crate) fn failing_save(mut self, message: &str) -> Self {
        self.save_error = Some(message.to_string());
        self
    }

    /// Calls in order, as `name` or `name:argument`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls whose name is `name`.
    pub(crate) fn call_count(&self, name: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(name))
            .count()
    }

    pub(crate) fn process_requests(&self) -> Vec<ProcessRequest> {
        self.state.lock().unwrap().process_requests.clone()
    }

    pub(crate) fn saved_regions(&self) -> Vec<Vec<RegionPayload>> {
        self.state.lock().unwrap().saved_regions.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    async fn latency(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Backend for FakeBackend {
    async fn upload(&self, video: &VideoSource) -> Result<UploadedVideo, BackendError> {
        self.record(format!("upload:{}", video.file_name));
        self.latency().await;
        if let Some(message) = &self.upload_error {
            return Err(BackendError::Rejected(message.clone()));
        }
        Ok(UploadedVideo {
            filename: format!("stored_{}", video.file_name),
            info: Some(VideoInfo {
                total_frames: 300,
                fps: 30.0,
                width: 1920,
                height: 1080,
                duration: 10.0,
            }),
        })
    }

    async fn process(&self, request: &ProcessRequest) -> Result<JobId, BackendError> {
        self.record(format!("process:{}", request.filename));
        self.latency().await;
        let mut state = self.state.lock().unwrap();
        state.next_job += 1;
        let id = JobId::new(format!("job-{}", state.next_job));
        let script = state.scripts.pop_front().unwrap_or_default();
        state.statuses.insert(id.clone(), script.into());
        state.process_requests.push(request.clone());
        Ok(id)
    }

    async fn status(&self, job: &JobId) -> Result<StatusResponse, BackendError> {
        self.record(format!("status:{}", job));
        self.latency().await;
        let mut state = self.state.lock().unwrap();
        let next = state.statuses.get_mut(job).and_then(VecDeque::pop_front);
        let status = match next {
            Some(status) => status,
            None => state
                .last_status
                .get(job)
                .cloned()
                .unwrap_or_else(|| StatusResponse::processing(0.0)),
        };
        state.last_status.insert(job.clone(), status.clone());
        Ok(status)
    }

    async fn results(&self, job: &JobId) -> Result<ResultSet, BackendError> {
        self.record(format!("results:{}", job));
        self.latency().await;
        Ok(self.results.clone())
    }

    async fn export_csv(&self, job: &JobId) -> Result<Vec<u8>, BackendError> {
        self.record(format!("export_csv:{}", job));
        Ok(b"Summary\n".to_vec())
    }

    async fn hardware_info(&self) -> Result<HardwareInfo, BackendError> {
        self.record("hardware_info".to_string());
        Ok(self.hardware.clone())
    }

    async fn save_regions(&self, regions: &[RegionPayload]) -> Result<(), BackendError> {
        self.record(format!("save_regions:{}", regions.len()));
        self.latency().await;
        if let Some(message) = &self.save_error {
            return Err(BackendError::Rejected(message.clone()));
        }
        self.state.lock().unwrap().saved_regions.push(regions.to_vec());
        Ok(())
    }

    async fn jobs(&self) -> Result<BTreeMap<JobId, JobSummary>, BackendError> {
        self.record("jobs".to_string());
        let state = self.state.lock().unwrap();
        Ok(state
            .last_status
            .iter()
            .map(|(id, status)| {
                let summary = JobSummary {
                    status: status.status,
                    progress: status.progress,
                    created_at: None,
                };
                (id.clone(), summary)
            })
            .collect())
    }

    async fn cleanup(&self, job: &JobId) -> Result<(), BackendError> {
        self.record(format!("cleanup:{}", job));
        Ok(())
    }
}
