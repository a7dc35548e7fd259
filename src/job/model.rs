//! Job state and the messages that drive it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::backend::{HardwareInfo, JobId, ProcessRequest, StatusResponse, VideoInfo, VideoSource};
use crate::constants::detection::{DEFAULT_CONF_THRESHOLD, DEFAULT_FRAME_SKIP};
use crate::results::ResultSet;

use super::JobError;

/// Job lifecycle. Transitions only move forward:
/// `Idle -> Uploading -> Processing -> Completed | Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Uploading,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Uploading | JobStatus::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// Identifies one submission. A fresh ticket invalidates every older one,
/// including submissions that never got a job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobTicket(pub(crate) u64);

impl std::fmt::Display for JobTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Detection parameters sent with each job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Minimum detector confidence, [0, 1]
    pub conf_threshold: f32,
    /// Process every Nth frame
    pub frame_skip: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            conf_threshold: DEFAULT_CONF_THRESHOLD,
            frame_skip: DEFAULT_FRAME_SKIP,
        }
    }
}

impl DetectionParams {
    pub fn validate(&self) -> Result<(), JobError> {
        if !(0.0..=1.0).contains(&self.conf_threshold) {
            return Err(JobError::InvalidConfidence(self.conf_threshold));
        }
        if self.frame_skip == 0 {
            return Err(JobError::InvalidFrameSkip);
        }
        Ok(())
    }

    /// Adopt the backend's recommended frame skip, never below 1.
    pub fn seeded_from(mut self, hardware: &HardwareInfo) -> Self {
        if let Some(frame_skip) = hardware.frame_skip {
            self.frame_skip = frame_skip.max(1);
        }
        self
    }
}

/// Everything a background task needs to run one submission.
#[derive(Debug, Clone)]
pub struct JobPlan {
    pub ticket: JobTicket,
    pub video: std::sync::Arc<VideoSource>,
    /// Filled in after upload; `filename` is empty until then.
    pub request: ProcessRequest,
}

/// What the background task observed, tagged with the submission it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct JobEvent {
    pub ticket: JobTicket,
    pub kind: JobEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobEventKind {
    Uploaded {
        filename: String,
        info: Option<VideoInfo>,
    },
    Submitted(JobId),
    Status {
        job_id: JobId,
        status: StatusResponse,
    },
    Results {
        job_id: JobId,
        results: ResultSet,
    },
    Failed {
        job_id: Option<JobId>,
        error: JobError,
    },
    TimedOut {
        job_id: JobId,
        elapsed: Duration,
    },
}

impl JobEvent {
    pub fn new(ticket: JobTicket, kind: JobEventKind) -> Self {
        Self { ticket, kind }
    }

    /// Job id the event refers to, if it carries one.
    pub fn job_id(&self) -> Option<&JobId> {
        match &self.kind {
            JobEventKind::Uploaded { .. } => None,
            JobEventKind::Submitted(id) => Some(id),
            JobEventKind::Status { job_id, .. }
            | JobEventKind::Results { job_id, .. }
            | JobEventKind::TimedOut { job_id, .. } => Some(job_id),
            JobEventKind::Failed { job_id, .. } => job_id.as_ref(),
        }
    }
}

/// The live job. Only [`super::JobController`] mutates it.
#[derive(Debug, Clone)]
pub struct Job {
    pub ticket: JobTicket,
    pub id: Option<JobId>,
    pub status: JobStatus,
    pub(crate) progress: Option<f32>,
    pub error: Option<JobError>,
    pub filename: Option<String>,
    pub video_info: Option<VideoInfo>,
    pub params: DetectionParams,
    /// Labels of the regions sent, in `region_<index>` order
    pub region_labels: Vec<String>,
    pub started_at: Instant,
}

impl Job {
    /// Percent to display; `None` while uploading or after an error.
    pub fn progress(&self) -> Option<f32> {
        match self.status {
            JobStatus::Processing | JobStatus::Completed => self.progress,
            _ => None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
