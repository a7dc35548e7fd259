//! The job state machine.
//!
//! Pure and synchronous: it validates submissions and applies [`JobEvent`]s.
//! Network I/O lives in [`super::task`]. Every event carries the
//! [`JobTicket`] of the submission that produced it, so responses for an
//! abandoned or replaced job are dropped here instead of being applied to
//! unrelated state.

use std::sync::Arc;

use web_time::Instant;

use crate::backend::{JobId, ProcessRequest, RemoteStatus, VideoSource};
use crate::constants::polling::MAX_PROCESSING_PROGRESS;
use crate::model::Region;
use crate::results::ResultSet;

use super::{DetectionParams, Job, JobError, JobEvent, JobEventKind, JobPlan, JobStatus, JobTicket};

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// Stale, out of order, or after the job finished.
    Ignored,
    /// Status or progress changed.
    Updated,
    Completed(ResultSet),
    Failed(JobError),
}

#[derive(Debug, Default)]
pub struct JobController {
    job: Option<Job>,
    next_ticket: u64,
}

impl JobController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn status(&self) -> JobStatus {
        self.job.as_ref().map_or(JobStatus::Idle, |j| j.status)
    }

    /// While true, submission is locked.
    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job.as_ref().and_then(|j| j.id.as_ref())
    }

    /// Ticket of the running submission, if any.
    pub fn active_ticket(&self) -> Option<JobTicket> {
        self.job.as_ref().filter(|j| j.status.is_active()).map(|j| j.ticket)
    }

    fn validate(
        video: Option<&Arc<VideoSource>>,
        regions: &[Region],
        params: &DetectionParams,
    ) -> Result<Arc<VideoSource>, JobError> {
        let video = video.ok_or(JobError::NoVideo)?;
        if !video.is_supported() {
            return Err(JobError::UnsupportedVideo(video.file_name.clone()));
        }
        if regions.is_empty() {
            return Err(JobError::NoRegions);
        }
        params.validate()?;
        Ok(Arc::clone(video))
    }

    /// Start a submission. Everything is checked before anything is sent.
    pub fn submit(
        &mut self,
        video: Option<&Arc<VideoSource>>,
        regions: &[Region],
        params: DetectionParams,
    ) -> Result<JobPlan, JobError> {
        if self.is_active() {
            return Err(JobError::Busy);
        }
        let video = Self::validate(video, regions, &params)?;
        Ok(self.begin(video, regions, params))
    }

    /// Abandon the running job, if any, and submit again. Returns the ticket
    /// whose task must be cancelled alongside the new plan.
    pub fn resubmit(
        &mut self,
        video: Option<&Arc<VideoSource>>,
        regions: &[Region],
        params: DetectionParams,
    ) -> Result<(Option<JobTicket>, JobPlan), JobError> {
        let video = Self::validate(video, regions, &params)?;
        let abandoned = self.abandon();
        Ok((abandoned, self.begin(video, regions, params)))
    }

    fn begin(&mut self, video: Arc<VideoSource>, regions: &[Region], params: DetectionParams) -> JobPlan {
        self.next_ticket += 1;
        let ticket = JobTicket(self.next_ticket);

        self.job = Some(Job {
            ticket,
            id: None,
            status: JobStatus::Uploading,
            progress: None,
            error: None,
            filename: None,
            video_info: None,
            params,
            region_labels: regions.iter().map(|r| r.label.clone()).collect(),
            started_at: Instant::now(),
        });

        log::info!(
            "📤 Submitting '{}' with {} regions ({})",
            video.file_name,
            regions.len(),
            ticket
        );

        JobPlan {
            ticket,
            video,
            request: ProcessRequest {
                filename: String::new(),
                regions: regions
                    .iter()
                    .map(|r| r.vertices.iter().map(|&p| p.into()).collect())
                    .collect(),
                conf_threshold: params.conf_threshold,
                frame_skip: params.frame_skip,
            },
        }
    }

    /// Drop the live job. Returns its ticket if it was still running, so the
    /// caller can stop its task.
    pub fn abandon(&mut self) -> Option<JobTicket> {
        let job = self.job.take()?;
        if job.status.is_active() {
            log::info!("Abandoned job {}", job.ticket);
            Some(job.ticket)
        } else {
            None
        }
    }

    /// Forget the current job entirely, e.g. when results are cleared.
    pub fn clear(&mut self) -> Option<Job> {
        self.job.take()
    }

    /// Apply an event from a background task.
    pub fn apply(&mut self, event: JobEvent) -> Applied {
        let Some(job) = self.job.as_mut() else {
            log::debug!("Ignoring event for {} with no live job", event.ticket);
            return Applied::Ignored;
        };
        if event.ticket != job.ticket {
            log::debug!("Ignoring stale event for {} (live: {})", event.ticket, job.ticket);
            return Applied::Ignored;
        }
        if let (Some(live), Some(incoming)) = (&job.id, event.job_id()) {
            if live != incoming {
                log::debug!("Ignoring event for job {} (live: {})", incoming, live);
                return Applied::Ignored;
            }
        }
        if job.status.is_terminal() {
            return Applied::Ignored;
        }

        match event.kind {
            JobEventKind::Uploaded { filename, info } if job.status == JobStatus::Uploading => {
                log::info!("✅ Uploaded as '{}'", filename);
                job.filename = Some(filename);
                job.video_info = info;
                Applied::Updated
            }
            JobEventKind::Submitted(id) if job.status == JobStatus::Uploading => {
                log::info!("⚙️ Processing job {}", id);
                job.id = Some(id);
                job.status = JobStatus::Processing;
                job.progress = Some(0.0);
                Applied::Updated
            }
            JobEventKind::Status { status, .. } if job.status == JobStatus::Processing => {
                match status.status {
                    RemoteStatus::Processing => {
                        if let Some(p) = status.progress.filter(|p| p.is_finite()) {
                            let clamped = p.clamp(0.0, MAX_PROCESSING_PROGRESS);
                            let previous = job.progress.unwrap_or(0.0);
                            job.progress = Some(previous.max(clamped));
                        }
                        Applied::Updated
                    }
                    // Results follow in a separate event
                    RemoteStatus::Completed => Applied::Updated,
                    RemoteStatus::Error => {
                        let message = status
                            .error
                            .unwrap_or_else(|| "Processing failed".to_string());
                        Self::fail(job, JobError::Backend(message))
                    }
                    RemoteStatus::Unknown => Self::fail(job, JobError::UnexpectedStatus),
                }
            }
            JobEventKind::Results { results, .. } if job.status == JobStatus::Processing => {
                job.status = JobStatus::Completed;
                job.progress = Some(100.0);
                log::info!(
                    "✅ Job {} completed: {} vehicles",
                    job.id.as_ref().map_or("?", |id| id.as_str()),
                    results.total_vehicles
                );
                Applied::Completed(results)
            }
            JobEventKind::Failed { error, .. } => Self::fail(job, error),
            JobEventKind::TimedOut { elapsed, .. } => Self::fail(job, JobError::Timeout(elapsed)),
            _ => {
                log::debug!("Ignoring out-of-order event in state {:?}", job.status);
                Applied::Ignored
            }
        }
    }

    fn fail(job: &mut Job, error: JobError) -> Applied {
        log::error!("❌ Job {} failed: {}", job.ticket, error);
        job.status = JobStatus::Error;
        job.progress = None;
        job.error = Some(error.clone());
        Applied::Failed(error)
    }
}
