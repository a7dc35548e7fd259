//! Job controller: submission, polling and results handoff.

mod controller;
mod error;
mod model;
mod task;

pub use controller::{Applied, JobController};
pub use error::JobError;
pub use model::{DetectionParams, Job, JobEvent, JobEventKind, JobPlan, JobStatus, JobTicket};
pub use task::{PollSettings, run_job};
