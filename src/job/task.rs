//! Background task that drives one submission over the network.
//!
//! upload -> process -> poll every interval -> results. Every observation is
//! reported through `sink`; the controller decides what it means. The task
//! stops at the first terminal observation or on cancellation. Polling,
//! including requests still in flight, is abandoned once the elapsed-time
//! bound passes.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::backend::{JobId, RemoteStatus, SharedBackend};
use crate::config::PollingConfig;
use crate::constants::polling::{DEFAULT_MAX_ELAPSED_SECS, INTERVAL_MS};

use super::{JobError, JobEvent, JobEventKind, JobPlan};

#[cfg(not(target_arch = "wasm32"))]
use tokio::time::Instant;

#[cfg(target_arch = "wasm32")]
use self::browser_time::Instant;

/// How often and how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` polls until the backend finishes
    pub max_elapsed: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(INTERVAL_MS),
            max_elapsed: Some(Duration::from_secs(DEFAULT_MAX_ELAPSED_SECS)),
        }
    }
}

impl From<&PollingConfig> for PollSettings {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms.max(1)),
            max_elapsed: config.max_elapsed_secs.map(Duration::from_secs),
        }
    }
}

/// Run `fut` unless the token fires first.
async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

/// Drive one submission to a terminal observation.
pub async fn run_job<F>(
    backend: SharedBackend,
    plan: JobPlan,
    poll: PollSettings,
    cancel: CancellationToken,
    sink: F,
) where
    F: Fn(JobEvent),
{
    let ticket = plan.ticket;
    let emit = |kind: JobEventKind| sink(JobEvent::new(ticket, kind));

    let Some(uploaded) = cancellable(&cancel, backend.upload(&plan.video)).await else {
        return;
    };
    let uploaded = match uploaded {
        Ok(uploaded) => uploaded,
        Err(e) => {
            emit(JobEventKind::Failed {
                job_id: None,
                error: e.into(),
            });
            return;
        }
    };
    emit(JobEventKind::Uploaded {
        filename: uploaded.filename.clone(),
        info: uploaded.info,
    });

    let mut request = plan.request;
    request.filename = uploaded.filename;
    let Some(submitted) = cancellable(&cancel, backend.process(&request)).await else {
        return;
    };
    let job_id = match submitted {
        Ok(job_id) => job_id,
        Err(e) => {
            emit(JobEventKind::Failed {
                job_id: None,
                error: e.into(),
            });
            return;
        }
    };
    emit(JobEventKind::Submitted(job_id.clone()));

    let started = Instant::now();
    let deadline = async {
        let Some(max) = poll.max_elapsed else {
            return std::future::pending::<()>().await;
        };
        if let Err(e) = pause(max).await {
            // The poll loop hits the same timer and reports it
            log::error!("No timer for the polling deadline: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {}
        _ = deadline => {
            let elapsed = started.elapsed();
            log::warn!("⏱️ Giving up on job {} after {:?}", job_id, elapsed);
            emit(JobEventKind::TimedOut {
                job_id: job_id.clone(),
                elapsed,
            });
        }
        _ = poll_to_completion(&backend, &job_id, poll.interval, &emit) => {}
    }
}

/// Poll until the backend reports a terminal status, then fetch the results.
/// In-flight requests are bounded by the caller's deadline.
async fn poll_to_completion<F>(backend: &SharedBackend, job_id: &JobId, interval: Duration, emit: &F)
where
    F: Fn(JobEventKind),
{
    let fail = |error: JobError| {
        emit(JobEventKind::Failed {
            job_id: Some(job_id.clone()),
            error,
        })
    };

    loop {
        let status = match backend.status(job_id).await {
            Ok(status) => status,
            Err(e) => return fail(e.into()),
        };

        let remote = status.status;
        emit(JobEventKind::Status {
            job_id: job_id.clone(),
            status,
        });

        match remote {
            RemoteStatus::Processing => {}
            RemoteStatus::Completed => {
                match backend.results(job_id).await {
                    Ok(results) => emit(JobEventKind::Results {
                        job_id: job_id.clone(),
                        results,
                    }),
                    Err(e) => fail(e.into()),
                }
                return;
            }
            // Terminal; the controller reports it from the status event
            RemoteStatus::Error | RemoteStatus::Unknown => return,
        }

        if let Err(e) = pause(interval).await {
            return fail(e);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
async fn pause(duration: Duration) -> Result<(), JobError> {
    tokio::time::sleep(duration).await;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
use self::browser_time::sleep as pause;

#[cfg(target_arch = "wasm32")]
mod browser_time {
    use std::time::Duration;

    pub use web_time::Instant;

    use crate::job::JobError;

    fn timer_error(e: wasm_bindgen::JsValue) -> JobError {
        let message = format!("{:?}", e);
        log::error!("setTimeout failed: {}", message);
        JobError::TimerUnavailable(message)
    }

    /// Resolve after `duration` using the page's timer.
    pub async fn sleep(duration: Duration) -> Result<(), JobError> {
        let Some(window) = web_sys::window() else {
            log::error!("No window to schedule a timer on");
            return Err(JobError::TimerUnavailable("no window in this context".to_string()));
        };
        let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);

        let mut scheduled = Ok(0);
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
        });
        scheduled.map_err(timer_error)?;

        wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(timer_error)
    }
}
