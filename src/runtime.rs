//! Host-side effect executor.
//!
//! Runs the [`Effect`]s returned by [`DataTrackApp::update`] against a
//! backend and feeds the outcomes back as [`Message`]s. Job tasks are
//! spawned with their own cancellation token, keyed by ticket.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_util::sync::CancellationToken;

use crate::app::DataTrackApp;
use crate::backend::{RemoteStatus, SharedBackend};
use crate::job::{JobEventKind, JobPlan, JobTicket, PollSettings, run_job};
use crate::message::{Effect, JobMessage, Message};

pub struct Runtime {
    backend: SharedBackend,
    poll: PollSettings,
    tx: UnboundedSender<Message>,
    rx: Option<UnboundedReceiver<Message>>,
    running: HashMap<JobTicket, CancellationToken>,
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(fut);
}

#[cfg(target_arch = "wasm32")]
fn spawn<F>(fut: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(fut);
}

/// True once the task that produced this event has stopped.
fn ends_task(kind: &JobEventKind) -> bool {
    match kind {
        JobEventKind::Results { .. }
        | JobEventKind::Failed { .. }
        | JobEventKind::TimedOut { .. } => true,
        JobEventKind::Status { status, .. } => {
            matches!(status.status, RemoteStatus::Error | RemoteStatus::Unknown)
        }
        JobEventKind::Uploaded { .. } | JobEventKind::Submitted(_) => false,
    }
}

impl Runtime {
    pub fn new(backend: SharedBackend, poll: PollSettings) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            backend,
            poll,
            tx,
            rx: Some(rx),
            running: HashMap::new(),
        }
    }

    /// Sender for hosts that inject their own messages (ticks, input).
    pub fn sender(&self) -> UnboundedSender<Message> {
        self.tx.clone()
    }

    /// Number of job tasks that have not reported a terminal event.
    pub fn running_jobs(&self) -> usize {
        self.running.len()
    }

    /// Carry out effects. Returns whether a redraw was requested.
    pub fn execute(&mut self, effects: Vec<Effect>) -> bool {
        let mut redraw = false;
        for effect in effects {
            match effect {
                Effect::Render => redraw = true,
                Effect::StartJob(plan) => self.start_job(plan),
                Effect::CancelJob(ticket) => {
                    if let Some(token) = self.running.remove(&ticket) {
                        log::info!("🛑 Cancelling job task {}", ticket);
                        token.cancel();
                    }
                }
                Effect::SaveRegions(regions) => {
                    let backend = self.backend.clone();
                    let tx = self.tx.clone();
                    spawn(async move {
                        let result = backend
                            .save_regions(&regions)
                            .await
                            .map_err(|e| e.user_message());
                        let _ = tx.send(Message::AutosaveFinished(result));
                    });
                }
                Effect::CleanupJob(job_id) => {
                    let backend = self.backend.clone();
                    spawn(async move {
                        match backend.cleanup(&job_id).await {
                            Ok(()) => log::debug!("Cleaned up job {}", job_id),
                            Err(e) => log::warn!("Cleanup of job {} failed: {}", job_id, e),
                        }
                    });
                }
                Effect::FetchHardwareInfo => {
                    let backend = self.backend.clone();
                    let tx = self.tx.clone();
                    spawn(async move {
                        match backend.hardware_info().await {
                            Ok(info) => {
                                let _ = tx.send(Message::Job(JobMessage::HardwareInfo(info)));
                            }
                            Err(e) => log::warn!("Hardware info unavailable: {}", e),
                        }
                    });
                }
            }
        }
        redraw
    }

    fn start_job(&mut self, plan: JobPlan) {
        let ticket = plan.ticket;
        let token = CancellationToken::new();
        self.running.insert(ticket, token.clone());

        let backend = self.backend.clone();
        let poll = self.poll;
        let tx = self.tx.clone();
        log::info!("🚀 Starting job task {}", ticket);
        spawn(async move {
            run_job(backend, plan, poll, token, move |event| {
                let _ = tx.send(Message::Job(JobMessage::Event(event)));
            })
            .await;
        });
    }

    /// Hand the message stream to a host that pumps it itself. Such a host
    /// must pass every message through [`Self::track`].
    pub fn take_inbox(&mut self) -> Option<UnboundedReceiver<Message>> {
        self.rx.take()
    }

    /// Forget job tasks that reported a terminal event.
    pub fn track(&mut self, message: &Message) {
        if let Message::Job(JobMessage::Event(event)) = message {
            if ends_task(&event.kind) {
                self.running.remove(&event.ticket);
            }
        }
    }

    /// Wait for the next message from a background task. `None` once the
    /// inbox has been taken.
    pub async fn next_message(&mut self) -> Option<Message> {
        let message = self.rx.as_mut()?.recv().await?;
        self.track(&message);
        Some(message)
    }

    /// Feed background messages into the app until no job is active.
    pub async fn settle(&mut self, app: &mut DataTrackApp) {
        while app.jobs().is_active() {
            let Some(message) = self.next_message().await else {
                break;
            };
            let effects = app.update(message);
            self.execute(effects);
        }
    }
}
