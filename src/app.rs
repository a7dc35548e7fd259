//! DataTrack application state and update loop.
//!
//! The app owns the region editor, the job controller and the held results.
//! Hosts (the CLI, the browser binding, tests) feed it [`Message`]s and carry
//! out the [`Effect`]s it returns.

use std::sync::Arc;
use std::time::Duration;

use datatrack_canvas::Canvas;
use web_time::Instant;

use crate::autosave::RegionAutosave;
use crate::backend::VideoSource;
use crate::config::AppConfig;
use crate::coords::IntrinsicSize;
use crate::editor::RegionEditor;
use crate::export::{self, ExportArtifact, ExportError, ExportFormat};
use crate::handlers::{self, JobContext};
use crate::job::{DetectionParams, JobController};
use crate::message::{Effect, JobMessage, Message, Notice};
use crate::render::{self, RenderStyle};
use crate::results::{ResultSet, ResultsView, present};
use crate::store::RegionStore;

pub struct DataTrackApp {
    config: AppConfig,
    editor: RegionEditor,
    jobs: JobController,
    params: DetectionParams,
    frame_skip_touched: bool,
    video: Option<Arc<VideoSource>>,
    results: Option<ResultSet>,
    autosave: RegionAutosave,
    style: RenderStyle,
    notice: Option<Notice>,
}

impl DataTrackApp {
    pub fn new(config: AppConfig) -> Self {
        let store = RegionStore::new(config.editor.palette.clone());
        let editor = RegionEditor::new(store, config.editor.min_rect_size);
        Self {
            params: config.detection.params(),
            frame_skip_touched: false,
            style: config.editor.render_style(),
            autosave: RegionAutosave::new(config.backend.autosave_regions).with_debounce_delay(
                Duration::from_millis(config.backend.autosave_debounce_ms),
            ),
            editor,
            jobs: JobController::new(),
            video: None,
            results: None,
            notice: None,
            config,
        }
    }

    /// Effects to run once at startup.
    pub fn init(&self) -> Vec<Effect> {
        vec![Effect::FetchHardwareInfo, Effect::Render]
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn editor(&self) -> &RegionEditor {
        &self.editor
    }

    pub fn jobs(&self) -> &JobController {
        &self.jobs
    }

    pub fn params(&self) -> DetectionParams {
        self.params
    }

    pub fn video(&self) -> Option<&Arc<VideoSource>> {
        self.video.as_ref()
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Labels of the regions the current results were computed for.
    fn result_labels(&self) -> Vec<String> {
        self.jobs
            .job()
            .map(|job| job.region_labels.clone())
            .unwrap_or_default()
    }

    /// Display-ready aggregates for the held results.
    pub fn results_view(&self) -> Option<ResultsView> {
        let results = self.results.as_ref()?;
        Some(present(results, &self.result_labels()))
    }

    /// Draw the region overlay.
    pub fn render<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        render::render(canvas, self.editor.store(), &self.style);
    }

    /// Serialize the held results.
    pub fn export(&self, format: ExportFormat) -> Result<ExportArtifact, ExportError> {
        export::export_results(
            self.results.as_ref(),
            &self.result_labels(),
            self.jobs.job_id(),
            format,
        )
    }

    /// PNG of the committed regions, over `frame` (straight RGBA8) if given.
    pub fn snapshot(&self, frame: Option<&[u8]>) -> Result<ExportArtifact, ExportError> {
        let size = self
            .editor
            .surface()
            .unwrap_or_else(|| IntrinsicSize::new(1, 1));
        export::snapshot_png(self.editor.store(), &self.style, size, frame)
    }

    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        let mut effects = Vec::new();

        match message {
            Message::VideoLoaded { video, size } => {
                log::info!(
                    "🎬 Loaded '{}' ({}x{})",
                    video.file_name,
                    size.width,
                    size.height
                );
                self.video = Some(video);
                self.editor.load_surface(size);
            }
            Message::Editor(msg) => {
                if let Some(notice) = handlers::handle_editor(msg, &mut self.editor) {
                    self.notice = Some(notice);
                }
            }
            Message::Key(key) => {
                if let Some(msg) =
                    handlers::key_to_editor_message(key, &self.config.keybindings, &self.editor)
                {
                    if let Some(notice) = handlers::handle_editor(msg, &mut self.editor) {
                        self.notice = Some(notice);
                    }
                }
            }
            Message::Job(msg) => {
                let outcome = handlers::handle_job(
                    msg,
                    JobContext {
                        jobs: &mut self.jobs,
                        params: &mut self.params,
                        results: &mut self.results,
                        video: self.video.as_ref(),
                        regions: self.editor.store().committed(),
                        use_hardware_defaults: self.config.detection.use_hardware_defaults,
                        frame_skip_touched: &mut self.frame_skip_touched,
                    },
                );
                effects.extend(outcome.effects);
                if let Some(notice) = outcome.notice {
                    self.notice = Some(notice);
                }
            }
            Message::ClearResults => {
                self.results = None;
                if let Some(job) = self.jobs.clear() {
                    if job.status.is_active() {
                        effects.push(Effect::CancelJob(job.ticket));
                    }
                    if let Some(id) = job.id {
                        effects.push(Effect::CleanupJob(id));
                    }
                }
            }
            Message::Tick => {
                if self.autosave.begin(Instant::now()) {
                    effects.push(Effect::SaveRegions(self.editor.store().payload()));
                }
            }
            Message::AutosaveFinished(result) => self.autosave.finish(result),
        }

        self.autosave
            .observe(self.editor.store().revision(), Instant::now());
        if self.editor.take_redraw() {
            effects.push(Effect::Render);
        }
        effects
    }

    /// Convenience for hosts: route a job message.
    pub fn job(&mut self, msg: JobMessage) -> Vec<Effect> {
        self.update(Message::Job(msg))
    }
}

impl Default for DataTrackApp {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
