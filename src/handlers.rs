//! Message handlers for DataTrack.
//!
//! Each handler processes one category of messages, keeping
//! `DataTrackApp::update` small.

use std::sync::Arc;

use crate::backend::VideoSource;
use crate::editor::{EditorError, EditorState, RegionEditor};
use crate::job::{Applied, DetectionParams, JobController, JobError};
use crate::keybindings::{EditorAction, Key, KeyBindings};
use crate::message::{Effect, EditorMessage, JobMessage, Notice};
use crate::model::Region;
use crate::results::ResultSet;

fn editor_notice(result: Result<(), EditorError>) -> Option<Notice> {
    match result {
        Ok(()) => None,
        // Layout not settled yet; the event is dropped
        Err(EditorError::LayoutUnavailable) => {
            log::debug!("Pointer event ignored: surface has no layout");
            None
        }
        Err(e) => Some(Notice::error(e.to_string())),
    }
}

/// Handle region editor messages. Rejected input comes back as a notice.
pub fn handle_editor(msg: EditorMessage, editor: &mut RegionEditor) -> Option<Notice> {
    let result = match msg {
        EditorMessage::ToolSelected(tool) => {
            editor.set_tool(tool);
            Ok(())
        }
        EditorMessage::StartDrawing => editor.start_drawing(),
        EditorMessage::PointerDown(input) => editor.primary_press(&input),
        EditorMessage::PointerMoved(input) => {
            editor.pointer_move(&input);
            Ok(())
        }
        EditorMessage::PointerUp(input) => editor.primary_release(&input),
        EditorMessage::ClosePolygon(label) => editor.close_polygon(label).map(|_| ()),
        EditorMessage::ConfirmLabel(name) => editor.confirm_label(&name).map(|_| ()),
        EditorMessage::CancelLabel => {
            editor.cancel_label();
            Ok(())
        }
        EditorMessage::CancelDrawing => {
            editor.cancel_drawing();
            Ok(())
        }
        EditorMessage::UndoVertex => {
            editor.undo_last_vertex();
            Ok(())
        }
        EditorMessage::RemoveRegion(id) => {
            if let Some(region) = editor.remove_region(id) {
                log::info!("🗑️ Removed '{}'", region.label);
            }
            Ok(())
        }
        EditorMessage::RequestClear => {
            if editor.request_clear() {
                return Some(Notice::info("Clear all regions? Confirm to continue."));
            }
            Ok(())
        }
        EditorMessage::ConfirmClear => {
            editor.confirm_clear();
            Ok(())
        }
        EditorMessage::DismissClear => {
            editor.dismiss_clear();
            Ok(())
        }
        EditorMessage::LoadRegions(regions) => editor.replay(&regions).map(|count| {
            log::info!("📂 Loaded {} saved regions", count);
        }),
    };
    editor_notice(result)
}

/// Translate a bound key into an editor message.
pub fn key_to_editor_message(
    key: Key,
    bindings: &KeyBindings,
    editor: &RegionEditor,
) -> Option<EditorMessage> {
    let action = bindings.action_for_key(key)?;
    let msg = match action {
        EditorAction::StartDrawing => EditorMessage::StartDrawing,
        EditorAction::ClosePolygon => EditorMessage::ClosePolygon(None),
        EditorAction::Cancel => {
            if editor.clear_pending() {
                EditorMessage::DismissClear
            } else if editor.state() == EditorState::AwaitingLabel {
                EditorMessage::CancelLabel
            } else {
                EditorMessage::CancelDrawing
            }
        }
        EditorAction::UndoVertex => EditorMessage::UndoVertex,
        EditorAction::SelectTool(tool) => EditorMessage::ToolSelected(tool),
    };
    Some(msg)
}

/// What the job handler needs to see and touch.
pub struct JobContext<'a> {
    pub jobs: &'a mut JobController,
    pub params: &'a mut DetectionParams,
    pub results: &'a mut Option<ResultSet>,
    pub video: Option<&'a Arc<VideoSource>>,
    pub regions: &'a [Region],
    pub use_hardware_defaults: bool,
    /// Set once the user picks a frame skip; hardware seeding then leaves it alone.
    pub frame_skip_touched: &'a mut bool,
}

/// Effects and feedback produced by a job message.
#[derive(Debug, Default)]
pub struct JobMessageOutcome {
    pub effects: Vec<Effect>,
    pub notice: Option<Notice>,
}

/// Handle job messages.
pub fn handle_job(msg: JobMessage, ctx: JobContext<'_>) -> JobMessageOutcome {
    let mut outcome = JobMessageOutcome::default();
    match msg {
        JobMessage::ConfidenceChanged(value) => {
            let candidate = DetectionParams {
                conf_threshold: value,
                ..*ctx.params
            };
            match candidate.validate() {
                Ok(()) => *ctx.params = candidate,
                Err(e) => outcome.notice = Some(Notice::error(e.to_string())),
            }
        }
        JobMessage::FrameSkipChanged(frame_skip) => {
            ctx.params.frame_skip = frame_skip.max(1);
            *ctx.frame_skip_touched = true;
        }
        JobMessage::Submit => match ctx.jobs.submit(ctx.video, ctx.regions, *ctx.params) {
            Ok(plan) => {
                *ctx.results = None;
                outcome.effects.push(Effect::StartJob(plan));
            }
            Err(e) => outcome.notice = Some(submit_notice(e)),
        },
        JobMessage::Resubmit => match ctx.jobs.resubmit(ctx.video, ctx.regions, *ctx.params) {
            Ok((abandoned, plan)) => {
                *ctx.results = None;
                if let Some(ticket) = abandoned {
                    outcome.effects.push(Effect::CancelJob(ticket));
                }
                outcome.effects.push(Effect::StartJob(plan));
            }
            Err(e) => outcome.notice = Some(submit_notice(e)),
        },
        JobMessage::Abandon => {
            if let Some(ticket) = ctx.jobs.abandon() {
                outcome.effects.push(Effect::CancelJob(ticket));
                outcome.notice = Some(Notice::info("Processing abandoned"));
            }
        }
        JobMessage::Event(event) => match ctx.jobs.apply(event) {
            Applied::Ignored | Applied::Updated => {}
            Applied::Completed(results) => {
                outcome.notice = Some(Notice::info(format!(
                    "Processing finished: {} vehicles",
                    results.total_vehicles
                )));
                *ctx.results = Some(results);
            }
            Applied::Failed(e) => outcome.notice = Some(Notice::error(e.to_string())),
        },
        JobMessage::HardwareInfo(info) => {
            log::info!(
                "🖥️ Backend hardware: {} ({} profile, {} cores)",
                info.device,
                info.profile,
                info.cpu_cores
            );
            if !ctx.use_hardware_defaults {
                return outcome;
            }
            if *ctx.frame_skip_touched {
                log::debug!("Keeping the chosen frame skip of {}", ctx.params.frame_skip);
            } else {
                *ctx.params = ctx.params.seeded_from(&info);
            }
        }
    }
    outcome
}

fn submit_notice(e: JobError) -> Notice {
    log::warn!("Submission rejected: {}", e);
    Notice::error(e.to_string())
}
