//! Application message types for DataTrack.
//!
//! All user input and background results reach the app as messages in the
//! Elm architecture style; the app answers with [`Effect`]s for the host.

use std::sync::Arc;

use crate::backend::{HardwareInfo, JobId, VideoSource};
use crate::coords::IntrinsicSize;
use crate::editor::{DrawTool, PointerInput};
use crate::job::{JobEvent, JobPlan, JobTicket};
use crate::keybindings::Key;
use crate::model::{RegionId, RegionPayload};

/// Messages that can be sent to update application state.
#[derive(Debug, Clone)]
pub enum Message {
    /// A video was chosen and its frame size is known
    VideoLoaded {
        video: Arc<VideoSource>,
        size: IntrinsicSize,
    },
    Editor(EditorMessage),
    Job(JobMessage),
    /// Drop held results and the job that produced them
    ClearResults,
    /// Key press outside of text inputs
    Key(Key),
    /// Periodic clock tick; drives autosave
    Tick,
    /// A region autosave call finished
    AutosaveFinished(Result<(), String>),
}

/// Region editor messages.
#[derive(Debug, Clone)]
pub enum EditorMessage {
    ToolSelected(DrawTool),
    StartDrawing,
    PointerDown(PointerInput),
    PointerMoved(PointerInput),
    PointerUp(PointerInput),
    /// Secondary click/context menu: close the polygon, optionally named
    ClosePolygon(Option<String>),
    ConfirmLabel(String),
    CancelLabel,
    CancelDrawing,
    UndoVertex,
    RemoveRegion(RegionId),
    RequestClear,
    ConfirmClear,
    DismissClear,
    /// Re-draw previously saved regions
    LoadRegions(Vec<RegionPayload>),
}

/// Job controller messages.
#[derive(Debug, Clone)]
pub enum JobMessage {
    ConfidenceChanged(f32),
    FrameSkipChanged(u32),
    Submit,
    /// Abandon the running job, if any, and submit again
    Resubmit,
    Abandon,
    /// Reported by a background job task
    Event(JobEvent),
    HardwareInfo(HardwareInfo),
}

/// Work the host must carry out on the app's behalf.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Redraw the region overlay
    Render,
    StartJob(JobPlan),
    CancelJob(JobTicket),
    SaveRegions(Vec<RegionPayload>),
    /// Best-effort release of server-side files
    CleanupJob(JobId),
    FetchHardwareInfo,
}

/// A message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Notice::Info(text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        Notice::Error(text.into())
    }

    pub fn text(&self) -> &str {
        match self {
            Notice::Info(text) | Notice::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}
