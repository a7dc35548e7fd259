//! Browser binding.
//!
//! The page owns the `<video>` element and the file picker; it forwards
//! pointer and key events here and draws nothing itself. The overlay is
//! rendered into a `<canvas>` stacked on the video.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::DataTrackApp;
use crate::backend::{HttpBackend, SharedBackend, VideoSource};
use crate::config::AppConfig;
use crate::coords::{DisplayRect, IntrinsicSize};
use crate::editor::{DrawTool, PointerInput};
use crate::export::ExportFormat;
use crate::job::PollSettings;
use crate::keybindings::Key;
use crate::message::{EditorMessage, JobMessage, Message};
use crate::runtime::Runtime;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let level = AppConfig::load_from_local_storage()
        .map(|c| c.preferences.log_level.to_level_filter())
        .unwrap_or(log::LevelFilter::Info);
    if let Some(level) = level.to_level() {
        let _ = console_log::init_with_level(level);
    }
    log::info!("🚀 DataTrack WASM starting...");
}

struct Inner {
    app: RefCell<DataTrackApp>,
    runtime: RefCell<Runtime>,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl Inner {
    fn dispatch(&self, message: Message) {
        let effects = self.app.borrow_mut().update(message);
        let redraw = self.runtime.borrow_mut().execute(effects);
        if redraw {
            self.redraw();
        }
    }

    fn redraw(&self) {
        let mut context = self.context.clone();
        self.app.borrow().render(&mut context);
    }

    /// Where the canvas is laid out right now.
    fn layout(&self) -> DisplayRect {
        let rect = self.canvas.get_bounding_client_rect();
        DisplayRect::new(
            rect.left() as f32,
            rect.top() as f32,
            rect.width() as f32,
            rect.height() as f32,
        )
    }

    fn pointer(&self, client_x: f32, client_y: f32) -> PointerInput {
        PointerInput::new(client_x, client_y, self.layout())
    }
}

/// Handle held by the page.
#[wasm_bindgen]
pub struct WebClient {
    inner: Rc<Inner>,
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
impl WebClient {
    /// Attach to the overlay canvas with the given element id.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebClient, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| js_error("No document available"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| js_error(format!("No element with id '{}'", canvas_id)))?
            .dyn_into()
            .map_err(|_| js_error(format!("'{}' is not a canvas", canvas_id)))?;
        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| js_error("2D context unavailable"))?
            .dyn_into()
            .map_err(|_| js_error("Unexpected context type"))?;

        let config = AppConfig::load_from_local_storage().unwrap_or_default();
        let backend: SharedBackend = Rc::new(HttpBackend::from_config(&config.backend).map_err(js_error)?);
        let mut runtime = Runtime::new(backend, PollSettings::from(&config.polling));
        let inbox = runtime.take_inbox();
        let app = DataTrackApp::new(config);
        let init = app.init();

        let inner = Rc::new(Inner {
            app: RefCell::new(app),
            runtime: RefCell::new(runtime),
            canvas,
            context,
        });

        if let Some(mut inbox) = inbox {
            let pump = Rc::clone(&inner);
            wasm_bindgen_futures::spawn_local(async move {
                while let Some(message) = inbox.recv().await {
                    pump.runtime.borrow_mut().track(&message);
                    pump.dispatch(message);
                }
            });
        }

        if inner.runtime.borrow_mut().execute(init) {
            inner.redraw();
        }
        Ok(WebClient { inner })
    }

    /// The page picked a video and learned its frame size from the element.
    pub fn load_video(&self, file_name: String, mime: String, bytes: Vec<u8>, width: u32, height: u32) {
        let mut video = VideoSource::new(file_name, bytes);
        if !mime.is_empty() {
            video = video.with_content_type(mime);
        }
        self.inner.canvas.set_width(width);
        self.inner.canvas.set_height(height);
        self.inner.dispatch(Message::VideoLoaded {
            video: Arc::new(video),
            size: IntrinsicSize::new(width, height),
        });
    }

    pub fn select_tool(&self, tool: &str) {
        let tool = match tool {
            "rectangle" => DrawTool::Rectangle,
            _ => DrawTool::Polygon,
        };
        self.inner.dispatch(Message::Editor(EditorMessage::ToolSelected(tool)));
    }

    pub fn start_drawing(&self) {
        self.inner.dispatch(Message::Editor(EditorMessage::StartDrawing));
    }

    pub fn pointer_down(&self, client_x: f32, client_y: f32) {
        let input = self.inner.pointer(client_x, client_y);
        self.inner.dispatch(Message::Editor(EditorMessage::PointerDown(input)));
    }

    pub fn pointer_move(&self, client_x: f32, client_y: f32) {
        let input = self.inner.pointer(client_x, client_y);
        self.inner.dispatch(Message::Editor(EditorMessage::PointerMoved(input)));
    }

    pub fn pointer_up(&self, client_x: f32, client_y: f32) {
        let input = self.inner.pointer(client_x, client_y);
        self.inner.dispatch(Message::Editor(EditorMessage::PointerUp(input)));
    }

    /// Secondary click: close the polygon.
    pub fn close_polygon(&self, label: Option<String>) {
        self.inner.dispatch(Message::Editor(EditorMessage::ClosePolygon(label)));
    }

    pub fn confirm_label(&self, name: String) {
        self.inner.dispatch(Message::Editor(EditorMessage::ConfirmLabel(name)));
    }

    pub fn cancel_label(&self) {
        self.inner.dispatch(Message::Editor(EditorMessage::CancelLabel));
    }

    pub fn remove_region(&self, id: u32) {
        self.inner.dispatch(Message::Editor(EditorMessage::RemoveRegion(id)));
    }

    pub fn request_clear(&self) {
        self.inner.dispatch(Message::Editor(EditorMessage::RequestClear));
    }

    pub fn confirm_clear(&self) {
        self.inner.dispatch(Message::Editor(EditorMessage::ConfirmClear));
    }

    pub fn dismiss_clear(&self) {
        self.inner.dispatch(Message::Editor(EditorMessage::DismissClear));
    }

    /// `KeyboardEvent.key`. Returns whether the key was recognized.
    pub fn key(&self, key: &str) -> bool {
        match key.parse::<Key>() {
            Ok(key) => {
                self.inner.dispatch(Message::Key(key));
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_confidence(&self, value: f32) {
        self.inner.dispatch(Message::Job(JobMessage::ConfidenceChanged(value)));
    }

    pub fn set_frame_skip(&self, value: u32) {
        self.inner.dispatch(Message::Job(JobMessage::FrameSkipChanged(value)));
    }

    pub fn submit(&self) {
        self.inner.dispatch(Message::Job(JobMessage::Submit));
    }

    pub fn resubmit(&self) {
        self.inner.dispatch(Message::Job(JobMessage::Resubmit));
    }

    pub fn abandon(&self) {
        self.inner.dispatch(Message::Job(JobMessage::Abandon));
    }

    pub fn clear_results(&self) {
        self.inner.dispatch(Message::ClearResults);
    }

    /// Call periodically; drives region autosave.
    pub fn tick(&self) {
        self.inner.dispatch(Message::Tick);
    }

    pub fn redraw(&self) {
        self.inner.redraw();
    }

    /// `idle`, `uploading`, `processing`, `completed` or `error`.
    pub fn status(&self) -> String {
        let status = self.inner.app.borrow().jobs().status();
        serde_json::to_value(status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn progress(&self) -> Option<f32> {
        self.inner
            .app
            .borrow()
            .jobs()
            .job()
            .and_then(|job| job.progress())
    }

    /// Next message for the status line, if any.
    pub fn take_notice(&self) -> Option<String> {
        self.inner
            .app
            .borrow_mut()
            .take_notice()
            .map(|n| n.text().to_string())
    }

    /// Region labels in submission order.
    pub fn region_labels(&self) -> Vec<String> {
        self.inner.app.borrow().editor().store().labels()
    }

    /// Export held results as `json` or `csv`.
    pub fn export(&self, format: &str) -> Result<Vec<u8>, JsValue> {
        let format: ExportFormat = format.parse().map_err(js_error)?;
        let artifact = self.inner.app.borrow().export(format).map_err(js_error)?;
        Ok(artifact.bytes)
    }

    /// Overlay PNG without the video frame.
    pub fn snapshot(&self) -> Result<Vec<u8>, JsValue> {
        let artifact = self.inner.app.borrow().snapshot(None).map_err(js_error)?;
        Ok(artifact.bytes)
    }

    pub fn save_config(&self) -> Result<(), JsValue> {
        self.inner
            .app
            .borrow()
            .config()
            .save_to_local_storage()
            .map_err(js_error)
    }
}
