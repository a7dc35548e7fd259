//! End-to-end tests: the app, the runtime and a scripted backend together.
//!
//! Time is paused, so polling intervals and timeouts run instantly.

mod job_flow_tests;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::DataTrackApp;
use crate::backend::SharedBackend;
use crate::backend::VideoSource;
use crate::backend::fake::FakeBackend;
use crate::config::AppConfig;
use crate::coords::{DisplayRect, IntrinsicSize};
use crate::editor::{DrawTool, PointerInput};
use crate::job::PollSettings;
use crate::message::{EditorMessage, Message};
use crate::results::{RegionCount, ResultSet};
use crate::runtime::Runtime;

const FRAME: IntrinsicSize = IntrinsicSize {
    width: 1920,
    height: 1080,
};

/// The video element shown at half size, offset in the page.
fn layout() -> DisplayRect {
    DisplayRect::new(40.0, 100.0, 960.0, 540.0)
}

/// Pointer at intrinsic coordinates (x, y) under [`layout`].
fn at(x: f32, y: f32) -> PointerInput {
    PointerInput::new(40.0 + x / 2.0, 100.0 + y / 2.0, layout())
}

fn video() -> Arc<VideoSource> {
    Arc::new(VideoSource::new("traffic.mp4", vec![0u8; 64]))
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.backend.autosave_debounce_ms = 0;
    config
}

fn setup(fake: &Arc<FakeBackend>, config: AppConfig) -> (DataTrackApp, Runtime) {
    let backend: SharedBackend = fake.clone();
    let runtime = Runtime::new(backend, PollSettings::from(&config.polling));
    (DataTrackApp::new(config), runtime)
}

fn editor(app: &mut DataTrackApp, msg: EditorMessage) {
    app.update(Message::Editor(msg));
}

fn load_video(app: &mut DataTrackApp) {
    app.update(Message::VideoLoaded {
        video: video(),
        size: FRAME,
    });
}

/// Triangle at (100,100) (300,100) (200,250), named `label`.
fn draw_triangle(app: &mut DataTrackApp, label: &str) {
    editor(app, EditorMessage::ToolSelected(DrawTool::Polygon));
    editor(app, EditorMessage::StartDrawing);
    for (x, y) in [(100.0, 100.0), (300.0, 100.0), (200.0, 250.0)] {
        editor(app, EditorMessage::PointerDown(at(x, y)));
        editor(app, EditorMessage::PointerUp(at(x, y)));
    }
    editor(app, EditorMessage::ClosePolygon(Some(label.to_string())));
}

/// Rectangle from (500,500) to (700,650), named `label`.
fn draw_rectangle(app: &mut DataTrackApp, label: &str) {
    editor(app, EditorMessage::ToolSelected(DrawTool::Rectangle));
    editor(app, EditorMessage::StartDrawing);
    editor(app, EditorMessage::PointerDown(at(500.0, 500.0)));
    editor(app, EditorMessage::PointerMoved(at(600.0, 600.0)));
    editor(app, EditorMessage::PointerUp(at(700.0, 650.0)));
    editor(app, EditorMessage::ConfirmLabel(label.to_string()));
}

fn sample_results() -> ResultSet {
    ResultSet {
        total_vehicles: 50,
        vehicles_by_type: BTreeMap::from([("car".to_string(), 300), ("motorcycle".to_string(), 100)]),
        vehicles_by_type_unique: BTreeMap::from([
            ("car".to_string(), 30),
            ("motorcycle".to_string(), 20),
        ]),
        vehicles_by_region: BTreeMap::from([
            (
                "region_0".to_string(),
                RegionCount {
                    count: 220,
                    unique_count: Some(25),
                    types: BTreeMap::from([("car".to_string(), 150), ("motorcycle".to_string(), 70)]),
                },
            ),
            (
                "region_1".to_string(),
                RegionCount {
                    count: 40,
                    unique_count: None,
                    types: BTreeMap::from([("car".to_string(), 40)]),
                },
            ),
        ]),
        total_frames: Some(300),
        fps: Some(30.0),
        width: Some(1920),
        height: Some(1080),
    }
}
