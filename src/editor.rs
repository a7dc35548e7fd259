//! Region editor: the drawing state machine and sole writer of the region store.
//!
//! Polygons are built click by click and closed with the secondary action.
//! Rectangles are drawn with a press-drag-release gesture and then named.
//!
//! ```text
//! Idle --start--> Drawing --close(>=3)--> Idle (+region)
//!                 Drawing --close(<3)---> Idle (draft discarded)
//!                 Drawing --release(ok)-> AwaitingLabel --confirm--> Idle (+region)
//!                                         AwaitingLabel --cancel---> Idle
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::editor::{MIN_POLYGON_VERTICES, MIN_RECT_SIZE};
use crate::coords::{DisplayRect, IntrinsicSize, map_pointer};
use crate::model::{BoundingBox, Point, Region, RegionId, RegionKind, RegionPayload};
use crate::store::{Draft, RegionStore};

/// Which shape the next draft produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawTool {
    #[default]
    Polygon,
    Rectangle,
}

impl DrawTool {
    pub fn name(&self) -> &'static str {
        match self {
            DrawTool::Polygon => "Polygon",
            DrawTool::Rectangle => "Rectangle",
        }
    }
}

/// Observable editor state, derived from the store's draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    Drawing,
    AwaitingLabel,
}

/// A pointer event in client coordinates, with the layout it was observed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub client_x: f32,
    pub client_y: f32,
    pub rect: DisplayRect,
}

impl PointerInput {
    pub fn new(client_x: f32, client_y: f32, rect: DisplayRect) -> Self {
        Self {
            client_x,
            client_y,
            rect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditorError {
    #[error("Load a video before drawing regions")]
    NoSurface,
    #[error("The video surface has no usable size yet")]
    LayoutUnavailable,
    #[error("A region needs at least {min} points (got {count})")]
    TooFewVertices { count: usize, min: usize },
    #[error(
        "Rectangle too small ({width:.0}x{height:.0}); both sides must be at least {min:.0}px"
    )]
    RectangleTooSmall { width: f32, height: f32, min: f32 },
    #[error("Region name cannot be empty")]
    EmptyLabel,
    #[error("No rectangle is waiting for a name")]
    NotAwaitingLabel,
    #[error("Name or cancel the pending rectangle first")]
    LabelPending,
}

#[derive(Debug, Clone)]
pub struct RegionEditor {
    store: RegionStore,
    tool: DrawTool,
    surface: Option<IntrinsicSize>,
    min_rect_size: f32,
    clear_pending: bool,
}

impl Default for RegionEditor {
    fn default() -> Self {
        Self::new(RegionStore::default(), MIN_RECT_SIZE)
    }
}

impl RegionEditor {
    pub fn new(store: RegionStore, min_rect_size: f32) -> Self {
        Self {
            store,
            tool: DrawTool::default(),
            surface: None,
            min_rect_size,
            clear_pending: false,
        }
    }

    pub fn store(&self) -> &RegionStore {
        &self.store
    }

    pub fn tool(&self) -> DrawTool {
        self.tool
    }

    pub fn surface(&self) -> Option<IntrinsicSize> {
        self.surface
    }

    pub fn state(&self) -> EditorState {
        match self.store.draft() {
            None => EditorState::Idle,
            Some(Draft::PendingLabel { .. }) => EditorState::AwaitingLabel,
            Some(_) => EditorState::Drawing,
        }
    }

    pub fn clear_pending(&self) -> bool {
        self.clear_pending
    }

    /// Returns whether anything visible changed since the last call.
    pub fn take_redraw(&mut self) -> bool {
        let dirty = self.store.is_dirty();
        self.store.clear_dirty();
        dirty
    }

    /// A video surface is available; drawing is now possible.
    pub fn load_surface(&mut self, size: IntrinsicSize) {
        if self.store.take_draft().is_some() {
            log::debug!("Dropped draft on surface change");
        }
        self.surface = (!size.is_empty()).then_some(size);
        self.store.mark_dirty();
    }

    /// Switch tools. Any draft in progress is dropped.
    pub fn set_tool(&mut self, tool: DrawTool) {
        if self.tool != tool {
            self.store.take_draft();
            self.tool = tool;
            log::debug!("Draw tool: {}", tool.name());
        }
    }

    /// Begin a new draft with the current tool, replacing any draft in progress.
    pub fn start_drawing(&mut self) -> Result<(), EditorError> {
        if self.surface.is_none() {
            return Err(EditorError::NoSurface);
        }
        if self.state() == EditorState::AwaitingLabel {
            return Err(EditorError::LabelPending);
        }

        let draft = match self.tool {
            DrawTool::Polygon => Draft::empty_polygon(),
            DrawTool::Rectangle => Draft::empty_rectangle(),
        };
        self.store.set_draft(draft);
        self.clear_pending = false;
        Ok(())
    }

    fn map(&self, input: &PointerInput) -> Result<Point, EditorError> {
        let surface = self.surface.ok_or(EditorError::NoSurface)?;
        map_pointer(input.client_x, input.client_y, input.rect, surface)
            .ok_or(EditorError::LayoutUnavailable)
    }

    /// Primary button down: adds a polygon vertex or anchors a rectangle drag.
    /// Ignored while idle.
    pub fn primary_press(&mut self, input: &PointerInput) -> Result<(), EditorError> {
        if self.state() != EditorState::Drawing {
            return Ok(());
        }
        let point = self.map(input)?;

        match self.store.draft_mut() {
            Some(Draft::Polygon { vertices, cursor }) => {
                vertices.push(point);
                *cursor = Some(point);
            }
            Some(Draft::Rectangle { anchor, current }) => {
                *anchor = Some(point);
                *current = Some(point);
            }
            _ => {}
        }
        Ok(())
    }

    /// Pointer motion drives the rubber band and the rectangle preview.
    /// Returns whether the preview changed.
    pub fn pointer_move(&mut self, input: &PointerInput) -> bool {
        if self.state() != EditorState::Drawing {
            return false;
        }
        let Ok(point) = self.map(input) else {
            return false;
        };

        match self.store.draft_mut() {
            Some(Draft::Polygon { vertices, cursor }) if !vertices.is_empty() => {
                *cursor = Some(point);
                true
            }
            Some(Draft::Rectangle {
                anchor: Some(_),
                current,
            }) => {
                *current = Some(point);
                true
            }
            _ => false,
        }
    }

    /// Primary button up. Finishes a rectangle drag; too-small gestures are
    /// discarded and the tool stays armed for another attempt.
    pub fn primary_release(&mut self, input: &PointerInput) -> Result<(), EditorError> {
        let Some(Draft::Rectangle {
            anchor: Some(anchor),
            current,
        }) = self.store.draft().cloned()
        else {
            return Ok(());
        };

        let end = match self.map(input) {
            Ok(p) => p,
            Err(_) => current.unwrap_or(anchor),
        };
        let bounds = BoundingBox::from_corners(anchor, end);

        if !bounds.meets_min_size(self.min_rect_size) {
            self.store.set_draft(Draft::empty_rectangle());
            return Err(EditorError::RectangleTooSmall {
                width: bounds.width,
                height: bounds.height,
                min: self.min_rect_size,
            });
        }

        self.store.set_draft(Draft::PendingLabel { bounds });
        Ok(())
    }

    /// Secondary action: close the polygon draft.
    ///
    /// Returns `Ok(None)` when there is no polygon draft. A draft with too few
    /// vertices is discarded and reported as an error.
    pub fn close_polygon(&mut self, label: Option<String>) -> Result<Option<RegionId>, EditorError> {
        if !matches!(self.store.draft(), Some(Draft::Polygon { .. })) {
            return Ok(None);
        }
        let Some(Draft::Polygon { vertices, .. }) = self.store.take_draft() else {
            return Ok(None);
        };

        if vertices.len() < MIN_POLYGON_VERTICES {
            log::warn!("Discarded polygon with {} points", vertices.len());
            return Err(EditorError::TooFewVertices {
                count: vertices.len(),
                min: MIN_POLYGON_VERTICES,
            });
        }

        let id = self.store.commit(vertices, label, RegionKind::Polygon);
        log::info!("✅ Committed region {}", id);
        Ok(Some(id))
    }

    /// Name the pending rectangle and commit it.
    pub fn confirm_label(&mut self, name: &str) -> Result<RegionId, EditorError> {
        let Some(Draft::PendingLabel { bounds }) = self.store.draft().cloned() else {
            return Err(EditorError::NotAwaitingLabel);
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(EditorError::EmptyLabel);
        }

        self.store.take_draft();
        let id = self.store.commit(
            bounds.corners().to_vec(),
            Some(name.to_string()),
            RegionKind::Rectangle,
        );
        log::info!("✅ Committed rectangle '{}' ({})", name, id);
        Ok(id)
    }

    /// Dismiss the name prompt; the pending rectangle is dropped.
    pub fn cancel_label(&mut self) -> bool {
        if self.state() != EditorState::AwaitingLabel {
            return false;
        }
        self.store.take_draft();
        true
    }

    /// Abort the current draft, whatever it is.
    pub fn cancel_drawing(&mut self) -> bool {
        self.store.take_draft().is_some()
    }

    /// Drop the most recent polygon vertex.
    pub fn undo_last_vertex(&mut self) -> bool {
        match self.store.draft_mut() {
            Some(Draft::Polygon { vertices, .. }) => vertices.pop().is_some(),
            _ => false,
        }
    }

    /// Remove a committed region. Always redraws, even for unknown ids.
    pub fn remove_region(&mut self, id: RegionId) -> Option<Region> {
        let removed = self.store.remove(id);
        self.store.mark_dirty();
        removed
    }

    /// Ask to clear everything. Nothing happens until [`Self::confirm_clear`].
    /// Returns whether a confirmation is now pending.
    pub fn request_clear(&mut self) -> bool {
        self.clear_pending = !self.store.is_empty() || self.store.draft().is_some();
        self.clear_pending
    }

    /// Carry out a pending clear. Returns the number of regions removed.
    pub fn confirm_clear(&mut self) -> usize {
        if !std::mem::take(&mut self.clear_pending) {
            return 0;
        }
        let removed = self.store.clear_all();
        log::info!("🗑️ Cleared {} regions", removed);
        removed
    }

    pub fn dismiss_clear(&mut self) {
        self.clear_pending = false;
    }

    /// Re-draw saved regions through the normal gestures, on an unscaled
    /// layout of the current surface. Returns the number committed.
    pub fn replay(&mut self, regions: &[RegionPayload]) -> Result<usize, EditorError> {
        let surface = self.surface.ok_or(EditorError::NoSurface)?;
        let rect = DisplayRect::identity(surface);
        let at = |p: Point| PointerInput::new(p.x, p.y, rect);

        let mut committed = 0;
        for payload in regions {
            let vertices = payload.vertices();
            match payload.kind {
                RegionKind::Polygon => {
                    self.set_tool(DrawTool::Polygon);
                    self.start_drawing()?;
                    for &vertex in &vertices {
                        self.primary_press(&at(vertex))?;
                    }
                    self.close_polygon(Some(payload.label.clone()))?;
                }
                RegionKind::Rectangle => {
                    let bounds = BoundingBox::enclosing(&vertices).ok_or(
                        EditorError::TooFewVertices {
                            count: 0,
                            min: MIN_POLYGON_VERTICES,
                        },
                    )?;
                    let [top_left, _, bottom_right, _] = bounds.corners();
                    self.set_tool(DrawTool::Rectangle);
                    self.start_drawing()?;
                    self.primary_press(&at(top_left))?;
                    if let Err(e) = self.primary_release(&at(bottom_right)) {
                        self.cancel_drawing();
                        return Err(e);
                    }
                    if let Err(e) = self.confirm_label(&payload.label) {
                        self.cancel_label();
                        return Err(e);
                    }
                }
            }
            committed += 1;
        }
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> DisplayRect {
        DisplayRect::new(0.0, 0.0, 640.0, 360.0)
    }

    fn at(x: f32, y: f32) -> PointerInput {
        PointerInput::new(x, y, rect())
    }

    fn editor() -> RegionEditor {
        let mut editor = RegionEditor::default();
        editor.load_surface(IntrinsicSize::new(640, 360));
        editor
    }

    #[test]
    fn test_drawing_requires_surface() {
        let mut editor = RegionEditor::default();
        assert_eq!(editor.start_drawing(), Err(EditorError::NoSurface));
        assert_eq!(editor.state(), EditorState::Idle);
    }

    #[test]
    fn test_clicks_ignored_while_idle() {
        let mut editor = editor();
        editor.primary_press(&at(10.0, 10.0)).unwrap();
        assert_eq!(editor.state(), EditorState::Idle);
        assert!(editor.store().draft().is_none());
    }

    #[test]
    fn test_close_with_two_points_is_rejected() {
        let mut editor = editor();
        editor.start_drawing().unwrap();
        editor.primary_press(&at(10.0, 10.0)).unwrap();
        editor.primary_press(&at(50.0, 10.0)).unwrap();

        let err = editor.close_polygon(None).unwrap_err();
        assert_eq!(err, EditorError::TooFewVertices { count: 2, min: 3 });
        assert!(editor.store().is_empty());
        assert_eq!(editor.state(), EditorState::Idle);
    }

    #[test]
    fn test_three_points_commit_in_order() {
        let mut editor = editor();
        editor.start_drawing().unwrap();
        for (x, y) in [(10.0, 10.0), (100.0, 10.0), (55.0, 90.0)] {
            editor.primary_press(&at(x, y)).unwrap();
        }

        let id = editor.close_polygon(None).unwrap().unwrap();
        let region = editor.store().get(id).unwrap();
        assert_eq!(
            region.vertices,
            vec![
                Point::new(10.0, 10.0),
                Point::new(100.0, 10.0),
                Point::new(55.0, 90.0)
            ]
        );
        assert_eq!(region.label, "Region 1");
        assert_eq!(editor.state(), EditorState::Idle);
    }

    #[test]
    fn test_close_without_draft_is_noop() {
        let mut editor = editor();
        assert_eq!(editor.close_polygon(None), Ok(None));
    }

    #[test]
    fn test_unusable_layout_does_not_add_vertex() {
        let mut editor = editor();
        editor.start_drawing().unwrap();
        let collapsed = PointerInput::new(5.0, 5.0, DisplayRect::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(
            editor.primary_press(&collapsed),
            Err(EditorError::LayoutUnavailable)
        );
        assert_eq!(
            editor.store().draft(),
            Some(&Draft::empty_polygon())
        );
    }

    #[test]
    fn test_rubber_band_follows_pointer() {
        let mut editor = editor();
        editor.start_drawing().unwrap();
        assert!(!editor.pointer_move(&at(20.0, 20.0)));
        editor.primary_press(&at(10.0, 10.0)).unwrap();
        assert!(editor.pointer_move(&at(30.0, 40.0)));
        match editor.store().draft() {
            Some(Draft::Polygon { cursor, .. }) => {
                assert_eq!(*cursor, Some(Point::new(30.0, 40.0)))
            }
            other => panic!("unexpected draft {:?}", other),
        }
    }

    #[test]
    fn test_undo_last_vertex() {
        let mut editor = editor();
        editor.start_drawing().unwrap();
        editor.primary_press(&at(10.0, 10.0)).unwrap();
        assert!(editor.undo_last_vertex());
        assert!(!editor.undo_last_vertex());
    }

    fn drag(editor: &mut RegionEditor, from: (f32, f32), to: (f32, f32)) -> Result<(), EditorError> {
        editor.primary_press(&at(from.0, from.1))?;
        editor.pointer_move(&at(to.0, to.1));
        editor.primary_release(&at(to.0, to.1))
    }

    #[test]
    fn test_small_rectangle_is_discarded() {
        let mut editor = editor();
        editor.set_tool(DrawTool::Rectangle);
        editor.start_drawing().unwrap();

        let err = drag(&mut editor, (100.0, 100.0), (115.0, 130.0)).unwrap_err();
        assert!(matches!(err, EditorError::RectangleTooSmall { .. }));
        assert!(editor.store().is_empty());
        // Tool stays armed for another attempt
        assert_eq!(editor.state(), EditorState::Drawing);
    }

    #[test]
    fn test_rectangle_awaits_label_then_commits() {
        let mut editor = editor();
        editor.set_tool(DrawTool::Rectangle);
        editor.start_drawing().unwrap();

        drag(&mut editor, (125.0, 125.0), (100.0, 100.0)).unwrap();
        assert_eq!(editor.state(), EditorState::AwaitingLabel);
        assert_eq!(editor.confirm_label("  "), Err(EditorError::EmptyLabel));
        assert_eq!(editor.state(), EditorState::AwaitingLabel);

        let id = editor.confirm_label("Lane 1").unwrap();
        let region = editor.store().get(id).unwrap();
        assert_eq!(region.kind, RegionKind::Rectangle);
        assert_eq!(region.label, "Lane 1");
        assert_eq!(region.vertices[0], Point::new(100.0, 100.0));
        assert_eq!(region.vertices[2], Point::new(125.0, 125.0));
        assert_eq!(editor.state(), EditorState::Idle);
    }

    #[test]
    fn test_cancel_label_discards_rectangle() {
        let mut editor = editor();
        editor.set_tool(DrawTool::Rectangle);
        editor.start_drawing().unwrap();
        drag(&mut editor, (0.0, 0.0), (50.0, 50.0)).unwrap();

        assert_eq!(editor.start_drawing(), Err(EditorError::LabelPending));
        assert!(editor.cancel_label());
        assert!(editor.store().is_empty());
        assert_eq!(editor.state(), EditorState::Idle);
        assert_eq!(editor.confirm_label("x"), Err(EditorError::NotAwaitingLabel));
    }

    #[test]
    fn test_remove_region_always_redraws() {
        let mut editor = editor();
        editor.take_redraw();
        assert!(editor.remove_region(99).is_none());
        assert!(editor.take_redraw());
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let mut editor = editor();
        editor.start_drawing().unwrap();
        for (x, y) in [(10.0, 10.0), (100.0, 10.0), (55.0, 90.0)] {
            editor.primary_press(&at(x, y)).unwrap();
        }
        editor.close_polygon(None).unwrap();

        assert_eq!(editor.confirm_clear(), 0);
        assert!(editor.request_clear());
        editor.dismiss_clear();
        assert_eq!(editor.confirm_clear(), 0);
        assert_eq!(editor.store().len(), 1);

        assert!(editor.request_clear());
        assert_eq!(editor.confirm_clear(), 1);
        assert!(editor.store().is_empty());
    }

    #[test]
    fn test_switching_tool_drops_draft() {
        let mut editor = editor();
        editor.start_drawing().unwrap();
        editor.primary_press(&at(10.0, 10.0)).unwrap();
        editor.set_tool(DrawTool::Rectangle);
        assert_eq!(editor.state(), EditorState::Idle);
    }

    fn payload(label: &str, kind: RegionKind, points: Vec<[f32; 2]>) -> RegionPayload {
        RegionPayload {
            id: 0,
            label: label.to_string(),
            color: crate::store::default_palette()[0],
            kind,
            points,
        }
    }

    #[test]
    fn test_replay_saved_regions() {
        let mut editor = editor();
        let saved = vec![
            payload(
                "Lane",
                RegionKind::Polygon,
                vec![[10.0, 10.0], [200.0, 10.0], [100.0, 150.0]],
            ),
            payload(
                "Gate",
                RegionKind::Rectangle,
                vec![[300.0, 50.0], [400.0, 50.0], [400.0, 120.0], [300.0, 120.0]],
            ),
        ];

        assert_eq!(editor.replay(&saved).unwrap(), 2);
        let regions = editor.store().committed();
        assert_eq!(regions[0].label, "Lane");
        assert_eq!(regions[0].vertices[2], Point::new(100.0, 150.0));
        assert_eq!(regions[1].kind, RegionKind::Rectangle);
        assert_eq!(regions[1].vertices[0], Point::new(300.0, 50.0));
        assert_eq!(editor.state(), EditorState::Idle);
    }

    #[test]
    fn test_replay_rejects_small_rectangle() {
        let mut editor = editor();
        let saved = vec![payload(
            "Tiny",
            RegionKind::Rectangle,
            vec![[0.0, 0.0], [15.0, 0.0], [15.0, 30.0], [0.0, 30.0]],
        )];
        assert!(matches!(
            editor.replay(&saved),
            Err(EditorError::RectangleTooSmall { .. })
        ));
        assert!(editor.store().is_empty());
        assert_eq!(editor.state(), EditorState::Idle);
    }
}
